//! Call barring data model

mod category;
mod password;
mod state;

pub use category::{BarringCategory, Direction};
pub use password::{is_valid_password, Password, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};
pub use state::{AggregateBarringState, PendingSelection};
