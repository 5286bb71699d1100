//! Set command - activate or deactivate one barring category

use anyhow::{bail, Result};
use cbar_core::{BarringCategory, Direction, PendingSelection};

use super::{submit_final, Driver, Reply};
use crate::output::{OperationRow, OutputContext};

/// Target of a set command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetTarget {
    Enable(BarringCategory),
    /// Deactivate whatever is active in the direction
    Off,
}

impl std::str::FromStr for SetTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("off") {
            return Ok(SetTarget::Off);
        }
        s.parse().map(SetTarget::Enable)
    }
}

/// Select a category for a direction and confirm it with the password
pub async fn set(
    mut driver: Driver,
    direction: Direction,
    target: SetTarget,
    password: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let state = driver.activate(false).await?;

    let (category, enable) = match target {
        SetTarget::Enable(category) => (category, true),
        SetTarget::Off => match state.get(direction) {
            Some(active) => (active, false),
            None => {
                ctx.info(&format!("No {} barring active", direction));
                return driver.finish().await;
            }
        },
    };

    let selection =
        PendingSelection::new(direction, category, enable).map_err(anyhow::Error::msg)?;
    if selection.is_noop(&state) {
        ctx.info(&format!(
            "{} is already {}",
            category,
            if enable { "active" } else { "inactive" }
        ));
        return driver.finish().await;
    }

    driver.handle().select_category(direction, category, enable)?;
    match driver.reply().await? {
        Reply::Prompt(_) => {}
        Reply::Done { message, .. } => bail!(
            "Selection rejected: {}",
            message.map(|e| e.to_string()).unwrap_or_default()
        ),
    }

    let Reply::Done {
        success,
        message,
        state,
    } = submit_final(&mut driver, password).await?
    else {
        bail!("Unexpected password prompt");
    };

    let row = OperationRow {
        operation: "set".to_string(),
        success,
        message: match message {
            Some(error) => format!("Failed to update {}: {}", category, error),
            None if enable => format!("{} activated", category),
            None => format!("{} deactivated", category),
        },
        state,
    };
    ctx.print_result(&row);
    if let Some(state) = row.state.as_ref().filter(|_| row.success) {
        ctx.print_state(state);
    }
    driver.finish().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_target() {
        assert_eq!("off".parse::<SetTarget>(), Ok(SetTarget::Off));
        assert_eq!(
            "baic".parse::<SetTarget>(),
            Ok(SetTarget::Enable(BarringCategory::IncomingAll))
        );
        assert!("bogus".parse::<SetTarget>().is_err());
    }
}
