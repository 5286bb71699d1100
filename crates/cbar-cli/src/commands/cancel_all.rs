//! Cancel-all command - deactivate every barring category

use anyhow::{bail, Result};
use cbar_core::BarringError;

use super::{submit_final, Driver, Reply};
use crate::output::{OperationRow, OutputContext};

/// Deactivate all barring with the barring password
pub async fn cancel_all(mut driver: Driver, password: &str, ctx: &OutputContext) -> Result<()> {
    driver.activate(false).await?;

    driver.handle().request_cancel_all()?;
    match driver.reply().await? {
        Reply::Prompt(_) => {}
        Reply::Done {
            message: Some(BarringError::NothingToCancel),
            ..
        } => {
            ctx.warn(&BarringError::NothingToCancel.to_string());
            return driver.finish().await;
        }
        Reply::Done { message, .. } => bail!(
            "Cancel all rejected: {}",
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
        operation: "cancel_all".to_string(),
        success,
        message: match message {
            Some(error) => format!("Failed to cancel call barring: {}", error),
            None => "All call barring cancelled".to_string(),
        },
        state,
    };
    ctx.print_result(&row);
    driver.finish().await
}
