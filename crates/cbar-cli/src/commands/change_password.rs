//! Change-password command - replace the barring password

use anyhow::{bail, Result};
use tracing::debug;

use super::{submit_final, submit_step, Driver, Reply};
use crate::output::{OperationRow, OutputContext};

/// Walk the old / new / confirm dialog
pub async fn change_password(
    mut driver: Driver,
    old: &str,
    new: &str,
    confirm: Option<&str>,
    ctx: &OutputContext,
) -> Result<()> {
    driver.activate(false).await?;

    driver.handle().request_change_password()?;
    let Reply::Prompt(dialog) = driver.reply().await? else {
        bail!("Password dialog did not open");
    };
    debug!(stage = ?dialog.stage, "Dialog opened");

    let dialog = submit_step(&mut driver, old).await?;
    debug!(stage = ?dialog.stage, "Old password accepted");
    let dialog = submit_step(&mut driver, new).await?;
    debug!(stage = ?dialog.stage, "New password accepted");

    let Reply::Done {
        success, message, ..
    } = submit_final(&mut driver, confirm.unwrap_or(new)).await?
    else {
        bail!("Unexpected password prompt");
    };

    let row = OperationRow {
        operation: "change_password".to_string(),
        success,
        message: match message {
            Some(error) => format!("Failed to change password: {}", error),
            None => "Password changed".to_string(),
        },
        state: None,
    };
    ctx.print_result(&row);
    driver.finish().await
}
