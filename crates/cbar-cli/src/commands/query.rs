//! Query command - show barring status of every category

use anyhow::Result;

use super::Driver;
use crate::output::OutputContext;

/// Show the barring state, scanning the network when the cache is stale
pub async fn query(mut driver: Driver, refresh: bool, ctx: &OutputContext) -> Result<()> {
    let state = driver.activate(refresh).await?;
    ctx.print_state(&state);
    driver.finish().await
}
