//! Tickbridge - Toggl Track status bar daemon
//!
//! Connects with the configured token, keeps the timer view current and logs
//! the status line until interrupted.

use anyhow::Context;
use tickbridge_lib::{get_status, run_until, AppContext};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so we can see .env loading
    tickbridge_infra::init_tracing();

    let ctx = AppContext::new().context("failed to initialise application context")?;
    match ctx.settings_path() {
        Some(path) => info!(path = %path.display(), "Tickbridge starting"),
        None => info!("Tickbridge starting with default settings"),
    }

    if let Err(err) = ctx.start().await {
        warn!(error = %err, "Initial connection failed");
    }

    let outcome = run_until(&ctx, tokio::signal::ctrl_c()).await;

    let status = get_status(&ctx);
    info!(status = %status.api_status, "Shutting down");
    ctx.shutdown();
    outcome.context("failed to listen for ctrl-c")
}
