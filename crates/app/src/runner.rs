//! Daemon loop: log status-line and timer changes until shutdown

use std::future::Future;

use tracing::info;

use crate::AppContext;

/// Follow the synchronizer's observers until `shutdown` resolves
///
/// `shutdown` is polled in place across iterations, so a signal listener is
/// registered once. Returns early if the synchronizer goes away.
pub async fn run_until<F>(ctx: &AppContext, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    let mut status_line = ctx.synchronizer.subscribe_status_line();
    let mut timer = ctx.synchronizer.subscribe_timer();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = status_line.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let line = status_line.borrow_and_update().clone();
                info!(target: "tickbridge::status", "{line}");
            }
            changed = timer.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let running = timer.borrow_and_update().as_ref().map(|entry| entry.id);
                info!(entry_id = ?running, "Timer changed");
            }
            signal = &mut shutdown => return signal,
        }
    }
}
