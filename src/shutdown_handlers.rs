use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::warn;

use crate::shutdown::{StopSignal, StopToken};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Raise `abort` on Ctrl+C (and SIGTERM on unix). The task exits on its own
/// once `done` is stopped.
pub fn setup_signal_shutdown_handler(
    abort: Arc<StopSignal>,
    mut done: StopToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = done.stopped() => {}
            name = termination_request() => {
                warn!("{} received; stopping virtual users.", name);
                abort.stop();
            }
        }
    })
}

/// Resolves with the signal name once the process is asked to stop.
#[cfg(unix)]
async fn termination_request() -> &'static str {
    let mut term_signal = match signal(SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(err) => {
            warn!("Failed to register SIGTERM handler: {}", err);
            None
        }
    };
    let sigterm = async {
        match term_signal.as_mut() {
            Some(stream) => {
                stream.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "Interrupt",
        () = sigterm => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn termination_request() -> &'static str {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
    "Interrupt"
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn run_async_test<F>(future: F) -> Result<(), String>
    where
        F: std::future::Future<Output = Result<(), String>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| format!("Failed to build runtime: {}", err))?;
        runtime.block_on(future)
    }

    #[test]
    fn handler_exits_without_aborting_a_finished_run() -> Result<(), String> {
        run_async_test(async {
            let abort = Arc::new(StopSignal::new());
            let done = StopSignal::new();
            let handle = setup_signal_shutdown_handler(Arc::clone(&abort), done.token());

            tokio::time::sleep(Duration::from_millis(10)).await;
            done.stop();

            tokio::time::timeout(Duration::from_secs(1), handle)
                .await
                .map_err(|err| format!("Timed out waiting for handler: {}", err))?
                .map_err(|err| format!("Handler join error: {}", err))?;
            if abort.is_stopped() {
                return Err("Handler must not abort a finished run".to_owned());
            }
            Ok(())
        })
    }
}
