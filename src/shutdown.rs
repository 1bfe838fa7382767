//! Cooperative stop signals for VU runners and the run as a whole.
use tokio::sync::watch;

/// Owning side of a stop signal. Dropping it also counts as a stop.
#[derive(Debug)]
pub struct StopSignal {
    tx: watch::Sender<bool>,
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn token(&self) -> StopToken {
        StopToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Observing side, polled once per iteration by a VU.
#[derive(Debug, Clone)]
pub struct StopToken {
    rx: watch::Receiver<bool>,
}

impl StopToken {
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the signal is raised or its owner is gone.
    pub async fn stopped(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
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
    fn token_observes_stop() -> Result<(), String> {
        let signal = StopSignal::new();
        let token = signal.token();
        if token.is_stopped() {
            return Err("Token must start running".to_owned());
        }
        signal.stop();
        if !token.is_stopped() || !signal.is_stopped() {
            return Err("Token must observe stop".to_owned());
        }
        Ok(())
    }

    #[test]
    fn dropped_signal_counts_as_stop() -> Result<(), String> {
        let signal = StopSignal::new();
        let token = signal.token();
        drop(signal);
        if !token.is_stopped() {
            return Err("Dropped signal must stop the token".to_owned());
        }
        Ok(())
    }

    #[test]
    fn stopped_future_wakes_on_stop() -> Result<(), String> {
        run_async_test(async {
            let signal = StopSignal::new();
            let mut token = signal.token();
            let waiter = tokio::spawn(async move { token.stopped().await });
            tokio::time::sleep(Duration::from_millis(10)).await;
            signal.stop();
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .map_err(|err| format!("Timed out waiting for stop: {}", err))?
                .map_err(|err| format!("Waiter join error: {}", err))
        })
    }
}
