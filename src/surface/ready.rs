use super::SurfaceError;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Sending half: held by whatever initialises the surface
#[derive(Debug)]
pub struct ReadySignal {
    tx: watch::Sender<bool>,
}

/// Receiving half: awaited before the tracker starts issuing draw calls
#[derive(Debug, Clone)]
pub struct ReadyGate {
    rx: watch::Receiver<bool>,
}

/// Create a linked readiness signal/gate pair, initially not ready.
pub fn readiness() -> (ReadySignal, ReadyGate) {
    let (tx, rx) = watch::channel(false);
    (ReadySignal { tx }, ReadyGate { rx })
}

impl ReadySignal {
    pub fn mark_ready(&self) {
        self.tx.send_replace(true);
    }
}

impl ReadyGate {
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the surface is ready, failing after `timeout`.
    ///
    /// A signal dropped without ever marking ready counts as never ready.
    pub async fn wait(&mut self, timeout: Duration) -> Result<(), SurfaceError> {
        let rx = &mut self.rx;
        let ready = async move { rx.wait_for(|ready| *ready).await.map(|_| ()) };

        match tokio::time::timeout(timeout, ready).await {
            Ok(Ok(())) => {
                info!("Rendering surface ready");
                Ok(())
            }
            Ok(Err(_)) => {
                warn!("Readiness signal dropped before surface became ready");
                Err(SurfaceError::NotReady(timeout))
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Timed out waiting for rendering surface");
                Err(SurfaceError::NotReady(timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_before_wait() {
        let (signal, mut gate) = readiness();
        signal.mark_ready();
        assert!(gate.is_ready());
        assert!(gate.wait(Duration::from_millis(10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_ready_while_waiting() {
        let (signal, mut gate) = readiness();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            signal.mark_ready();
            signal
        });

        assert!(gate.wait(Duration::from_secs(5)).await.is_ok());
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let (_signal, mut gate) = readiness();
        let result = gate.wait(Duration::from_millis(250)).await;
        assert_eq!(result, Err(SurfaceError::NotReady(Duration::from_millis(250))));
    }

    #[tokio::test]
    async fn test_dropped_signal_is_not_ready() {
        let (signal, mut gate) = readiness();
        drop(signal);
        assert!(matches!(
            gate.wait(Duration::from_secs(5)).await,
            Err(SurfaceError::NotReady(_))
        ));
    }
}
