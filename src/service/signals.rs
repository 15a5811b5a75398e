use anyhow::Result;
use signal_hook::consts::signal::*;
use signal_hook_tokio::Signals;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{info, warn};

/// Signal types that can be received
#[derive(Debug, Clone, Copy)]
pub enum SignalType {
    /// Graceful service shutdown (SIGTERM/SIGINT)
    Shutdown,
    /// Preference reload (SIGHUP)
    Reload,
}

/// Translates process signals into service messages
pub struct SignalHandler {
    signal_tx: mpsc::UnboundedSender<SignalType>,
}

impl SignalHandler {
    pub fn new(signal_tx: mpsc::UnboundedSender<SignalType>) -> Self {
        Self { signal_tx }
    }

    /// Listen until a shutdown signal arrives
    pub async fn listen(self) -> Result<()> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP])?;

        info!("Signal handler initialized, listening for SIGTERM, SIGINT, SIGHUP");

        while let Some(signal) = signals.next().await {
            match signal {
                SIGTERM | SIGINT => {
                    info!(
                        "Received shutdown signal ({}), initiating graceful shutdown",
                        signal
                    );
                    let _ = self.signal_tx.send(SignalType::Shutdown);
                    break;
                }
                SIGHUP => {
                    info!("Received SIGHUP signal, requesting preference reload");
                    if self.signal_tx.send(SignalType::Reload).is_err() {
                        warn!("Service stopped listening, reload request dropped");
                        break;
                    }
                }
                _ => {
                    warn!("Received unexpected signal: {}", signal);
                }
            }
        }

        Ok(())
    }
}
