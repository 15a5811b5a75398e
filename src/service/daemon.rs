use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::signals::{SignalHandler, SignalType};
use crate::audio::AudioDeviceMonitor;
use crate::prefs::PreferenceStore;
use crate::system::{AudioSystemInterface, Presenter};

/// Manages the background service lifecycle
pub struct ServiceManager<A, P, R>
where
    A: AudioSystemInterface + ?Sized + 'static,
    P: PreferenceStore + 'static,
    R: Presenter + 'static,
{
    monitor: AudioDeviceMonitor<A, P, R>,
}

impl<A, P, R> ServiceManager<A, P, R>
where
    A: AudioSystemInterface + ?Sized + 'static,
    P: PreferenceStore + 'static,
    R: Presenter + 'static,
{
    pub fn new(monitor: AudioDeviceMonitor<A, P, R>) -> Self {
        Self { monitor }
    }

    /// Start monitoring and block until a shutdown signal arrives
    pub async fn run(mut self) -> Result<()> {
        info!("Starting sticky-mic service");

        self.monitor.start()?;

        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
        let signal_handler = SignalHandler::new(signal_tx);

        tokio::spawn(async move {
            if let Err(e) = signal_handler.listen().await {
                error!("Signal handler error: {}", e);
            }
        });

        info!("Service started successfully, waiting for signals");

        loop {
            match signal_rx.recv().await {
                Some(SignalType::Shutdown) => {
                    info!("Shutdown signal received, stopping service");
                    break;
                }
                Some(SignalType::Reload) => {
                    info!("Reload signal received, re-reading preferences");
                    self.monitor.reload_preferences();
                }
                None => {
                    warn!("Signal channel closed");
                    break;
                }
            }
        }

        self.monitor.stop()?;
        info!("Service shutdown completed");
        Ok(())
    }
}
