use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Config;
use crate::prefs::PreferenceStore;
use crate::reconcile::{RecencyExpiry, RecencyTracker, ReconcileEngine};
use crate::system::{AudioSystemInterface, DeviceEvent, Presenter};

/// Control messages from the service shell to the engine task.
#[derive(Debug, Clone, Copy)]
enum ControlMessage {
    ReloadPreferences,
}

/// Owns the provider subscription and the single task on which all
/// reconciliation state is mutated.
///
/// Provider callbacks, expiry timers and service signals all funnel into that
/// task as messages; the engine itself is never shared.
pub struct AudioDeviceMonitor<A, P, R>
where
    A: AudioSystemInterface + ?Sized + 'static,
    P: PreferenceStore + 'static,
    R: Presenter + 'static,
{
    audio: Arc<A>,
    idle: Option<IdleParts<A, P, R>>,
    control_tx: UnboundedSender<ControlMessage>,
    task: Option<JoinHandle<()>>,
}

/// Everything the engine task consumes when the monitor starts.
struct IdleParts<A, P, R>
where
    A: AudioSystemInterface + ?Sized,
    P: PreferenceStore,
    R: Presenter,
{
    engine: ReconcileEngine<A, P, R>,
    expiry_rx: UnboundedReceiver<RecencyExpiry>,
    control_rx: UnboundedReceiver<ControlMessage>,
}

impl<A, P, R> AudioDeviceMonitor<A, P, R>
where
    A: AudioSystemInterface + ?Sized + 'static,
    P: PreferenceStore + 'static,
    R: Presenter + 'static,
{
    pub fn new(audio: Arc<A>, prefs: P, presenter: R, config: &Config) -> Self {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let tracker = RecencyTracker::new(config.recency_window(), expiry_tx);
        let engine = ReconcileEngine::new(audio.clone(), prefs, presenter, tracker, config);

        Self {
            audio,
            idle: Some(IdleParts {
                engine,
                expiry_rx,
                control_rx,
            }),
            control_tx,
            task: None,
        }
    }

    /// Snapshot the current devices, register the provider subscription and
    /// spawn the engine task. A second call is a no-op.
    ///
    /// A failing subscription is the one startup error worth aborting on:
    /// without notifications the daemon would silently do nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            debug!("monitor already started");
            return Ok(());
        }

        let Some(mut parts) = self.idle.take() else {
            anyhow::bail!("monitor cannot be restarted after stop");
        };

        // Seed the known-device set before listeners can fire, so devices
        // present at startup are never classified as new
        parts.engine.initialize()?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        if let Err(e) = self.audio.subscribe(event_tx) {
            self.idle = Some(parts);
            return Err(e);
        }

        self.task = Some(tokio::spawn(run_engine(
            parts.engine,
            event_rx,
            parts.expiry_rx,
            parts.control_rx,
        )));

        info!("audio device monitor started");
        Ok(())
    }

    /// Ask the engine task to re-read preferences from disk.
    pub fn reload_preferences(&self) {
        let _ = self.control_tx.send(ControlMessage::ReloadPreferences);
    }

    /// Drop the provider subscription and stop the engine task. Idempotent,
    /// and safe to call if `start` never ran.
    pub fn stop(&mut self) -> Result<()> {
        self.audio.unsubscribe()?;

        if let Some(task) = self.task.take() {
            task.abort();
            info!("audio device monitor stopped");
        }

        Ok(())
    }
}

impl<A, P, R> Drop for AudioDeviceMonitor<A, P, R>
where
    A: AudioSystemInterface + ?Sized + 'static,
    P: PreferenceStore + 'static,
    R: Presenter + 'static,
{
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// The serialized execution context: every mutation of the known/recent sets
/// and the pending expiry happens here, in message order.
async fn run_engine<A, P, R>(
    mut engine: ReconcileEngine<A, P, R>,
    mut events: UnboundedReceiver<DeviceEvent>,
    mut expiries: UnboundedReceiver<RecencyExpiry>,
    mut control: UnboundedReceiver<ControlMessage>,
) where
    A: AudioSystemInterface + ?Sized,
    P: PreferenceStore,
    R: Presenter,
{
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(DeviceEvent::DefaultInputChanged(id)) => {
                    engine.handle_default_input_changed(id);
                }
                Some(DeviceEvent::DeviceListChanged) => {
                    engine.handle_device_list_changed();
                }
                None => {
                    debug!("device event channel closed, engine task exiting");
                    break;
                }
            },
            Some(expiry) = expiries.recv() => {
                engine.handle_recency_expiry(expiry);
            }
            Some(message) = control.recv() => match message {
                ControlMessage::ReloadPreferences => engine.reload_preferences(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioDevice, AudioDeviceId};
    use crate::system::{CountingPresenter, MemoryPreferenceStore, MockAudioSystem};

    fn monitor_with(
        audio: &MockAudioSystem,
        prefs: &MemoryPreferenceStore,
        presenter: &CountingPresenter,
    ) -> AudioDeviceMonitor<MockAudioSystem, MemoryPreferenceStore, CountingPresenter> {
        AudioDeviceMonitor::new(
            Arc::new(audio.clone()),
            prefs.clone(),
            presenter.clone(),
            &Config::default(),
        )
    }

    #[tokio::test]
    async fn start_is_a_no_op_after_the_first_call() {
        let audio = MockAudioSystem::new();
        let prefs = MemoryPreferenceStore::new();
        let presenter = CountingPresenter::new();
        let mut monitor = monitor_with(&audio, &prefs, &presenter);

        monitor.start().unwrap();
        monitor.start().unwrap();

        assert_eq!(audio.subscribe_count(), 1);
        monitor.stop().unwrap();
    }

    #[tokio::test]
    async fn stop_is_safe_without_start() {
        let audio = MockAudioSystem::new();
        let prefs = MemoryPreferenceStore::new();
        let presenter = CountingPresenter::new();
        let mut monitor = monitor_with(&audio, &prefs, &presenter);

        monitor.stop().unwrap();
        monitor.stop().unwrap();
    }

    #[tokio::test]
    async fn subscription_failure_aborts_startup() {
        let audio = MockAudioSystem::new();
        audio.set_subscribe_failure(true);
        let prefs = MemoryPreferenceStore::new();
        let presenter = CountingPresenter::new();
        let mut monitor = monitor_with(&audio, &prefs, &presenter);

        assert!(monitor.start().is_err());
    }

    #[tokio::test]
    async fn events_flow_through_the_engine_task() {
        let audio = MockAudioSystem::new();
        audio.set_devices(vec![AudioDevice::new(
            AudioDeviceId(1),
            "uid-builtin",
            "MacBook Pro Microphone",
        )]);
        let mut prefs = MemoryPreferenceStore::new();
        prefs.set_preferred_device_uid(Some("uid-builtin")).unwrap();
        let presenter = CountingPresenter::new();
        let mut monitor = monitor_with(&audio, &prefs, &presenter);

        monitor.start().unwrap();

        // headset connects and the OS auto-selects it
        audio.set_devices(vec![
            AudioDevice::new(AudioDeviceId(1), "uid-builtin", "MacBook Pro Microphone"),
            AudioDevice::new(AudioDeviceId(9), "uid-headset", "Bluetooth Headset"),
        ]);
        audio.emit_device_list_changed();
        audio.emit_default_input_changed(AudioDeviceId(9));

        // let the engine task drain its mailbox
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(audio.set_default_calls(), vec![AudioDeviceId(1)]);
        assert!(presenter.refresh_count() >= 2);
        monitor.stop().unwrap();
    }
}
