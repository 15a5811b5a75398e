use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

use crate::audio::{AudioDevice, AudioDeviceId};
use crate::prefs::PreferenceStore;
use crate::system::traits::{AudioSystemInterface, DeviceEvent, Presenter};

/// Mock audio system for testing - provides controllable device behavior.
///
/// Setters mutate the snapshot only; tests emit the matching provider events
/// explicitly, so event ordering stays under test control.
#[derive(Clone)]
pub struct MockAudioSystem {
    devices: Arc<Mutex<Vec<AudioDevice>>>,
    default_input: Arc<Mutex<Option<AudioDeviceId>>>,
    event_tx: Arc<Mutex<Option<UnboundedSender<DeviceEvent>>>>,
    set_default_calls: Arc<Mutex<Vec<AudioDeviceId>>>,
    should_fail_set_default: Arc<Mutex<bool>>,
    should_fail_enumeration: Arc<Mutex<bool>>,
    should_fail_subscribe: Arc<Mutex<bool>>,
    subscribe_count: Arc<AtomicUsize>,
    unsubscribe_count: Arc<AtomicUsize>,
}

impl MockAudioSystem {
    pub fn new() -> Self {
        Self {
            devices: Arc::new(Mutex::new(Vec::new())),
            default_input: Arc::new(Mutex::new(None)),
            event_tx: Arc::new(Mutex::new(None)),
            set_default_calls: Arc::new(Mutex::new(Vec::new())),
            should_fail_set_default: Arc::new(Mutex::new(false)),
            should_fail_enumeration: Arc::new(Mutex::new(false)),
            should_fail_subscribe: Arc::new(Mutex::new(false)),
            subscribe_count: Arc::new(AtomicUsize::new(0)),
            unsubscribe_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the attached-device snapshot
    pub fn set_devices(&self, devices: Vec<AudioDevice>) {
        *self.devices.lock().unwrap() = devices;
    }

    /// Simulate the OS changing the default input (without notifying)
    pub fn set_default_input(&self, id: Option<AudioDeviceId>) {
        *self.default_input.lock().unwrap() = id;
    }

    /// Emit a default-input-changed event to the subscriber
    pub fn emit_default_input_changed(&self, id: AudioDeviceId) {
        if let Some(tx) = self.event_tx.lock().unwrap().as_ref() {
            let _ = tx.send(DeviceEvent::DefaultInputChanged(id));
        }
    }

    /// Emit a device-list-changed event to the subscriber
    pub fn emit_device_list_changed(&self) {
        if let Some(tx) = self.event_tx.lock().unwrap().as_ref() {
            let _ = tx.send(DeviceEvent::DeviceListChanged);
        }
    }

    /// All ids passed to `set_default_input_device`, including failed calls
    pub fn set_default_calls(&self) -> Vec<AudioDeviceId> {
        self.set_default_calls.lock().unwrap().clone()
    }

    pub fn set_enumeration_failure(&self, should_fail: bool) {
        *self.should_fail_enumeration.lock().unwrap() = should_fail;
    }

    pub fn set_default_failure(&self, should_fail: bool) {
        *self.should_fail_set_default.lock().unwrap() = should_fail;
    }

    pub fn set_subscribe_failure(&self, should_fail: bool) {
        *self.should_fail_subscribe.lock().unwrap() = should_fail;
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribe_count.load(Ordering::Relaxed)
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribe_count.load(Ordering::Relaxed)
    }
}

impl AudioSystemInterface for MockAudioSystem {
    fn list_input_devices(&self) -> Result<Vec<AudioDevice>> {
        if *self.should_fail_enumeration.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock enumeration failure"));
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    fn default_input_device_id(&self) -> Result<Option<AudioDeviceId>> {
        Ok(*self.default_input.lock().unwrap())
    }

    fn set_default_input_device(&self, id: AudioDeviceId) -> Result<()> {
        self.set_default_calls.lock().unwrap().push(id);

        if *self.should_fail_set_default.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock set device failure"));
        }

        *self.default_input.lock().unwrap() = Some(id);
        Ok(())
    }

    fn subscribe(&self, events: UnboundedSender<DeviceEvent>) -> Result<()> {
        if *self.should_fail_subscribe.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock subscribe failure"));
        }

        self.subscribe_count.fetch_add(1, Ordering::Relaxed);
        let mut tx = self.event_tx.lock().unwrap();
        if tx.is_none() {
            *tx = Some(events);
        }
        Ok(())
    }

    fn unsubscribe(&self) -> Result<()> {
        self.unsubscribe_count.fetch_add(1, Ordering::Relaxed);
        *self.event_tx.lock().unwrap() = None;
        Ok(())
    }
}

impl Default for MockAudioSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory preference store for tests. Clones share state.
#[derive(Clone)]
pub struct MemoryPreferenceStore {
    preferred: Arc<Mutex<Option<String>>>,
    hide_icon: Arc<Mutex<bool>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self {
            preferred: Arc::new(Mutex::new(None)),
            hide_icon: Arc::new(Mutex::new(false)),
        }
    }
}

impl Default for MemoryPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn preferred_device_uid(&self) -> Option<String> {
        self.preferred.lock().unwrap().clone()
    }

    fn set_preferred_device_uid(&mut self, uid: Option<&str>) -> Result<()> {
        *self.preferred.lock().unwrap() = uid.map(str::to_string);
        Ok(())
    }

    fn hide_status_icon(&self) -> bool {
        *self.hide_icon.lock().unwrap()
    }

    fn set_hide_status_icon(&mut self, hide: bool) -> Result<()> {
        *self.hide_icon.lock().unwrap() = hide;
        Ok(())
    }
}

/// Presenter that counts refresh signals. Clones share the counter.
#[derive(Clone)]
pub struct CountingPresenter {
    refreshes: Arc<AtomicUsize>,
}

impl CountingPresenter {
    pub fn new() -> Self {
        Self {
            refreshes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::Relaxed)
    }
}

impl Default for CountingPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for CountingPresenter {
    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }
}
