use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::audio::{AudioDevice, AudioDeviceId};

/// A change signal forwarded from the audio provider's notification API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The system default input device changed to the given device.
    DefaultInputChanged(AudioDeviceId),
    /// The set of attached devices changed (connect or disconnect).
    DeviceListChanged,
}

/// Trait for audio system operations - abstracts CoreAudio for testability.
///
/// All queries are synchronous, fast, local system calls. Subscription
/// callbacks may fire on an arbitrary background thread; implementations must
/// only forward events through the given channel, never touch shared state.
pub trait AudioSystemInterface: Send + Sync {
    /// Enumerate all currently attached input devices.
    fn list_input_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Get the id of the current default input device, if any.
    fn default_input_device_id(&self) -> Result<Option<AudioDeviceId>>;

    /// Make the given device the system default input.
    fn set_default_input_device(&self, id: AudioDeviceId) -> Result<()>;

    /// Register for default-input-changed and device-list-changed signals.
    ///
    /// Calling subscribe again after a successful registration is a no-op.
    /// The sender must remain valid for the whole subscription; the
    /// implementation owns it until `unsubscribe`.
    fn subscribe(&self, events: UnboundedSender<DeviceEvent>) -> Result<()>;

    /// Drop the registration. Idempotent, and safe to call when `subscribe`
    /// was never invoked.
    fn unsubscribe(&self) -> Result<()>;
}

/// Trait for the presentation layer - the monitor signals it after every
/// reconciliation decision and every device-list change. The presentation
/// side pulls whatever data it needs (see `menu::build_menu`).
pub trait Presenter: Send {
    fn refresh(&self);
}

/// Headless presenter used by the daemon and CLI: a refresh is just a trace
/// line, the menu is rebuilt on demand by whoever renders it.
pub struct LoggingPresenter;

impl Presenter for LoggingPresenter {
    fn refresh(&self) {
        debug!("presentation refresh requested");
    }
}
