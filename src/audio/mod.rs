pub mod device;
#[cfg(target_os = "macos")]
pub mod listener;
pub mod monitor;
pub mod snapshot;

pub use device::{AudioDevice, AudioDeviceId};
pub use monitor::AudioDeviceMonitor;
pub use snapshot::InputSnapshot;
