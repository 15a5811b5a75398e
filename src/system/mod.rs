pub mod traits;

#[cfg(target_os = "macos")]
pub mod coreaudio;

// Mock implementations for testing
#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

pub use traits::*;

#[cfg(target_os = "macos")]
pub use coreaudio::CoreAudioSystem;

#[cfg(any(test, feature = "test-mocks"))]
pub use mocks::*;

use anyhow::Result;
use std::sync::Arc;

/// Construct the platform audio provider.
#[cfg(target_os = "macos")]
pub fn default_audio_system() -> Result<Arc<dyn AudioSystemInterface>> {
    Ok(Arc::new(CoreAudioSystem::new()?))
}

#[cfg(not(target_os = "macos"))]
pub fn default_audio_system() -> Result<Arc<dyn AudioSystemInterface>> {
    anyhow::bail!("sticky-mic drives CoreAudio and only runs on macOS")
}

