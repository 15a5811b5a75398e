use std::collections::HashSet;

use anyhow::Result;

use crate::system::AudioSystemInterface;

use super::device::{AudioDevice, AudioDeviceId};

/// One consistent read of the provider's input-device state.
///
/// Device ids are not stable keys, so every reconciliation decision starts
/// from a fresh snapshot and resolves ids to UIDs against it.
#[derive(Debug, Clone)]
pub struct InputSnapshot {
    pub devices: Vec<AudioDevice>,
    pub default_id: Option<AudioDeviceId>,
}

impl InputSnapshot {
    pub fn capture<A: AudioSystemInterface + ?Sized>(audio: &A) -> Result<Self> {
        let devices = audio.list_input_devices()?;
        let default_id = audio.default_input_device_id()?;
        Ok(Self {
            devices,
            default_id,
        })
    }

    /// Resolve a provider device id to its stable UID.
    pub fn uid_for(&self, id: AudioDeviceId) -> Option<&str> {
        self.devices
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.uid.as_str())
    }

    pub fn device_with_uid(&self, uid: &str) -> Option<&AudioDevice> {
        self.devices.iter().find(|d| d.uid == uid)
    }

    pub fn uid_set(&self) -> HashSet<String> {
        self.devices.iter().map(|d| d.uid.clone()).collect()
    }
}
