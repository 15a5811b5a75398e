//! Test utility builders for creating input-device snapshots.
//!
//! Individual methods may not be used by all tests, so dead code warnings are
//! suppressed.

#![allow(dead_code)]

use sticky_mic::audio::{AudioDevice, AudioDeviceId};

/// Builder for creating test AudioDevice instances
pub struct InputDeviceBuilder {
    id: u32,
    uid: String,
    name: String,
}

impl InputDeviceBuilder {
    pub fn new() -> Self {
        Self {
            id: 1,
            uid: "uid-test".to_string(),
            name: "Test Microphone".to_string(),
        }
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn uid(mut self, uid: &str) -> Self {
        self.uid = uid.to_string();
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn build(self) -> AudioDevice {
        AudioDevice::new(AudioDeviceId(self.id), self.uid, self.name)
    }
}

impl Default for InputDeviceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Common fixture devices
pub mod scenarios {
    use super::*;

    pub fn builtin_mic() -> AudioDevice {
        InputDeviceBuilder::new()
            .id(1)
            .uid("uid-builtin")
            .name("MacBook Pro Microphone")
            .build()
    }

    pub fn usb_mic() -> AudioDevice {
        InputDeviceBuilder::new()
            .id(2)
            .uid("uid-mv7")
            .name("Shure MV7")
            .build()
    }

    pub fn bluetooth_headset() -> AudioDevice {
        InputDeviceBuilder::new()
            .id(3)
            .uid("uid-airpods")
            .name("AirPods Pro")
            .build()
    }
}
