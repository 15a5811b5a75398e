//! Production `AudioSystemInterface` backed by CoreAudio HAL properties.

use anyhow::Result;
use core_foundation::base::TCFType;
use core_foundation::string::{CFString, CFStringRef};
use coreaudio_sys::*;
use std::os::raw::c_void;
use std::ptr;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::audio::listener::CoreAudioListener;
use crate::audio::{AudioDevice, AudioDeviceId};
use crate::system::traits::{AudioSystemInterface, DeviceEvent};

pub struct CoreAudioSystem {
    listener: Mutex<CoreAudioListener>,
}

impl CoreAudioSystem {
    pub fn new() -> Result<Self> {
        info!("Initialized CoreAudio device provider");
        Ok(Self {
            listener: Mutex::new(CoreAudioListener::new()),
        })
    }
}

impl AudioSystemInterface for CoreAudioSystem {
    fn list_input_devices(&self) -> Result<Vec<AudioDevice>> {
        let mut devices = Vec::new();

        for device_id in all_device_ids()? {
            if !device_supports_input(device_id)? {
                continue;
            }

            // Devices mid-teardown can fail these reads; skip rather than fail the snapshot
            let uid = match device_string_property(device_id, kAudioDevicePropertyDeviceUID) {
                Ok(uid) => uid,
                Err(e) => {
                    debug!("Skipping device {} without readable UID: {}", device_id, e);
                    continue;
                }
            };
            let name = match device_string_property(device_id, kAudioDevicePropertyDeviceNameCFString)
            {
                Ok(name) => name,
                Err(e) => {
                    debug!("Skipping device {} without readable name: {}", device_id, e);
                    continue;
                }
            };

            devices.push(AudioDevice::new(AudioDeviceId(device_id), uid, name));
        }

        debug!("Enumerated {} input devices", devices.len());
        Ok(devices)
    }

    fn default_input_device_id(&self) -> Result<Option<AudioDeviceId>> {
        let property_address = AudioObjectPropertyAddress {
            mSelector: kAudioHardwarePropertyDefaultInputDevice,
            mScope: kAudioObjectPropertyScopeGlobal,
            mElement: kAudioObjectPropertyElementMain,
        };

        let mut device_id: AudioDeviceID = kAudioObjectUnknown;
        let mut data_size = std::mem::size_of::<AudioDeviceID>() as u32;

        unsafe {
            let result = AudioObjectGetPropertyData(
                kAudioObjectSystemObject,
                &property_address,
                0,
                ptr::null(),
                &mut data_size,
                &mut device_id as *mut _ as *mut c_void,
            );

            if result != kAudioHardwareNoError as i32 {
                return Err(anyhow::anyhow!("Failed to get default input device"));
            }
        }

        if device_id == kAudioObjectUnknown {
            Ok(None)
        } else {
            Ok(Some(AudioDeviceId(device_id)))
        }
    }

    fn set_default_input_device(&self, id: AudioDeviceId) -> Result<()> {
        let property_address = AudioObjectPropertyAddress {
            mSelector: kAudioHardwarePropertyDefaultInputDevice,
            mScope: kAudioObjectPropertyScopeGlobal,
            mElement: kAudioObjectPropertyElementMain,
        };

        let device_id: AudioDeviceID = id.0;

        unsafe {
            let result = AudioObjectSetPropertyData(
                kAudioObjectSystemObject,
                &property_address,
                0,
                ptr::null(),
                std::mem::size_of::<AudioDeviceID>() as u32,
                &device_id as *const _ as *const c_void,
            );

            if result != kAudioHardwareNoError as i32 {
                error!("Failed to set default input device: {}", result);
                return Err(anyhow::anyhow!("Failed to set default input device"));
            }
        }

        info!("Set default input device to id: {}", id);
        Ok(())
    }

    fn subscribe(&self, events: UnboundedSender<DeviceEvent>) -> Result<()> {
        self.listener.lock().unwrap().register(events)
    }

    fn unsubscribe(&self) -> Result<()> {
        self.listener.lock().unwrap().unregister();
        Ok(())
    }
}

fn all_device_ids() -> Result<Vec<AudioDeviceID>> {
    let property_address = AudioObjectPropertyAddress {
        mSelector: kAudioHardwarePropertyDevices,
        mScope: kAudioObjectPropertyScopeGlobal,
        mElement: kAudioObjectPropertyElementMain,
    };

    unsafe {
        let mut property_size: u32 = 0;
        let result = AudioObjectGetPropertyDataSize(
            kAudioObjectSystemObject,
            &property_address,
            0,
            ptr::null(),
            &mut property_size,
        );

        if result != kAudioHardwareNoError as i32 {
            return Err(anyhow::anyhow!("Failed to get device list size"));
        }

        let device_count = property_size / std::mem::size_of::<AudioDeviceID>() as u32;
        let mut devices = vec![0u32; device_count as usize];

        let result = AudioObjectGetPropertyData(
            kAudioObjectSystemObject,
            &property_address,
            0,
            ptr::null(),
            &mut property_size,
            devices.as_mut_ptr() as *mut c_void,
        );

        if result != kAudioHardwareNoError as i32 {
            return Err(anyhow::anyhow!("Failed to get device list"));
        }

        Ok(devices)
    }
}

fn device_supports_input(device_id: AudioDeviceID) -> Result<bool> {
    let property_address = AudioObjectPropertyAddress {
        mSelector: kAudioDevicePropertyStreamConfiguration,
        mScope: kAudioDevicePropertyScopeInput,
        mElement: kAudioObjectPropertyElementMain,
    };

    unsafe {
        let mut property_size: u32 = 0;
        let result = AudioObjectGetPropertyDataSize(
            device_id,
            &property_address,
            0,
            ptr::null(),
            &mut property_size,
        );

        if result != kAudioHardwareNoError as i32 {
            return Ok(false);
        }

        // If property_size > 0, the device has input streams
        Ok(property_size > 0)
    }
}

fn device_string_property(device_id: AudioDeviceID, selector: AudioObjectPropertySelector) -> Result<String> {
    let property_address = AudioObjectPropertyAddress {
        mSelector: selector,
        mScope: kAudioObjectPropertyScopeGlobal,
        mElement: kAudioObjectPropertyElementMain,
    };

    unsafe {
        let mut property_size = std::mem::size_of::<CFStringRef>() as u32;
        let mut cf_string: CFStringRef = ptr::null();

        let result = AudioObjectGetPropertyData(
            device_id,
            &property_address,
            0,
            ptr::null(),
            &mut property_size,
            &mut cf_string as *mut _ as *mut c_void,
        );

        if result != kAudioHardwareNoError as i32 {
            return Err(anyhow::anyhow!("Failed to get device property"));
        }

        if cf_string.is_null() {
            return Err(anyhow::anyhow!("Device property is null"));
        }

        let cf_string = CFString::wrap_under_get_rule(cf_string);
        Ok(cf_string.to_string())
    }
}
