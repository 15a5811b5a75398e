//! CoreAudio property-listener registration.
//!
//! Converts the C-style callback API into two channel-delivered signals.
//! The registered client context is a heap allocation owned by this listener
//! for the whole subscription, so no `self` pointer ever crosses the FFI
//! boundary. Callbacks fire on CoreAudio's notification thread and only push
//! onto the channel; the receiving task does all the work.

use anyhow::Result;
use coreaudio_sys::*;
use std::os::raw::c_void;
use std::ptr;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

use crate::system::DeviceEvent;

use super::device::AudioDeviceId;

struct ListenerContext {
    events: UnboundedSender<DeviceEvent>,
}

pub struct CoreAudioListener {
    // Present while listeners are registered; its address is the FFI client data
    context: Option<Box<ListenerContext>>,
}

impl CoreAudioListener {
    pub fn new() -> Self {
        Self { context: None }
    }

    /// Register both property listeners. A second call is a no-op.
    pub fn register(&mut self, events: UnboundedSender<DeviceEvent>) -> Result<()> {
        if self.context.is_some() {
            return Ok(());
        }

        let context = Box::new(ListenerContext { events });
        let client_data = &*context as *const ListenerContext as *mut c_void;

        unsafe {
            let result = AudioObjectAddPropertyListener(
                kAudioObjectSystemObject,
                &default_input_address(),
                Some(default_input_changed_listener),
                client_data,
            );

            if result != kAudioHardwareNoError as i32 {
                error!("Failed to register default input listener: {}", result);
                return Err(anyhow::anyhow!("Failed to register default input listener"));
            }

            let result = AudioObjectAddPropertyListener(
                kAudioObjectSystemObject,
                &device_list_address(),
                Some(device_list_changed_listener),
                client_data,
            );

            if result != kAudioHardwareNoError as i32 {
                // roll back the first registration so a retry starts clean
                AudioObjectRemovePropertyListener(
                    kAudioObjectSystemObject,
                    &default_input_address(),
                    Some(default_input_changed_listener),
                    client_data,
                );
                error!("Failed to register device list listener: {}", result);
                return Err(anyhow::anyhow!("Failed to register device list listener"));
            }
        }

        self.context = Some(context);
        info!("CoreAudio property listeners registered");
        Ok(())
    }

    /// Remove both listeners. Idempotent; safe when `register` never ran.
    pub fn unregister(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };

        let client_data = &*context as *const ListenerContext as *mut c_void;

        unsafe {
            AudioObjectRemovePropertyListener(
                kAudioObjectSystemObject,
                &default_input_address(),
                Some(default_input_changed_listener),
                client_data,
            );

            AudioObjectRemovePropertyListener(
                kAudioObjectSystemObject,
                &device_list_address(),
                Some(device_list_changed_listener),
                client_data,
            );
        }

        info!("CoreAudio property listeners removed");
    }
}

impl Drop for CoreAudioListener {
    fn drop(&mut self) {
        self.unregister();
    }
}

fn default_input_address() -> AudioObjectPropertyAddress {
    AudioObjectPropertyAddress {
        mSelector: kAudioHardwarePropertyDefaultInputDevice,
        mScope: kAudioObjectPropertyScopeGlobal,
        mElement: kAudioObjectPropertyElementMain,
    }
}

fn device_list_address() -> AudioObjectPropertyAddress {
    AudioObjectPropertyAddress {
        mSelector: kAudioHardwarePropertyDevices,
        mScope: kAudioObjectPropertyScopeGlobal,
        mElement: kAudioObjectPropertyElementMain,
    }
}

// CoreAudio callback functions

extern "C" fn default_input_changed_listener(
    _in_object_id: AudioObjectID,
    _in_number_addresses: UInt32,
    _in_addresses: *const AudioObjectPropertyAddress,
    in_client_data: *mut c_void,
) -> OSStatus {
    if in_client_data.is_null() {
        return kAudioHardwareNoError as i32;
    }
    let context = unsafe { &*(in_client_data as *const ListenerContext) };

    // Read the new default here; by the time the event is handled the
    // property may have changed again
    let mut device_id: AudioDeviceID = kAudioObjectUnknown;
    let mut data_size = std::mem::size_of::<AudioDeviceID>() as u32;

    let status = unsafe {
        AudioObjectGetPropertyData(
            kAudioObjectSystemObject,
            &default_input_address(),
            0,
            ptr::null(),
            &mut data_size,
            &mut device_id as *mut _ as *mut c_void,
        )
    };

    if status == kAudioHardwareNoError as i32 && device_id != kAudioObjectUnknown {
        let _ = context
            .events
            .send(DeviceEvent::DefaultInputChanged(AudioDeviceId(device_id)));
    }

    kAudioHardwareNoError as i32
}

extern "C" fn device_list_changed_listener(
    _in_object_id: AudioObjectID,
    _in_number_addresses: UInt32,
    _in_addresses: *const AudioObjectPropertyAddress,
    in_client_data: *mut c_void,
) -> OSStatus {
    if !in_client_data.is_null() {
        let context = unsafe { &*(in_client_data as *const ListenerContext) };
        let _ = context.events.send(DeviceEvent::DeviceListChanged);
    }

    kAudioHardwareNoError as i32
}
