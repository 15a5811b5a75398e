//! End-to-end reconciliation scenarios driven through the monitor's event
//! loop with a mock provider.

use std::sync::Arc;
use std::time::Duration;

use sticky_mic::Config;
use sticky_mic::audio::{AudioDeviceId, AudioDeviceMonitor};
use sticky_mic::prefs::PreferenceStore;
use sticky_mic::system::{CountingPresenter, MemoryPreferenceStore, MockAudioSystem};

mod test_utils;
use test_utils::scenarios::{bluetooth_headset, builtin_mic, usb_mic};
use test_utils::settle;

struct Rig {
    audio: MockAudioSystem,
    presenter: CountingPresenter,
    monitor: AudioDeviceMonitor<MockAudioSystem, MemoryPreferenceStore, CountingPresenter>,
}

fn started_rig(
    devices: Vec<sticky_mic::audio::AudioDevice>,
    preferred_uid: Option<&str>,
) -> Rig {
    let audio = MockAudioSystem::new();
    audio.set_devices(devices);

    let mut prefs = MemoryPreferenceStore::new();
    prefs.set_preferred_device_uid(preferred_uid).unwrap();

    let presenter = CountingPresenter::new();
    let mut monitor = AudioDeviceMonitor::new(
        Arc::new(audio.clone()),
        prefs,
        presenter.clone(),
        &Config::default(),
    );
    monitor.start().unwrap();

    Rig {
        audio,
        presenter,
        monitor,
    }
}

#[tokio::test(start_paused = true)]
async fn reverts_os_auto_switch_to_a_new_device() {
    // preferred = builtin, snapshot = [builtin, usb], default = builtin
    let mut rig = started_rig(vec![builtin_mic(), usb_mic()], Some("uid-builtin"));
    rig.audio.set_default_input(Some(AudioDeviceId(1)));

    // headset connects, then the OS flips the default to it within the window
    rig.audio
        .set_devices(vec![builtin_mic(), usb_mic(), bluetooth_headset()]);
    rig.audio.emit_device_list_changed();
    rig.audio.emit_default_input_changed(AudioDeviceId(3));
    settle().await;

    assert_eq!(rig.audio.set_default_calls(), vec![AudioDeviceId(1)]);
    rig.monitor.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn respects_manual_selection_of_a_known_device() {
    let mut rig = started_rig(vec![builtin_mic(), usb_mic()], Some("uid-builtin"));

    // no device-list change precedes this: the user picked the USB mic
    rig.audio.emit_default_input_changed(AudioDeviceId(2));
    settle().await;

    assert!(rig.audio.set_default_calls().is_empty());
    rig.monitor.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn respects_selection_made_after_the_window_closes() {
    let mut rig = started_rig(vec![builtin_mic()], Some("uid-builtin"));

    rig.audio.set_devices(vec![builtin_mic(), bluetooth_headset()]);
    rig.audio.emit_device_list_changed();
    settle().await;

    // the recency window expires with no further connects
    tokio::time::sleep(Duration::from_millis(2500)).await;
    settle().await;

    rig.audio.emit_default_input_changed(AudioDeviceId(3));
    settle().await;

    assert!(rig.audio.set_default_calls().is_empty());
    rig.monitor.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn disconnected_preferred_device_is_left_alone() {
    let mut rig = started_rig(vec![builtin_mic()], Some("uid-builtin"));

    // preferred device drops off while the headset appears; the OS falls
    // back to the headset
    rig.audio.set_devices(vec![bluetooth_headset()]);
    rig.audio.emit_device_list_changed();
    rig.audio.emit_default_input_changed(AudioDeviceId(3));
    settle().await;

    // no switch attempted, no crash
    assert!(rig.audio.set_default_calls().is_empty());
    rig.monitor.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn no_preference_means_no_interference() {
    let mut rig = started_rig(vec![builtin_mic()], None);

    rig.audio.set_devices(vec![builtin_mic(), bluetooth_headset()]);
    rig.audio.emit_device_list_changed();
    rig.audio.emit_default_input_changed(AudioDeviceId(3));
    settle().await;

    assert!(rig.audio.set_default_calls().is_empty());
    rig.monitor.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn default_change_to_the_preferred_device_is_not_reverted() {
    let mut rig = started_rig(vec![builtin_mic()], Some("uid-builtin"));

    // the preferred device itself reconnects and the OS selects it
    rig.audio.set_devices(vec![usb_mic(), builtin_mic()]);
    rig.audio.emit_device_list_changed();
    rig.audio.emit_default_input_changed(AudioDeviceId(1));
    settle().await;

    assert!(rig.audio.set_default_calls().is_empty());
    rig.monitor.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn set_default_failure_does_not_stop_the_monitor() {
    let mut rig = started_rig(vec![builtin_mic()], Some("uid-builtin"));
    rig.audio.set_default_failure(true);

    rig.audio.set_devices(vec![builtin_mic(), bluetooth_headset()]);
    rig.audio.emit_device_list_changed();
    rig.audio.emit_default_input_changed(AudioDeviceId(3));
    settle().await;

    // one attempt, no retry
    assert_eq!(rig.audio.set_default_calls(), vec![AudioDeviceId(1)]);

    // the engine keeps reacting to later events
    rig.audio.set_default_failure(false);
    rig.audio.emit_default_input_changed(AudioDeviceId(3));
    settle().await;

    assert_eq!(
        rig.audio.set_default_calls(),
        vec![AudioDeviceId(1), AudioDeviceId(1)]
    );
    rig.monitor.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn reconnected_device_counts_as_new_again() {
    let mut rig = started_rig(vec![builtin_mic(), usb_mic()], Some("uid-builtin"));

    // the USB mic goes away...
    rig.audio.set_devices(vec![builtin_mic()]);
    rig.audio.emit_device_list_changed();
    settle().await;

    // ...and comes back: it is new relative to the current known set
    rig.audio.set_devices(vec![builtin_mic(), usb_mic()]);
    rig.audio.emit_device_list_changed();
    rig.audio.emit_default_input_changed(AudioDeviceId(2));
    settle().await;

    assert_eq!(rig.audio.set_default_calls(), vec![AudioDeviceId(1)]);
    rig.monitor.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn every_event_triggers_a_presentation_refresh() {
    let mut rig = started_rig(vec![builtin_mic()], Some("uid-builtin"));

    rig.audio.set_devices(vec![builtin_mic(), bluetooth_headset()]);
    rig.audio.emit_device_list_changed();
    rig.audio.emit_default_input_changed(AudioDeviceId(3));
    settle().await;

    assert_eq!(rig.presenter.refresh_count(), 2);
    rig.monitor.stop().unwrap();
}
