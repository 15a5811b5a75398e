//! Window timing behavior observed through the full monitor loop.

use std::sync::Arc;
use std::time::Duration;

use sticky_mic::Config;
use sticky_mic::audio::{AudioDeviceId, AudioDeviceMonitor};
use sticky_mic::prefs::PreferenceStore;
use sticky_mic::system::{CountingPresenter, MemoryPreferenceStore, MockAudioSystem};

mod test_utils;
use test_utils::InputDeviceBuilder;
use test_utils::scenarios::builtin_mic;
use test_utils::settle;

fn headset(id: u32, uid: &str) -> sticky_mic::audio::AudioDevice {
    InputDeviceBuilder::new()
        .id(id)
        .uid(uid)
        .name("Headset")
        .build()
}

async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn devices_present_at_startup_are_not_reverted() {
    let audio = MockAudioSystem::new();
    audio.set_devices(vec![builtin_mic(), headset(3, "uid-headset")]);

    let mut prefs = MemoryPreferenceStore::new();
    prefs.set_preferred_device_uid(Some("uid-builtin")).unwrap();

    let mut monitor = AudioDeviceMonitor::new(
        Arc::new(audio.clone()),
        prefs,
        CountingPresenter::new(),
        &Config::default(),
    );
    monitor.start().unwrap();

    // the headset was in the startup snapshot, so this reads as manual
    audio.emit_default_input_changed(AudioDeviceId(3));
    settle().await;

    assert!(audio.set_default_calls().is_empty());
    monitor.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn second_connect_batch_extends_the_first_batch_window() {
    let audio = MockAudioSystem::new();
    audio.set_devices(vec![builtin_mic()]);

    let mut prefs = MemoryPreferenceStore::new();
    prefs.set_preferred_device_uid(Some("uid-builtin")).unwrap();

    let mut monitor = AudioDeviceMonitor::new(
        Arc::new(audio.clone()),
        prefs,
        CountingPresenter::new(),
        &Config::default(),
    );
    monitor.start().unwrap();

    // first headset connects
    audio.set_devices(vec![builtin_mic(), headset(3, "uid-first")]);
    audio.emit_device_list_changed();
    advance(Duration::from_secs(1)).await;

    // second headset connects 1s later, restarting the window
    audio.set_devices(vec![
        builtin_mic(),
        headset(3, "uid-first"),
        headset(4, "uid-second"),
    ]);
    audio.emit_device_list_changed();
    advance(Duration::from_millis(1500)).await;

    // 2.5s after the FIRST batch: without the reset its window would have
    // closed, but the auto-switch to the first headset is still reverted
    audio.emit_default_input_changed(AudioDeviceId(3));
    settle().await;
    assert_eq!(audio.set_default_calls(), vec![AudioDeviceId(1)]);

    // 2s after the second batch everything expired together
    advance(Duration::from_millis(600)).await;
    audio.emit_default_input_changed(AudioDeviceId(4));
    settle().await;
    assert_eq!(audio.set_default_calls(), vec![AudioDeviceId(1)]);

    monitor.stop().unwrap();
}

#[tokio::test(start_paused = true)]
async fn window_length_follows_configuration() {
    let audio = MockAudioSystem::new();
    audio.set_devices(vec![builtin_mic()]);

    let mut prefs = MemoryPreferenceStore::new();
    prefs.set_preferred_device_uid(Some("uid-builtin")).unwrap();

    let mut config = Config::default();
    config.reconcile.recency_window_ms = 500;

    let mut monitor = AudioDeviceMonitor::new(
        Arc::new(audio.clone()),
        prefs,
        CountingPresenter::new(),
        &config,
    );
    monitor.start().unwrap();

    audio.set_devices(vec![builtin_mic(), headset(3, "uid-headset")]);
    audio.emit_device_list_changed();
    advance(Duration::from_millis(700)).await;

    // the shortened window already expired
    audio.emit_default_input_changed(AudioDeviceId(3));
    settle().await;

    assert!(audio.set_default_calls().is_empty());
    monitor.stop().unwrap();
}
