use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::audio::{AudioDeviceId, InputSnapshot};
use crate::config::Config;
use crate::notifications::DefaultNotificationManager;
use crate::prefs::PreferenceStore;
use crate::system::{AudioSystemInterface, Presenter};

use super::recency::{RecencyExpiry, RecencyTracker};

/// Decides, on every default-input change, whether the change was the OS
/// auto-selecting a freshly connected device (undo it) or a deliberate user
/// switch (leave it alone).
///
/// All state lives here and is only touched by the single task that drives
/// `handle_*`; provider notifications are marshaled onto that task as channel
/// messages before they reach this type.
pub struct ReconcileEngine<A, P, R>
where
    A: AudioSystemInterface + ?Sized,
    P: PreferenceStore,
    R: Presenter,
{
    audio: Arc<A>,
    prefs: P,
    presenter: R,
    tracker: RecencyTracker,
    notifications: DefaultNotificationManager,
}

impl<A, P, R> ReconcileEngine<A, P, R>
where
    A: AudioSystemInterface + ?Sized,
    P: PreferenceStore,
    R: Presenter,
{
    pub fn new(
        audio: Arc<A>,
        prefs: P,
        presenter: R,
        tracker: RecencyTracker,
        config: &Config,
    ) -> Self {
        Self {
            audio,
            prefs,
            presenter,
            tracker,
            notifications: DefaultNotificationManager::new(config),
        }
    }

    /// Seed the known-device set from a snapshot taken before the provider
    /// subscription is registered, so pre-existing devices never count as new.
    pub fn initialize(&mut self) -> Result<()> {
        let snapshot = InputSnapshot::capture(self.audio.as_ref())?;
        info!(
            devices = snapshot.devices.len(),
            "initialized known input devices"
        );
        self.tracker.initialize(snapshot.uid_set());
        Ok(())
    }

    /// The default input device changed. Force it back to the preferred
    /// device only when the change looks like an OS auto-switch to a device
    /// that just appeared.
    pub fn handle_default_input_changed(&mut self, new_id: AudioDeviceId) {
        let snapshot = match InputSnapshot::capture(self.audio.as_ref()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // Expected steady state when a device vanished mid-change
                warn!("could not snapshot devices after default change: {e:#}");
                self.presenter.refresh();
                return;
            }
        };

        self.reconcile(new_id, &snapshot);
        self.presenter.refresh();
    }

    /// The device list changed. Record which devices are new so the next
    /// default change can be classified.
    pub fn handle_device_list_changed(&mut self) {
        match InputSnapshot::capture(self.audio.as_ref()) {
            Ok(snapshot) => {
                let added = self.tracker.on_device_list_changed(snapshot.uid_set());
                if !added.is_empty() {
                    info!(added = ?added, "new input devices connected");
                }
            }
            Err(e) => {
                warn!("could not snapshot devices after list change: {e:#}");
            }
        }

        self.presenter.refresh();
    }

    pub fn handle_recency_expiry(&mut self, expiry: RecencyExpiry) {
        self.tracker.handle_window_elapsed(expiry);
    }

    pub fn reload_preferences(&mut self) {
        if let Err(e) = self.prefs.reload() {
            warn!("preference reload failed: {e:#}");
        }
    }

    pub fn is_recently_added(&self, uid: &str) -> bool {
        self.tracker.is_recently_added(uid)
    }

    fn reconcile(&mut self, new_id: AudioDeviceId, snapshot: &InputSnapshot) {
        let Some(preferred_uid) = self.prefs.preferred_device_uid() else {
            debug!("no preferred input set, leaving default as-is");
            return;
        };

        // Device ids are not stable keys; resolve against the fresh snapshot.
        // An unresolvable id is a steady state (device already gone), not a fault.
        let Some(new_uid) = snapshot.uid_for(new_id) else {
            debug!(%new_id, "new default input not present in snapshot");
            return;
        };

        if new_uid == preferred_uid {
            debug!("default input is already the preferred device");
            return;
        }

        if !self.tracker.is_recently_added(new_uid) {
            debug!(
                uid = %new_uid,
                "default changed to a known device, treating as user selection"
            );
            return;
        }

        // A newly connected device took over: put the preferred one back,
        // unless it disappeared between the notification and this snapshot.
        let Some(preferred) = snapshot.device_with_uid(&preferred_uid) else {
            debug!(
                uid = %preferred_uid,
                "preferred input not connected, keeping OS selection"
            );
            return;
        };

        info!(
            new = %new_uid,
            preferred = %preferred,
            "auto-switch detected, restoring preferred input"
        );

        match self.audio.set_default_input_device(preferred.id) {
            Ok(()) => {
                if let Err(e) = self.notifications.input_restored(preferred) {
                    warn!("Failed to send input restored notification: {}", e);
                }
            }
            Err(e) => {
                // Not retried; the next notification re-evaluates from scratch
                warn!("failed to restore preferred input {}: {e:#}", preferred.name);
                if let Err(e) = self.notifications.restore_failed(&preferred.name, &e.to_string())
                {
                    warn!("Failed to send restore failed notification: {}", e);
                }
            }
        }
    }
}
