use anyhow::Result;
use tracing::{debug, info, warn};

use crate::audio::AudioDevice;
use crate::config::Config;

// Type alias for the default notification manager type
#[cfg(not(any(test, feature = "test-mocks")))]
pub type DefaultNotificationManager = NotificationManager<MacOSNotificationSender>;

#[cfg(any(test, feature = "test-mocks"))]
pub type DefaultNotificationManager = NotificationManager<TestNotificationSender>;

/// Trait for sending notifications - allows for testing without system calls
pub trait NotificationSender: Send {
    fn send(&self, title: &str, body: &str) -> Result<()>;
}

/// Production notification sender using macOS osascript
pub struct MacOSNotificationSender;

impl NotificationSender for MacOSNotificationSender {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        send_native_macos_notification(title, body)
    }
}

/// Test notification sender that doesn't actually send notifications
#[cfg(any(test, feature = "test-mocks"))]
pub struct TestNotificationSender {
    pub sent_notifications: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(any(test, feature = "test-mocks"))]
impl Default for TestNotificationSender {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-mocks"))]
impl TestNotificationSender {
    pub fn new() -> Self {
        Self {
            sent_notifications: std::sync::Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)] // Used by integration tests which run in different compilation context
    pub fn get_sent_notifications(&self) -> Vec<(String, String)> {
        self.sent_notifications.lock().unwrap().clone()
    }
}

#[cfg(any(test, feature = "test-mocks"))]
impl NotificationSender for TestNotificationSender {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        debug!("Test notification: {} - {}", title, body);
        self.sent_notifications
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// Desktop notifications for reconciliation outcomes
pub struct NotificationManager<T: NotificationSender = MacOSNotificationSender> {
    show_restore_actions: bool,
    sender: T,
}

impl DefaultNotificationManager {
    pub fn new(config: &Config) -> Self {
        #[cfg(not(any(test, feature = "test-mocks")))]
        {
            Self {
                show_restore_actions: config.notifications.show_restore_actions,
                sender: MacOSNotificationSender,
            }
        }
        #[cfg(any(test, feature = "test-mocks"))]
        {
            // During tests, avoid real macOS notifications
            Self {
                show_restore_actions: config.notifications.show_restore_actions,
                sender: TestNotificationSender::new(),
            }
        }
    }
}

impl<T: NotificationSender> NotificationManager<T> {
    #[cfg(any(test, feature = "test-mocks"))]
    #[allow(dead_code)] // Used by integration tests which run in different compilation context
    pub fn with_sender(config: &Config, sender: T) -> Self {
        Self {
            show_restore_actions: config.notifications.show_restore_actions,
            sender,
        }
    }

    /// Notify that the preferred input was re-asserted after an automatic switch
    pub fn input_restored(&self, device: &AudioDevice) -> Result<()> {
        if !self.show_restore_actions {
            return Ok(());
        }

        let title = "Preferred Input Restored";
        let body = format!("🎤 Switched back to {}", device.name);

        self.sender.send(title, &body)?;

        info!("Sent input restored notification for: {}", device.name);
        Ok(())
    }

    /// Notify that re-asserting the preferred input failed
    pub fn restore_failed(&self, device_name: &str, error: &str) -> Result<()> {
        if !self.show_restore_actions {
            return Ok(());
        }

        let title = "Input Restore Failed";
        let body = format!("Failed to switch back to {device_name}: {error}");

        self.sender.send(title, &body)?;

        warn!("Sent restore failed notification for: {}", device_name);
        Ok(())
    }
}

/// Send notification using native macOS osascript (more reliable for unsigned apps)
fn send_native_macos_notification(title: &str, body: &str) -> Result<()> {
    use std::process::Command;

    let script = format!(
        r#"display notification "{}" with title "{}" subtitle """#,
        body.replace('"', "\\\""),
        title.replace('"', "\\\"")
    );

    let output = Command::new("osascript").args(["-e", &script]).output()?;

    if output.status.success() {
        Ok(())
    } else {
        let error = String::from_utf8_lossy(&output.stderr);
        Err(anyhow::anyhow!("osascript failed: {}", error))
    }
}
