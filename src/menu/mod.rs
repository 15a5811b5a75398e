//! Display model for the status-item menu.
//!
//! A pure projection of (device list, preferred UID, current default id,
//! launch-at-login state); the presentation layer renders it however it
//! likes. Recomputed in full on every refresh, no hidden state.

use crate::audio::{AudioDevice, AudioDeviceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    /// Disabled header row
    Header { title: String },
    Separator,
    /// Clears the preference and lets the OS pick freely
    SelectNone { checked: bool },
    /// One row per attached input device
    Device {
        name: String,
        uid: String,
        checked: bool,
        is_default: bool,
    },
    HideIcon,
    LaunchAtLogin { enabled: bool },
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuModel {
    pub entries: Vec<MenuEntry>,
}

pub fn build_menu(
    devices: &[AudioDevice],
    preferred_uid: Option<&str>,
    default_id: Option<AudioDeviceId>,
    launch_at_login: bool,
) -> MenuModel {
    let mut entries = vec![
        MenuEntry::Header {
            title: "Preferred Input Device".to_string(),
        },
        MenuEntry::Separator,
        MenuEntry::SelectNone {
            checked: preferred_uid.is_none(),
        },
        MenuEntry::Separator,
    ];

    for device in devices {
        entries.push(MenuEntry::Device {
            name: device.name.clone(),
            uid: device.uid.clone(),
            checked: Some(device.uid.as_str()) == preferred_uid,
            is_default: Some(device.id) == default_id,
        });
    }

    entries.push(MenuEntry::Separator);
    entries.push(MenuEntry::HideIcon);
    entries.push(MenuEntry::LaunchAtLogin {
        enabled: launch_at_login,
    });
    entries.push(MenuEntry::Separator);
    entries.push(MenuEntry::Quit);

    MenuModel { entries }
}
