use std::fmt;

/// Provider-scoped numeric device handle.
///
/// CoreAudio may reuse these across connect/disconnect cycles, so they are
/// only valid against the snapshot they were read from. The device UID is the
/// durable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioDeviceId(pub u32);

impl fmt::Display for AudioDeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point-in-time view of one input device. Never mutated; re-fetched on
/// every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    pub id: AudioDeviceId,
    pub uid: String,
    pub name: String,
}

impl AudioDevice {
    pub fn new(id: AudioDeviceId, uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            uid: uid.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for AudioDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_name_and_uid() {
        let device = AudioDevice::new(AudioDeviceId(42), "uid-mv7", "Shure MV7");
        assert_eq!(device.to_string(), "Shure MV7 [uid-mv7]");
    }
}
