use std::fmt;

use serde::{Deserialize, Serialize};

/// Negotiated protocol version number as sent in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(pub i32);

impl ProtocolVersion {
    pub const MINECRAFT_1_12_2: Self = Self(340);
    pub const MINECRAFT_1_13: Self = Self(393);
    pub const MINECRAFT_1_19: Self = Self(759);
    pub const MINECRAFT_1_19_3: Self = Self(761);
    pub const MINECRAFT_1_20_2: Self = Self(764);
    pub const MINECRAFT_1_20_3: Self = Self(765);
    pub const MINECRAFT_1_20_5: Self = Self(766);
    pub const MINECRAFT_1_21: Self = Self(767);
    pub const MINECRAFT_1_21_2: Self = Self(768);
    pub const MINECRAFT_1_21_5: Self = Self(770);
    pub const MINECRAFT_1_21_6: Self = Self(771);
    pub const MINECRAFT_1_21_9: Self = Self(773);

    /// Every version the codec registry is built for, ascending.
    pub const SUPPORTED: [Self; 12] = [
        Self::MINECRAFT_1_12_2,
        Self::MINECRAFT_1_13,
        Self::MINECRAFT_1_19,
        Self::MINECRAFT_1_19_3,
        Self::MINECRAFT_1_20_2,
        Self::MINECRAFT_1_20_3,
        Self::MINECRAFT_1_20_5,
        Self::MINECRAFT_1_21,
        Self::MINECRAFT_1_21_2,
        Self::MINECRAFT_1_21_5,
        Self::MINECRAFT_1_21_6,
        Self::MINECRAFT_1_21_9,
    ];

    pub const MINIMUM: Self = Self::SUPPORTED[0];
    pub const MAXIMUM: Self = Self::SUPPORTED[Self::SUPPORTED.len() - 1];

    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }

    /// Closest supported version not newer than `self`, clamped to the supported range.
    pub fn nearest_supported(&self) -> Self {
        Self::SUPPORTED
            .iter()
            .rev()
            .find(|v| *v <= self)
            .copied()
            .unwrap_or(Self::MINIMUM)
    }

    pub fn name(&self) -> &'static str {
        match self.0 {
            340 => "1.12.2",
            393 => "1.13",
            759 => "1.19",
            761 => "1.19.3",
            764 => "1.20.2",
            765 => "1.20.3",
            766 => "1.20.5",
            767 => "1.21",
            768 => "1.21.2",
            770 => "1.21.5",
            771 => "1.21.6",
            773 => "1.21.9",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::ProtocolVersion;

    #[test]
    fn nearest_supported_rounds_down() {
        assert_eq!(
            ProtocolVersion(769).nearest_supported(),
            ProtocolVersion::MINECRAFT_1_21_2
        );
        assert_eq!(
            ProtocolVersion(764).nearest_supported(),
            ProtocolVersion::MINECRAFT_1_20_2
        );
        assert_eq!(ProtocolVersion(47).nearest_supported(), ProtocolVersion::MINIMUM);
        assert_eq!(ProtocolVersion(9999).nearest_supported(), ProtocolVersion::MAXIMUM);
    }

    #[test]
    fn supported_list_is_ascending() {
        let mut sorted = ProtocolVersion::SUPPORTED;
        sorted.sort();
        assert_eq!(sorted, ProtocolVersion::SUPPORTED);
    }
}
