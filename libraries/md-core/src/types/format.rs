/// Recording density and upload format types
use serde::{Deserialize, Serialize};

/// Recording density of a track already on the disc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Normal density (stereo SP)
    Sp,
    /// Double density
    Lp2,
    /// Quadruple density
    Lp4,
}

impl Encoding {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sp => "SP",
            Self::Lp2 => "LP2",
            Self::Lp4 => "LP4",
        }
    }

    /// Playback time per unit of physical space, relative to SP
    #[must_use]
    pub fn multiplier(&self) -> u64 {
        match self {
            Self::Sp => 1,
            Self::Lp2 => 2,
            Self::Lp4 => 4,
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Channel layout of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channels {
    /// Single channel
    Mono,
    /// Two channels
    #[default]
    Stereo,
}

/// Format tag sent along with track data on upload.
///
/// Selects both the encoder target and the time-budget multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Wireformat {
    /// Uncompressed PCM, recorded at normal density
    #[default]
    #[serde(rename = "SP")]
    Sp,
    /// ATRAC3 132 kbps
    #[serde(rename = "LP2")]
    Lp2,
    /// ATRAC3 105 kbps, stored as a double density track
    #[serde(rename = "LP105")]
    Lp105,
    /// ATRAC3 66 kbps
    #[serde(rename = "LP4")]
    Lp4,
}

impl Wireformat {
    /// Every format, in increasing density
    pub const ALL: [Wireformat; 4] = [Self::Sp, Self::Lp2, Self::Lp105, Self::Lp4];

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sp => "SP",
            Self::Lp2 => "LP2",
            Self::Lp105 => "LP105",
            Self::Lp4 => "LP4",
        }
    }

    /// Parse from string (case-insensitive)
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SP" => Some(Self::Sp),
            "LP2" => Some(Self::Lp2),
            "LP105" => Some(Self::Lp105),
            "LP4" => Some(Self::Lp4),
            _ => None,
        }
    }

    /// Density the device records this format at
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        match self {
            Self::Sp => Encoding::Sp,
            Self::Lp2 | Self::Lp105 => Encoding::Lp2,
            Self::Lp4 => Encoding::Lp4,
        }
    }

    /// Budget multiplier applied to the remaining normal-density time
    #[must_use]
    pub fn multiplier(&self) -> u64 {
        self.encoding().multiplier()
    }

    /// Approximate size of one second of payload in this format
    #[must_use]
    pub fn bytes_per_second(&self) -> u64 {
        match self {
            // 44.1 kHz, 16 bit, stereo
            Self::Sp => 176_400,
            Self::Lp2 => 16_538,
            Self::Lp105 => 13_125,
            Self::Lp4 => 8_269,
        }
    }
}

impl std::fmt::Display for Wireformat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
