/// Track domain type
use super::{Channels, Encoding};
use serde::{Deserialize, Serialize};

/// Medium-native time units per second of normal-density audio
pub const FRAMES_PER_SECOND: u64 = 512;

/// A track as currently recorded on the disc
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Physical position, 0-based and dense across the disc
    pub index: usize,

    /// Half-width title (empty when untitled)
    pub title: String,

    /// Full-width title (empty when absent)
    #[serde(default)]
    pub full_width_title: String,

    /// Duration in frames (512 per second)
    pub duration: u64,

    /// Recording density
    pub encoding: Encoding,

    /// Channel layout
    #[serde(default)]
    pub channel: Channels,

    /// Copy-protection flag
    #[serde(default)]
    pub protected: bool,
}

impl Track {
    /// Create an unprotected stereo track
    pub fn new(index: usize, title: impl Into<String>, duration: u64, encoding: Encoding) -> Self {
        Self {
            index,
            title: title.into(),
            full_width_title: String::new(),
            duration,
            encoding,
            channel: Channels::Stereo,
            protected: false,
        }
    }

    /// Set the full-width title
    #[must_use]
    pub fn with_full_width_title(mut self, title: impl Into<String>) -> Self {
        self.full_width_title = title.into();
        self
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.duration as f64 / FRAMES_PER_SECOND as f64
    }
}
