/// Device status and capability types
use serde::{Deserialize, Serialize};

/// Transport state reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Ready,
    Playing,
    Paused,
    FastForward,
    Rewind,
    ReadingToc,
    NoDisc,
    DiscBlank,
    Unknown,
}

/// Position inside the current track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscTime {
    pub minute: u32,
    pub second: u32,
    pub frame: u32,
}

/// Snapshot of the device's transport state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Whether a disc is loaded
    pub disc_present: bool,

    /// Current track, if any
    pub track: Option<usize>,

    /// Position inside the current track, if known
    pub time: Option<DiscTime>,

    /// Transport state
    pub state: PlaybackState,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            disc_present: true,
            track: Some(0),
            time: Some(DiscTime::default()),
            state: PlaybackState::Ready,
        }
    }
}

/// Absolute playback position as reported by `DeviceTransport::position`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPosition {
    pub track: usize,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub frame: u32,
}

/// Arguments of a `goto_time` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeekTime {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub frame: u32,
}

impl SeekTime {
    /// Split a position in seconds into seek arguments.
    ///
    /// Sub-second precision is rounded away; the frame field is always 0.
    pub fn from_seconds(seconds: f64) -> Self {
        let total = seconds.max(0.0).round() as u64;
        Self {
            hour: (total / 3600) as u32,
            minute: ((total / 60) % 60) as u32,
            second: (total % 60) as u32,
            frame: 0,
        }
    }
}

/// Features a connected device (or its service) offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ContentList,
    PlaybackControl,
    MetadataEdit,
    TrackUpload,
    TrackDownload,
    DiscEject,
}

impl Capability {
    /// Every capability
    pub const ALL: [Capability; 6] = [
        Self::ContentList,
        Self::PlaybackControl,
        Self::MetadataEdit,
        Self::TrackUpload,
        Self::TrackDownload,
        Self::DiscEject,
    ];
}

/// Progress of a device write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WriteProgress {
    pub written: u64,
    pub encrypted: u64,
    pub total: u64,
}

/// Progress of a device read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadProgress {
    pub read: u64,
    pub total: u64,
}
