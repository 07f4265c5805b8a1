mod device;
mod disc;
mod format;
mod group;
mod track;

pub use device::{
    Capability, DeviceStatus, DiscTime, PlaybackState, ReadProgress, SeekTime, TrackPosition,
    WriteProgress,
};
pub use disc::Disc;
pub use format::{Channels, Encoding, Wireformat};
pub use group::{Group, UNGROUPED_INDEX};
pub use track::{Track, FRAMES_PER_SECOND};
