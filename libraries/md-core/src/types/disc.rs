/// Disc aggregate
use super::{Group, Track};
use serde::{Deserialize, Serialize};

/// The whole content directory of one disc.
///
/// `used`, `left` and `track_count` are always recomputed from the tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disc {
    /// Half-width disc title
    pub title: String,

    /// Full-width disc title
    #[serde(default)]
    pub full_width_title: String,

    /// Total capacity in normal-density frames
    pub capacity: u64,

    /// Write-protect tab set
    #[serde(default)]
    pub write_protected: bool,

    /// Disc accepts recordings
    #[serde(default = "default_writable")]
    pub writable: bool,

    /// Groups, ungrouped pool first when present
    pub groups: Vec<Group>,
}

fn default_writable() -> bool {
    true
}

impl Disc {
    /// Create an empty writable disc
    pub fn new(title: impl Into<String>, capacity: u64) -> Self {
        Self {
            title: title.into(),
            full_width_title: String::new(),
            capacity,
            write_protected: false,
            writable: true,
            groups: Vec::new(),
        }
    }

    /// Replace the group list
    #[must_use]
    pub fn with_groups(mut self, groups: Vec<Group>) -> Self {
        self.groups = groups;
        self
    }

    /// Iterate every track regardless of group, in group order
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.groups.iter().flat_map(|g| g.tracks.iter())
    }

    /// Number of tracks on the disc
    pub fn track_count(&self) -> usize {
        self.tracks().count()
    }

    /// Frames occupied by recordings, expressed at normal density
    pub fn used(&self) -> u64 {
        self.tracks()
            .map(|t| t.duration.div_ceil(t.encoding.multiplier()))
            .sum()
    }

    /// Frames still free, expressed at normal density
    pub fn left(&self) -> u64 {
        self.capacity.saturating_sub(self.used())
    }

    /// The ungrouped pool, if any
    pub fn ungrouped(&self) -> Option<&Group> {
        self.groups.iter().find(|g| g.is_ungrouped())
    }

    /// Named groups in list order
    pub fn named_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| !g.is_ungrouped())
    }

    /// Look up a track by physical index
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks().find(|t| t.index == index)
    }

    /// The group holding the given track
    pub fn group_of(&self, index: usize) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| g.tracks.iter().any(|t| t.index == index))
    }
}
