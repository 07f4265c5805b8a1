/// Group domain type
use super::Track;
use serde::{Deserialize, Serialize};

/// Index carried by the ungrouped group
pub const UNGROUPED_INDEX: usize = 0;

/// A named album on the disc, or the pool of ungrouped tracks.
///
/// A `None` title marks the ungrouped pool. Named groups are addressed by
/// `index`, numbered from 1 in physical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Identity used for rename/delete addressing
    pub index: usize,

    /// Half-width title, `None` for the ungrouped pool
    pub title: Option<String>,

    /// Full-width title, `None` when absent
    pub full_width_title: Option<String>,

    /// Member tracks
    pub tracks: Vec<Track>,
}

impl Group {
    /// Create a named group
    pub fn named(index: usize, title: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            index,
            title: Some(title.into()),
            full_width_title: None,
            tracks,
        }
    }

    /// Create the ungrouped pool
    pub fn ungrouped(tracks: Vec<Track>) -> Self {
        Self {
            index: UNGROUPED_INDEX,
            title: None,
            full_width_title: None,
            tracks,
        }
    }

    /// Whether this is the ungrouped pool
    pub fn is_ungrouped(&self) -> bool {
        self.title.is_none()
    }

    /// Physical index of the first member track
    pub fn first_index(&self) -> Option<usize> {
        self.tracks.iter().map(|t| t.index).min()
    }

    /// Physical index of the last member track
    pub fn last_index(&self) -> Option<usize> {
        self.tracks.iter().map(|t| t.index).max()
    }

    /// Sorted physical indices of the member tracks
    pub fn track_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.tracks.iter().map(|t| t.index).collect();
        indices.sort_unstable();
        indices
    }

    /// Whether the member indices form a gap-free run
    pub fn is_contiguous(&self) -> bool {
        self.track_indices().windows(2).all(|w| w[1] == w[0] + 1)
    }
}
