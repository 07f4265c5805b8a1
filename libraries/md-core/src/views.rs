//! Read-only projections of a [`Disc`].
//!
//! Both functions are pure and infallible; they never touch the device.

use crate::types::{Disc, Group, Track};

/// All tracks ordered by physical index
pub fn sorted_tracks(disc: &Disc) -> Vec<Track> {
    let mut tracks: Vec<Track> = disc.tracks().cloned().collect();
    tracks.sort_by_key(|t| t.index);
    tracks
}

/// The list-rendering projection of a disc.
///
/// Named groups appear in physical order. Every named group is preceded by a
/// synthetic ungrouped list holding the ungrouped tracks that sit before it
/// (empty when there are none), and one trailing ungrouped list holds the
/// rest. The first list therefore always starts at physical index 0.
pub fn grouped_tracks(disc: &Disc) -> Vec<Group> {
    let mut ungrouped: Vec<Track> = disc
        .ungrouped()
        .map(|g| g.tracks.clone())
        .unwrap_or_default();
    ungrouped.sort_by_key(|t| t.index);

    let mut named: Vec<&Group> = disc
        .named_groups()
        .filter(|g| !g.tracks.is_empty())
        .collect();
    named.sort_by_key(|g| g.first_index());

    let mut lists = Vec::with_capacity(named.len() * 2 + 1);
    let mut remaining = ungrouped.into_iter().peekable();

    for group in named {
        let first = group.first_index().unwrap_or(0);
        let mut before = Vec::new();
        while let Some(track) = remaining.next_if(|t| t.index < first) {
            before.push(track);
        }
        lists.push(Group::ungrouped(before));

        let mut group = group.clone();
        group.tracks.sort_by_key(|t| t.index);
        lists.push(group);
    }

    lists.push(Group::ungrouped(remaining.collect()));
    lists
}
