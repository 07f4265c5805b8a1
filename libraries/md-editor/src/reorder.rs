//! Reordering engine.
//!
//! Pure planning over a [`Disc`] snapshot: nothing here talks to the device.
//! The editor turns a plan into device commands and reloads afterwards.

use md_core::views::grouped_tracks;
use md_core::{Disc, Group, MdError, Result, Track};
use std::cmp::Ordering;
use tracing::debug;

/// Address of a row in the [`grouped_tracks`] projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListPosition {
    pub list: usize,
    pub index: usize,
}

impl ListPosition {
    pub fn new(list: usize, index: usize) -> Self {
        Self { list, index }
    }
}

/// Device commands needed to carry out one drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragDropPlan {
    /// Physical move `(from, to)`, issued without group update
    pub track_move: Option<(usize, usize)>,

    /// Complete group layout to write after the move, ungrouped pool first
    pub groups: Vec<Group>,
}

/// Track range for a new group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRange {
    pub begin: usize,
    pub length: usize,
}

/// Plan dragging the track at `source` to `target`.
///
/// Returns `None` when the drop is a no-op. Positions refer to the grouped
/// view of `disc`; `target` is an insertion point in its list once the
/// source track has been taken out.
pub fn plan_drag_drop(
    disc: &Disc,
    source: ListPosition,
    target: ListPosition,
) -> Result<Option<DragDropPlan>> {
    if source == target {
        return Ok(None);
    }

    let mut lists = grouped_tracks(disc);
    if source.list >= lists.len() || source.index >= lists[source.list].tracks.len() {
        return Err(MdError::precondition(format!(
            "No track at list {} position {}",
            source.list, source.index
        )));
    }
    let mut moved = lists[source.list].tracks.remove(source.index);

    if target.list >= lists.len() || target.index > lists[target.list].tracks.len() {
        return Err(MdError::precondition(format!(
            "Cannot drop at list {} position {}",
            target.list, target.index
        )));
    }

    // Everything between the two positions slides one place towards the
    // hole the source track left.
    let (start, end, forward) = match source.cmp(&target) {
        Ordering::Less => (source, target, true),
        _ => (target, source, false),
    };
    for list in start.list..=end.list {
        let from = if list == start.list { start.index } else { 0 };
        let to = if list == end.list {
            end.index
        } else {
            lists[list].tracks.len()
        };
        for track in &mut lists[list].tracks[from..to] {
            track.index = if forward {
                track.index - 1
            } else {
                track.index + 1
            };
        }
    }

    let new_index = destination_index(&lists, target);
    let track_move = (moved.index != new_index).then_some((moved.index, new_index));
    debug!(
        "Drag {:?} -> {:?}: track {} to position {}",
        source, target, moved.index, new_index
    );

    moved.index = new_index;
    lists[target.list].tracks.insert(target.index, moved);

    Ok(Some(DragDropPlan {
        track_move,
        groups: normalize_groups(lists),
    }))
}

fn destination_index(lists: &[Group], target: ListPosition) -> usize {
    if target.list == 0 {
        return target.index;
    }
    if target.index > 0 {
        return lists[target.list].tracks[0].index + target.index;
    }
    lists[..target.list]
        .iter()
        .rev()
        .find_map(|g| g.tracks.last())
        .map_or(0, |t| t.index + 1)
}

/// Collapse the grouped view back into device groups: empty lists go away
/// and every ungrouped run joins one pool placed first.
fn normalize_groups(lists: Vec<Group>) -> Vec<Group> {
    let mut ungrouped: Vec<Track> = Vec::new();
    let mut named = Vec::new();
    for group in lists.into_iter().filter(|g| !g.tracks.is_empty()) {
        if group.is_ungrouped() {
            ungrouped.extend(group.tracks);
        } else {
            named.push(group);
        }
    }

    if !ungrouped.is_empty() {
        named.insert(0, Group::ungrouped(ungrouped));
    }
    named
}

/// Validate a selection of tracks for grouping.
///
/// The selection must be non-empty, name only existing ungrouped tracks and
/// form a gap-free run once sorted.
pub fn plan_group_tracks(disc: &Disc, selection: &[usize]) -> Result<GroupRange> {
    let mut indexes = selection.to_vec();
    indexes.sort_unstable();
    indexes.dedup();

    let (Some(&begin), Some(&last)) = (indexes.first(), indexes.last()) else {
        return Err(MdError::precondition("No tracks selected"));
    };

    for &index in &indexes {
        match disc.group_of(index) {
            None => {
                return Err(MdError::precondition(format!("No track {}", index)));
            }
            Some(group) if !group.is_ungrouped() => {
                return Err(MdError::precondition(format!(
                    "Track {} is already in group '{}'",
                    index,
                    group.title.as_deref().unwrap_or_default()
                )));
            }
            Some(_) => {}
        }
    }

    let length = last - begin + 1;
    if length != indexes.len() {
        return Err(MdError::precondition(
            "Only consecutive tracks can be grouped",
        ));
    }

    Ok(GroupRange { begin, length })
}

/// Order group deletions so earlier indices stay valid
pub fn delete_order(ids: &[usize]) -> Vec<usize> {
    let mut ids = ids.to_vec();
    ids.sort_unstable_by(|a, b| b.cmp(a));
    ids.dedup();
    ids
}
