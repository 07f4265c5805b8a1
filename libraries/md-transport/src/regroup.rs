//! Group range maintenance.
//!
//! A device stores groups as ranges over physical track positions. When a
//! track moves or is deleted the ranges have to follow, the way a recorder
//! updates its own directory. Every function keeps named groups contiguous
//! as long as they were contiguous on entry.

use md_core::{Group, Track};
use serde::{Deserialize, Serialize};

/// A stored named group: titles plus sorted member positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDef {
    pub title: String,
    #[serde(default)]
    pub full_width_title: Option<String>,
    pub tracks: Vec<usize>,
}

impl GroupDef {
    pub fn new(title: impl Into<String>, tracks: Vec<usize>) -> Self {
        let mut tracks = tracks;
        tracks.sort_unstable();
        Self {
            title: title.into(),
            full_width_title: None,
            tracks,
        }
    }

    fn first(&self) -> Option<usize> {
        self.tracks.first().copied()
    }

    fn last(&self) -> Option<usize> {
        self.tracks.last().copied()
    }

    /// Whether `position` lies strictly between the first and last member
    fn spans(&self, position: usize) -> bool {
        matches!((self.first(), self.last()), (Some(a), Some(b)) if a < position && position < b)
    }

    /// Whether a track at `position` would extend this group without a gap
    fn borders(&self, position: usize) -> bool {
        match (self.first(), self.last()) {
            (Some(a), Some(b)) => position + 1 == a || b + 1 == position,
            _ => true,
        }
    }

    /// Materialise as a model group
    pub fn to_group(&self, index: usize, tracks: &[Track]) -> Group {
        Group {
            index,
            title: Some(self.title.clone()),
            full_width_title: self.full_width_title.clone(),
            tracks: tracks
                .iter()
                .filter(|t| self.tracks.contains(&t.index))
                .cloned()
                .collect(),
        }
    }
}

/// Sort, deduplicate and drop empty groups
pub fn normalize(defs: &mut Vec<GroupDef>) {
    for def in defs.iter_mut() {
        def.tracks.sort_unstable();
        def.tracks.dedup();
    }
    defs.retain(|d| !d.tracks.is_empty());
    defs.sort_by_key(GroupDef::first);
}

/// Follow a move of the track at `src` to `dst`.
///
/// Every other track shifts by one towards the hole `src` left. The moved
/// track joins the group whose range now surrounds `dst`; failing that it
/// stays in its own group if it still borders it, and otherwise becomes
/// ungrouped.
pub fn after_move(defs: &mut Vec<GroupDef>, src: usize, dst: usize) {
    if src == dst {
        return;
    }

    let shift = |i: usize| {
        if src < dst && i > src && i <= dst {
            i - 1
        } else if dst < src && i >= dst && i < src {
            i + 1
        } else {
            i
        }
    };

    let home = defs.iter().position(|d| d.tracks.contains(&src));
    for def in defs.iter_mut() {
        def.tracks.retain(|&i| i != src);
        for i in &mut def.tracks {
            *i = shift(*i);
        }
        def.tracks.sort_unstable();
    }

    let target = defs
        .iter()
        .position(|d| d.spans(dst))
        .or_else(|| home.filter(|&h| defs[h].borders(dst)));
    if let Some(target) = target {
        defs[target].tracks.push(dst);
    }

    normalize(defs);
}

/// Follow the deletion of the track at `index`
pub fn after_delete(defs: &mut Vec<GroupDef>, index: usize) {
    for def in defs.iter_mut() {
        def.tracks.retain(|&i| i != index);
        for i in &mut def.tracks {
            if *i > index {
                *i -= 1;
            }
        }
    }
    normalize(defs);
}

/// Check a proposed group set against `track_count` tracks.
///
/// Returns a description of the first problem found.
pub fn validate(defs: &[GroupDef], track_count: usize) -> Result<(), String> {
    let mut seen = vec![false; track_count];
    for def in defs {
        let mut sorted = def.tracks.clone();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[1] != w[0] + 1) {
            return Err(format!("Group '{}' is not contiguous", def.title));
        }
        for &i in &sorted {
            match seen.get_mut(i) {
                None => return Err(format!("Group '{}' references track {}", def.title, i)),
                Some(true) => return Err("A track cannot be in 2 groups".to_string()),
                Some(slot) => *slot = true,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(defs: &[GroupDef]) -> Vec<Vec<usize>> {
        defs.iter().map(|d| d.tracks.clone()).collect()
    }

    #[test]
    fn test_move_out_of_group_to_the_end() {
        let mut defs = vec![GroupDef::new("A", vec![1, 2, 3])];
        after_move(&mut defs, 2, 5);
        assert_eq!(spans(&defs), vec![vec![1, 2]]);
    }

    #[test]
    fn test_move_into_another_group() {
        let mut defs = vec![GroupDef::new("G", vec![0, 1]), GroupDef::new("H", vec![2, 3])];
        after_move(&mut defs, 3, 1);
        assert_eq!(spans(&defs), vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn test_move_within_group_keeps_membership() {
        let mut defs = vec![GroupDef::new("A", vec![0, 1, 2, 3])];
        after_move(&mut defs, 0, 3);
        assert_eq!(spans(&defs), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_move_to_group_edge_stays_home() {
        let mut defs = vec![GroupDef::new("A", vec![1, 2, 3])];
        after_move(&mut defs, 2, 3);
        assert_eq!(spans(&defs), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_move_away_from_group_leaves_it() {
        let mut defs = vec![GroupDef::new("A", vec![1, 2, 3])];
        after_move(&mut defs, 1, 0);
        assert_eq!(spans(&defs), vec![vec![2, 3]]);
    }

    #[test]
    fn test_ungrouped_track_landing_next_to_group_stays_ungrouped() {
        let mut defs = vec![GroupDef::new("A", vec![1, 2])];
        after_move(&mut defs, 4, 3);
        assert_eq!(spans(&defs), vec![vec![1, 2]]);
    }

    #[test]
    fn test_emptied_group_is_dropped() {
        let mut defs = vec![GroupDef::new("Solo", vec![0]), GroupDef::new("B", vec![1, 2])];
        after_delete(&mut defs, 0);
        assert_eq!(spans(&defs), vec![vec![0, 1]]);
        assert_eq!(defs[0].title, "B");
    }

    #[test]
    fn test_delete_shifts_later_groups() {
        let mut defs = vec![GroupDef::new("A", vec![0, 1]), GroupDef::new("B", vec![3, 4])];
        after_delete(&mut defs, 1);
        assert_eq!(spans(&defs), vec![vec![0], vec![2, 3]]);
    }

    #[test]
    fn test_validate() {
        assert!(validate(&[GroupDef::new("A", vec![0, 1])], 3).is_ok());
        assert!(validate(&[GroupDef::new("A", vec![0, 2])], 3).is_err());
        assert!(validate(&[GroupDef::new("A", vec![2, 3])], 3).is_err());
        assert!(validate(
            &[GroupDef::new("A", vec![0, 1]), GroupDef::new("B", vec![1])],
            3
        )
        .is_err());
    }
}
