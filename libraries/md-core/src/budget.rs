//! Budget calculator: remaining title storage and remaining recording time.

use crate::titles::{
    cells_for_length, compile_disc_titles, full_width_title_length, half_width_title_length,
    rounded_cost, truncate_full_width, truncate_half_width, CELL_SIZE, FULL_WIDTH_TITLE_LIMIT,
    TITLE_CELLS,
};
use crate::types::{Disc, Encoding, Group, Track, Wireformat, FRAMES_PER_SECOND};
use serde::{Deserialize, Serialize};

/// Title storage left on a disc, in half-width units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleBudget {
    pub half_width: usize,
    pub full_width: usize,
}

/// Recording time left, in seconds. Negative values mean the candidates do
/// not fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBudget {
    /// Seconds left when recording at the selected density
    pub at_density: f64,
    /// The same space expressed as normal-density seconds
    pub at_normal: f64,
}

/// A track the user intends to add
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleCandidate {
    pub title: String,
    pub full_width_title: String,
    pub duration_secs: f64,
}

impl TitleCandidate {
    pub fn new(title: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            title: title.into(),
            full_width_title: String::new(),
            duration_secs,
        }
    }
}

/// Title storage left on `disc`
pub fn remaining_characters(disc: &Disc) -> TitleBudget {
    let (half, full) = compile_disc_titles(disc);
    let mut used_half = cells_for_length(half_width_title_length(&half));
    let mut used_full = cells_for_length(full_width_title_length(&full));

    for track in disc.tracks() {
        used_half += cells_for_length(half_width_title_length(&track.title));
        used_full += cells_for_length(full_width_title_length(&track.full_width_title));
    }

    TitleBudget {
        half_width: TITLE_CELLS.saturating_sub(used_half) * CELL_SIZE,
        full_width: TITLE_CELLS.saturating_sub(used_full) * CELL_SIZE,
    }
}

/// Title storage that would be left once `candidates` were added as
/// ungrouped tracks. Works on a copy; `disc` is untouched.
pub fn remaining_characters_with(disc: &Disc, candidates: &[TitleCandidate]) -> TitleBudget {
    let mut tested = disc.clone();
    let next_index = tested.track_count();
    let added = candidates.iter().enumerate().map(|(i, c)| {
        Track::new(next_index + i, c.title.clone(), 0, Encoding::Sp)
            .with_full_width_title(c.full_width_title.clone())
    });

    match tested.groups.iter_mut().find(|g| g.is_ungrouped()) {
        Some(ungrouped) => ungrouped.tracks.extend(added),
        None => tested.groups.push(Group::ungrouped(added.collect())),
    }

    remaining_characters(&tested)
}

/// Recording time left after `candidates`, when recording at `format`
pub fn remaining_time(disc: &Disc, candidates: &[TitleCandidate], format: Wireformat) -> TimeBudget {
    let multiplier = format.multiplier() as f64;
    let left_secs = disc.left() as f64 / FRAMES_PER_SECOND as f64;
    let total: f64 = candidates.iter().map(|c| c.duration_secs).sum();

    TimeBudget {
        at_density: left_secs * multiplier - total,
        at_normal: left_secs - total / multiplier,
    }
}

/// Titles as they will actually be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedTitles {
    pub title: String,
    pub full_width_title: String,
}

/// Incremental title budget used while writing a batch of tracks.
///
/// Each admitted title is cut to what is left and its rounded cost is
/// deducted before the next one is considered, so earlier titles win.
#[derive(Debug, Clone)]
pub struct TitleAllowance {
    half_width: usize,
    full_width: usize,
    full_width_enabled: bool,
}

impl TitleAllowance {
    pub fn new(budget: TitleBudget, full_width_enabled: bool) -> Self {
        Self {
            half_width: budget.half_width,
            full_width: budget.full_width,
            full_width_enabled,
        }
    }

    /// Start from what is left on `disc`
    pub fn for_disc(disc: &Disc, full_width_enabled: bool) -> Self {
        Self::new(remaining_characters(disc), full_width_enabled)
    }

    /// What is left right now
    pub fn remaining(&self) -> TitleBudget {
        TitleBudget {
            half_width: self.half_width,
            full_width: self.full_width,
        }
    }

    /// Truncate a pair of titles to the remaining budget and charge for them.
    ///
    /// With full-width titles disabled the full-width title is dropped and
    /// the full-width budget is left alone.
    pub fn admit(&mut self, title: &str, full_width_title: &str) -> AdmittedTitles {
        let title = truncate_half_width(title, self.half_width);
        self.half_width = self
            .half_width
            .saturating_sub(rounded_cost(half_width_title_length(&title)));

        let full_width_title = if self.full_width_enabled {
            let limit = full_width_title_length(full_width_title)
                .min(self.full_width)
                .min(FULL_WIDTH_TITLE_LIMIT);
            let truncated = truncate_full_width(full_width_title, limit);
            self.full_width = self
                .full_width
                .saturating_sub(rounded_cost(full_width_title_length(&truncated)));
            truncated
        } else {
            String::new()
        };

        AdmittedTitles {
            title,
            full_width_title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_disc() -> Disc {
        Disc::new("", 80 * 60 * FRAMES_PER_SECOND)
    }

    fn budget(half_width: usize, full_width: usize) -> TitleBudget {
        TitleBudget {
            half_width,
            full_width,
        }
    }

    #[test]
    fn test_blank_disc_has_full_directory() {
        let b = remaining_characters(&empty_disc());
        assert_eq!(b.half_width, 1785);
        assert_eq!(b.full_width, 1785);
    }

    #[test]
    fn test_track_titles_consume_whole_cells() {
        let disc = empty_disc().with_groups(vec![Group::ungrouped(vec![Track::new(
            0,
            "12345678",
            512,
            Encoding::Sp,
        )])]);
        assert_eq!(remaining_characters(&disc).half_width, 1785 - 14);
    }

    #[test]
    fn test_group_names_are_charged_through_the_disc_title() {
        let t = Track::new(0, "", 512, Encoding::Sp);
        let disc = empty_disc().with_groups(vec![Group::named(1, "Album", vec![t])]);
        // "0;//1;Album//" is 13 units, two cells
        assert_eq!(remaining_characters(&disc).half_width, 1785 - 14);
    }

    #[test]
    fn test_candidates_do_not_touch_the_disc() {
        let disc = empty_disc();
        let candidates = vec![TitleCandidate::new("abcdefgh", 60.0)];
        let b = remaining_characters_with(&disc, &candidates);
        assert_eq!(b.half_width, 1785 - 14);
        assert_eq!(disc.track_count(), 0);
    }

    #[test]
    fn test_remaining_time_scales_with_density() {
        let disc = Disc::new("", 600 * FRAMES_PER_SECOND);
        let candidates = vec![TitleCandidate::new("a", 200.0)];

        let sp = remaining_time(&disc, &candidates, Wireformat::Sp);
        assert_eq!(sp.at_density, 400.0);
        assert_eq!(sp.at_normal, 400.0);

        let lp4 = remaining_time(&disc, &candidates, Wireformat::Lp4);
        assert_eq!(lp4.at_density, 2200.0);
        assert_eq!(lp4.at_normal, 550.0);
    }

    #[test]
    fn test_remaining_time_goes_negative_on_overflow() {
        let disc = Disc::new("", 60 * FRAMES_PER_SECOND);
        let b = remaining_time(&disc, &[TitleCandidate::new("a", 90.0)], Wireformat::Sp);
        assert!(b.at_density < 0.0);
    }

    #[test]
    fn test_allowance_is_order_dependent() {
        let mut allowance = TitleAllowance::new(budget(20, 0), false);

        let first = allowance.admit("abcdefgh", "");
        assert_eq!(first.title, "abcdefgh");
        assert_eq!(allowance.remaining().half_width, 6);

        let second = allowance.admit("ijklmnop", "");
        assert_eq!(second.title, "ijklmn");
        assert_eq!(allowance.remaining().half_width, 0);
    }

    #[test]
    fn test_allowance_exhaustion_saturates() {
        let mut allowance = TitleAllowance::new(budget(10, 0), false);

        assert_eq!(allowance.admit("abcdefgh", "").title, "abcdefgh");
        assert_eq!(allowance.remaining().half_width, 0);
        assert_eq!(allowance.admit("ijklmnop", "").title, "");
        assert_eq!(allowance.remaining().half_width, 0);
    }

    #[test]
    fn test_full_width_titles_are_capped_at_105_characters() {
        let mut allowance = TitleAllowance::new(budget(1785, 1785), true);
        let long: String = std::iter::repeat('あ').take(150).collect();

        let admitted = allowance.admit("a", &long);
        assert_eq!(admitted.full_width_title.chars().count(), 105);
        assert_eq!(allowance.remaining().full_width, 1785 - 210);
    }

    #[test]
    fn test_full_width_dropped_when_disabled() {
        let mut allowance = TitleAllowance::new(budget(100, 100), false);
        let admitted = allowance.admit("a", "ａ");
        assert!(admitted.full_width_title.is_empty());
        assert_eq!(allowance.remaining().full_width, 100);
    }
}
