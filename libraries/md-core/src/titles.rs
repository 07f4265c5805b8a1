//! Title encoding rules shared by the budget calculator, the editor and the
//! reference device.
//!
//! Half-width titles are measured in *units*: one per ASCII or half-width
//! katakana character, two for anything that needs a double-byte code.
//! Full-width titles always cost two units per character. Storage is handed
//! out in cells of [`CELL_SIZE`] units.

use crate::types::Disc;

/// Units per directory cell
pub const CELL_SIZE: usize = 7;

/// Cells available for each of the half-width and full-width title areas
pub const TITLE_CELLS: usize = 255;

/// Longest full-width title the device accepts, in units (105 characters)
pub const FULL_WIDTH_TITLE_LIMIT: usize = 210;

const FULL_WIDTH_OFFSET: u32 = 0xFEE0;
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

fn is_half_width_katakana(c: char) -> bool {
    ('\u{FF61}'..='\u{FF9F}').contains(&c)
}

fn char_units(c: char) -> usize {
    if c.is_ascii() || is_half_width_katakana(c) {
        1
    } else {
        2
    }
}

/// Length of a half-width title in units
pub fn half_width_title_length(title: &str) -> usize {
    title.chars().map(char_units).sum()
}

/// Length of a full-width title in units
pub fn full_width_title_length(title: &str) -> usize {
    title.chars().count() * 2
}

/// Longest prefix of `title` that fits in `max_units` half-width units
pub fn truncate_half_width(title: &str, max_units: usize) -> String {
    let mut used = 0;
    title
        .chars()
        .take_while(|c| {
            used += char_units(*c);
            used <= max_units
        })
        .collect()
}

/// Longest prefix of `title` that fits in `max_units` full-width units
pub fn truncate_full_width(title: &str, max_units: usize) -> String {
    title.chars().take(max_units / 2).collect()
}

/// Number of cells a title of `units` length occupies in the directory
pub fn cells_for_length(units: usize) -> usize {
    units.div_ceil(CELL_SIZE)
}

/// Units deducted from a budget when a new title of `units` length is
/// written. Every written title takes at least one cell, even when empty.
pub fn rounded_cost(units: usize) -> usize {
    cells_for_length(units).max(1) * CELL_SIZE
}

fn fold_latin(c: char) -> Option<char> {
    let folded = match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}

/// Fold a title into the half-width character set.
///
/// Full-width ASCII forms become ASCII, the ideographic space becomes a
/// space, accented Latin letters lose their accents, control characters
/// become spaces and anything else unencodable becomes `?`.
pub fn sanitize_half_width_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            IDEOGRAPHIC_SPACE => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - FULL_WIDTH_OFFSET).unwrap_or('?'),
            c if c.is_ascii_control() => ' ',
            c if c.is_ascii() || is_half_width_katakana(c) => c,
            c => fold_latin(c).unwrap_or('?'),
        })
        .collect()
}

/// Fold a title into the full-width character set
pub fn sanitize_full_width_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            ' ' => IDEOGRAPHIC_SPACE,
            '!'..='~' => char::from_u32(c as u32 + FULL_WIDTH_OFFSET).unwrap_or(c),
            c => c,
        })
        .collect()
}

/// Remove sequences the device would read as group delimiters
pub fn strip_group_delimiters(title: &str) -> String {
    title.replace("//", " /").replace("／／", "／")
}

/// Build the raw half-width and full-width disc titles the device stores.
///
/// Without named groups the disc title is stored as is. With groups it
/// becomes `0;Disc//1-3;Group//...`, using 1-based track numbers.
pub fn compile_disc_titles(disc: &Disc) -> (String, String) {
    let mut groups: Vec<_> = disc
        .named_groups()
        .filter_map(|g| Some((g.first_index()?, g.last_index()?, g)))
        .collect();
    if groups.is_empty() {
        return (disc.title.clone(), disc.full_width_title.clone());
    }
    groups.sort_by_key(|(first, _, _)| *first);

    let mut half = format!("0;{}//", disc.title);
    let mut full = if disc.full_width_title.is_empty() {
        String::new()
    } else {
        format!("０；{}／／", disc.full_width_title)
    };

    for (first, last, group) in groups {
        let range = if last > first {
            format!("{}-{}", first + 1, last + 1)
        } else {
            format!("{}", first + 1)
        };
        half.push_str(&format!(
            "{};{}//",
            range,
            group.title.as_deref().unwrap_or_default()
        ));
        if let Some(fw) = group.full_width_title.as_deref().filter(|t| !t.is_empty()) {
            full.push_str(&format!(
                "{}；{}／／",
                sanitize_full_width_title(&range),
                fw
            ));
        }
    }

    (half, full)
}
