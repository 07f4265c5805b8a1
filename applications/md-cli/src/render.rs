//! Plain-text rendering of device state

use md_core::budget::{remaining_characters, remaining_time};
use md_core::views::grouped_tracks;
use md_core::{DeviceStatus, Disc, Track, Wireformat, FRAMES_PER_SECOND};
use md_editor::DeviceSnapshot;
use std::fmt::Write;

/// `m:ss`, or `h:mm:ss` from an hour up
pub fn format_seconds(seconds: f64) -> String {
    let negative = seconds < 0.0;
    let total = seconds.abs().round() as u64;
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    let sign = if negative { "-" } else { "" };
    if h > 0 {
        format!("{}{}:{:02}:{:02}", sign, h, m, s)
    } else {
        format!("{}{}:{:02}", sign, m, s)
    }
}

pub fn format_frames(frames: u64) -> String {
    format_seconds(frames as f64 / FRAMES_PER_SECOND as f64)
}

fn track_line(track: &Track) -> String {
    let mut line = format!(
        "  {:>3}  {:<6} {:>8}  {}",
        track.index,
        track.encoding.as_str(),
        format_frames(track.duration),
        if track.title.is_empty() { "(untitled)" } else { track.title.as_str() }
    );
    if !track.full_width_title.is_empty() {
        let _ = write!(line, " / {}", track.full_width_title);
    }
    if track.protected {
        line.push_str(" [protected]");
    }
    line
}

/// Grouped listing with budgets for `format`
pub fn render_disc(disc: &Disc, format: Wireformat) -> String {
    let mut out = String::new();
    let title = if disc.title.is_empty() { "(untitled disc)" } else { disc.title.as_str() };
    let _ = writeln!(out, "Disc: {}", title);
    if !disc.full_width_title.is_empty() {
        let _ = writeln!(out, "      {}", disc.full_width_title);
    }

    for group in grouped_tracks(disc) {
        match &group.title {
            Some(name) => {
                let _ = writeln!(out, "[{}] {}", group.index, name);
            }
            None if group.tracks.is_empty() => continue,
            None => {
                let _ = writeln!(out, "(ungrouped)");
            }
        }
        for track in &group.tracks {
            let _ = writeln!(out, "{}", track_line(track));
        }
    }

    let chars = remaining_characters(disc);
    let time = remaining_time(disc, &[], format);
    let _ = writeln!(
        out,
        "{} tracks, {} used, {} free ({} at {})",
        disc.track_count(),
        format_frames(disc.used()),
        format_frames(disc.left()),
        format_seconds(time.at_density),
        format
    );
    let _ = write!(
        out,
        "Title space: {} half-width, {} full-width characters",
        chars.half_width, chars.full_width
    );
    if disc.write_protected {
        out.push_str("\nWrite protected");
    }
    out
}

pub fn render_status(status: &DeviceStatus) -> String {
    let mut out = format!("State: {:?}", status.state);
    if let Some(track) = status.track {
        let _ = write!(out, ", track {}", track);
    }
    if let Some(time) = status.time {
        let _ = write!(out, " at {}:{:02}", time.minute, time.second);
    }
    if !status.disc_present {
        out.push_str(" (no disc)");
    }
    out
}

pub fn render_snapshot(snapshot: &DeviceSnapshot, format: Wireformat) -> String {
    let mut out = format!("Device: {}\n", snapshot.device_name);
    match &snapshot.status {
        Some(status) => {
            let _ = writeln!(out, "{}", render_status(status));
        }
        None => out.push_str("State: unavailable\n"),
    }
    match &snapshot.disc {
        Some(disc) => out.push_str(&render_disc(disc, format)),
        None => out.push_str("No disc"),
    }
    out
}
