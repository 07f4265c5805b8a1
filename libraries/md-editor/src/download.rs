//! Reading tracks back from the device
use crate::editor::DiscEditor;
use md_core::{Encoding, MdError, ReadProgress, Result, Track};
use tracing::{info, warn};

/// One track read back from the disc
#[derive(Debug, Clone)]
pub struct DownloadedTrack {
    pub index: usize,
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Outcome of a batch download. Failed tracks do not stop the batch.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub files: Vec<DownloadedTrack>,
    pub failures: Vec<(usize, String)>,
}

/// File name for a downloaded track: `"3. Title (Full width).aea"`.
///
/// LP tracks come back as WAV-wrapped ATRAC3, SP tracks as raw AEA.
pub fn download_file_name(track: &Track) -> String {
    let number = track.index + 1;
    let name = match (track.title.is_empty(), track.full_width_title.is_empty()) {
        (false, false) => format!("{}. {} ({})", number, track.title, track.full_width_title),
        (false, true) => format!("{}. {}", number, track.title),
        (true, false) => format!("{}. {}", number, track.full_width_title),
        (true, true) => format!("Track {}", number),
    };
    let name = safe_file_stem(&name);
    let extension = match track.encoding {
        Encoding::Lp2 | Encoding::Lp4 => "wav",
        Encoding::Sp => "aea",
    };
    format!("{}.{}", name, extension)
}

/// Path separators and control characters become `_`; leading dots are dropped
fn safe_file_stem(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_start_matches(['.', ' ']);
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

impl DiscEditor {
    /// Read tracks back in disc order.
    ///
    /// `on_progress` receives the track index with each progress report.
    pub async fn download_tracks(
        &self,
        indexes: &[usize],
        on_progress: &mut (dyn FnMut(usize, ReadProgress) + Send),
    ) -> Result<DownloadReport> {
        let disc = self
            .snapshot()
            .disc
            .ok_or_else(|| MdError::precondition("No disc loaded"))?;

        let mut wanted = indexes.to_vec();
        wanted.sort_unstable();
        wanted.dedup();

        let mut report = DownloadReport::default();
        let mut device = self.transport.acquire().await;

        for index in wanted {
            let Some(track) = disc.track(index) else {
                report.failures.push((index, format!("No track {}", index)));
                continue;
            };

            match device
                .download(index, &mut |p| on_progress(index, p))
                .await
            {
                Ok(data) => {
                    let file_name = download_file_name(track);
                    info!("Downloaded track {} as '{}'", index, file_name);
                    report.files.push(DownloadedTrack {
                        index,
                        file_name,
                        data,
                    });
                }
                Err(e) => {
                    warn!("Download of track {} failed: {}", index, e);
                    report.failures.push((index, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let sp = Track::new(2, "Song", 512, Encoding::Sp);
        assert_eq!(download_file_name(&sp), "3. Song.aea");

        let lp = Track::new(0, "Song", 512, Encoding::Lp2).with_full_width_title("ソング");
        assert_eq!(download_file_name(&lp), "1. Song (ソング).wav");

        let untitled = Track::new(4, "", 512, Encoding::Lp4);
        assert_eq!(download_file_name(&untitled), "Track 5.wav");

        let fw_only = Track::new(0, "", 512, Encoding::Sp).with_full_width_title("ソング");
        assert_eq!(download_file_name(&fw_only), "1. ソング.aea");
    }

    #[test]
    fn test_file_names_stay_inside_the_output_directory() {
        let slash = Track::new(1, "AC/DC", 512, Encoding::Sp);
        assert_eq!(download_file_name(&slash), "2. AC_DC.aea");

        let climbing = Track::new(0, "../../escaped", 512, Encoding::Lp2);
        let name = download_file_name(&climbing);
        assert_eq!(name, "1. .._.._escaped.wav");
        assert!(!name.contains('/'));

        assert_eq!(safe_file_stem("..hidden"), "hidden");
        assert_eq!(safe_file_stem(".."), "_");
        assert_eq!(safe_file_stem("a\\b:c"), "a_b_c");
    }
}
