/// Upload session types
use md_core::{WriteProgress, Wireformat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a source file becomes device data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// Convert with the session format
    Encode,
    /// Already device-native; strip the container header and send as is
    PreEncoded {
        format: Wireformat,
        bytes_to_skip: usize,
    },
}

/// One file to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub source: PathBuf,
    pub title: String,
    pub full_width_title: String,
    pub kind: SourceKind,
}

impl UploadItem {
    /// An item converted with the session format
    pub fn encode(source: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            full_width_title: String::new(),
            kind: SourceKind::Encode,
        }
    }

    #[must_use]
    pub fn with_full_width_title(mut self, title: impl Into<String>) -> Self {
        self.full_width_title = title.into();
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Display name for messages
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// Session options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Format for items that need conversion
    pub format: Wireformat,
    pub full_width_titles: bool,
    pub notify_when_finished: bool,
    /// Converted items allowed to wait for the device
    pub lookahead: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            format: Wireformat::Sp,
            full_width_titles: false,
            notify_when_finished: false,
            lookahead: 1,
        }
    }
}

/// Sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadPhase {
    Idle,
    Preparing,
    Writing(usize),
    Cancelled,
    Aborted,
    Finalizing,
}

/// Progress reported while a session runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UploadEvent {
    Phase(UploadPhase),
    Started { total: usize },
    /// Waiting for item `index` to finish converting
    Converting { index: usize },
    TrackStarted { index: usize, title: String },
    WriteProgress { index: usize, progress: WriteProgress },
    TrackWritten { index: usize },
    /// The session aborted; sent once
    Failed { message: String },
    Finished { outcome: UploadOutcome },
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UploadOutcome {
    Completed,
    Cancelled,
    /// `failed_index` is the item being converted or written when the
    /// session failed, `None` when the failure happened outside any item
    Aborted {
        failed_index: Option<usize>,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub outcome: UploadOutcome,
    pub written: usize,
    pub total: usize,
}
