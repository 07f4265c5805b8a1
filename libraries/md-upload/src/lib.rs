//! Conversion and upload
//!
//! Writes a batch of audio files to the disc. Conversion of the next file
//! overlaps with the device write of the current one; device writes stay
//! strictly sequential and each title is fitted into what is left of the
//! directory before it is written.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example(sequencer: md_upload::UploadSequencer, items: Vec<md_upload::UploadItem>) {
//! let mut session = sequencer.start(items);
//! while let Some(event) = session.events.recv().await {
//!     println!("{:?}", event);
//! }
//! let summary = session.handle.await.unwrap().unwrap();
//! println!("{} of {} tracks written", summary.written, summary.total);
//! # }
//! ```

pub mod error;
pub mod hooks;
pub mod pipeline;
pub mod sequencer;
pub mod source;
pub mod types;

pub use error::{Result, UploadError};
pub use hooks::{NoNotifier, NoWakeLock, Notifier, WakeLock};
pub use pipeline::{ConversionPipeline, Converted, SharedExporter};
pub use sequencer::{UploadSequencer, UploadSession};
pub use source::{detect_source, probe_source};
pub use types::{
    SourceKind, UploadEvent, UploadItem, UploadOutcome, UploadPhase, UploadSettings, UploadSummary,
};
