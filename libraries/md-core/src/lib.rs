//! Disc Deck Core
//!
//! Device-agnostic content model, title rules, budget arithmetic and the
//! collaborator traits shared by every other crate in the workspace.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Group`, `Disc`, `DeviceStatus`, `Wireformat`
//! - **Views**: `sorted_tracks` and `grouped_tracks` projections of a `Disc`
//! - **Budgets**: remaining title storage and recording time
//! - **Core Traits**: `DeviceTransport`, `AudioExport`
//! - **Error Handling**: Unified `MdError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use md_core::types::{Disc, Encoding, Group, Track};
//! use md_core::views::grouped_tracks;
//!
//! let disc = Disc::new("Road Trip", 80 * 60 * 512).with_groups(vec![Group::ungrouped(vec![
//!     Track::new(0, "Intro", 3 * 60 * 512, Encoding::Sp),
//! ])]);
//!
//! assert_eq!(disc.track_count(), 1);
//! assert_eq!(grouped_tracks(&disc).len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod budget;
pub mod error;
pub mod titles;
pub mod traits;
pub mod types;
pub mod views;

// Re-export commonly used types
pub use budget::{AdmittedTitles, TimeBudget, TitleAllowance, TitleBudget, TitleCandidate};
pub use error::{MdError, Result};
pub use traits::{AudioExport, DeviceTransport, ProgressFn};
pub use types::{
    Capability, Channels, DeviceStatus, Disc, DiscTime, Encoding, Group, PlaybackState,
    ReadProgress, SeekTime, Track, TrackPosition, Wireformat, WriteProgress, FRAMES_PER_SECOND,
    UNGROUPED_INDEX,
};
