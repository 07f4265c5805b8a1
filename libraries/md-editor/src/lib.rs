//! Disc editing
//!
//! Content actions on a connected device: reordering, grouping, renaming,
//! deletion, playback control, track download and a destructive self-test.
//! Every action talks to the device through a
//! [`TransportHandle`](md_transport::TransportHandle) and ends with a full
//! reload, so the published [`DeviceSnapshot`] always mirrors what the
//! device reports.

pub mod confirm;
pub mod download;
pub mod editor;
pub mod playback;
pub mod reorder;

pub use confirm::{Confirm, FixedAnswer};
pub use download::{download_file_name, DownloadReport, DownloadedTrack};
pub use editor::{DeviceSnapshot, DiscEditor, EditorSettings};
pub use self_test::{SelfTestFailure, SelfTestReport, SelfTestStep};
pub use reorder::{delete_order, plan_drag_drop, plan_group_tracks, DragDropPlan, GroupRange, ListPosition};
