/// Collaborator traits at the edges of the system
use crate::error::Result;
use crate::types::{
    Capability, DeviceStatus, Disc, Group, ReadProgress, SeekTime, TrackPosition, Wireformat,
    WriteProgress,
};
use async_trait::async_trait;
use std::path::Path;

/// Progress callback handed to long device transfers
pub type ProgressFn<'a, T> = dyn FnMut(T) + Send + 'a;

/// Device transport service
///
/// The only way the rest of the system reaches a recorder. Implementations
/// own the wire protocol; callers serialize access through
/// `md_transport::TransportHandle`, so methods take `&mut self`.
///
/// Every method fails with a human-readable reason. A listing that the
/// device refuses outright should fail with a message starting with
/// `Rejected`.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Name reported by the connected device
    async fn device_name(&mut self) -> Result<String>;

    /// Features the device supports
    async fn capabilities(&mut self) -> Result<Vec<Capability>>;

    /// Read the full content directory
    async fn list_content(&mut self) -> Result<Disc>;

    /// Current transport state
    async fn device_status(&mut self) -> Result<DeviceStatus>;

    // === Writing ===

    /// Put the device into recording mode ahead of a batch of uploads
    async fn prepare_upload(&mut self) -> Result<()>;

    /// Write one track at the end of the disc.
    ///
    /// # Errors
    /// Fails if title storage is exhausted, the disc is full or the device
    /// refuses the data.
    async fn upload(
        &mut self,
        title: &str,
        full_width_title: &str,
        data: Vec<u8>,
        format: Wireformat,
        on_progress: &mut ProgressFn<'_, WriteProgress>,
    ) -> Result<()>;

    /// Leave recording mode
    async fn finalize_upload(&mut self) -> Result<()>;

    /// Read one track back
    async fn download(
        &mut self,
        index: usize,
        on_progress: &mut ProgressFn<'_, ReadProgress>,
    ) -> Result<Vec<u8>>;

    // === Structure ===

    /// Move a track to a new physical position. With `update_groups` the
    /// device recomputes group ranges itself.
    async fn move_track(&mut self, src: usize, dst: usize, update_groups: bool) -> Result<()>;

    /// Replace every group definition with `groups`
    async fn rewrite_groups(&mut self, groups: &[Group]) -> Result<()>;

    /// Create a named group over `length` tracks starting at `begin`
    async fn add_group(&mut self, begin: usize, length: usize, name: &str) -> Result<()>;

    /// Delete a named group; its tracks become ungrouped
    async fn delete_group(&mut self, index: usize) -> Result<()>;

    /// Delete tracks by physical index
    async fn delete_tracks(&mut self, indexes: &[usize]) -> Result<()>;

    /// Erase every track
    async fn wipe_disc(&mut self) -> Result<()>;

    /// Erase every title and group while keeping the audio
    async fn wipe_disc_title_info(&mut self) -> Result<()>;

    // === Metadata ===

    /// Rename a named group
    async fn rename_group(
        &mut self,
        index: usize,
        title: &str,
        full_width_title: Option<&str>,
    ) -> Result<()>;

    /// Rename a track
    async fn rename_track(
        &mut self,
        index: usize,
        title: &str,
        full_width_title: Option<&str>,
    ) -> Result<()>;

    /// Rename the disc
    async fn rename_disc(&mut self, title: &str, full_width_title: Option<&str>) -> Result<()>;

    // === Playback ===

    /// Eject the loaded disc
    async fn eject_disc(&mut self) -> Result<()>;

    async fn play(&mut self) -> Result<()>;

    async fn pause(&mut self) -> Result<()>;

    async fn stop(&mut self) -> Result<()>;

    /// Skip to the next track. May be refused by devices without the command.
    async fn next(&mut self) -> Result<()>;

    /// Skip to the previous track. May be refused by devices without the
    /// command.
    async fn previous(&mut self) -> Result<()>;

    async fn goto_track(&mut self, index: usize) -> Result<()>;

    async fn goto_time(&mut self, index: usize, time: SeekTime) -> Result<()>;

    /// Absolute playback position, `None` when nothing is loaded
    async fn position(&mut self) -> Result<Option<TrackPosition>>;
}

/// Audio export service
///
/// Converts a source file into the bytes the device expects for a given
/// format. Conversion is CPU-bound and may take seconds per track.
#[async_trait]
pub trait AudioExport: Send {
    /// Load a source file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded
    async fn prepare(&mut self, source: &Path) -> Result<()>;

    /// Produce device-ready data for the prepared source
    ///
    /// # Errors
    /// Returns an error if nothing was prepared or encoding fails
    async fn export(&mut self, format: Wireformat) -> Result<Vec<u8>>;
}
