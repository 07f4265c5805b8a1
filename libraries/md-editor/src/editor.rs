//! The disc editor: content actions against a live device.

use crate::confirm::Confirm;
use crate::reorder::{delete_order, plan_drag_drop, plan_group_tracks, ListPosition};
use md_core::titles::strip_group_delimiters;
use md_core::{Capability, DeviceStatus, DeviceTransport, Disc, MdError, Result};
use md_transport::TransportHandle;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

const CORRUPTED_TITLE_PROMPT: &str =
    "This disc's title seems to be corrupted, do you wish to erase it?\nNone of the tracks will be deleted.";

/// Everything known about the connected device after the last reload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    /// Disc contents, `None` when no readable disc is loaded
    pub disc: Option<Disc>,
    /// Transport state, `None` when the device did not answer
    pub status: Option<DeviceStatus>,
    pub device_name: String,
    pub capabilities: Vec<Capability>,
}

/// Editor tuning
#[derive(Debug, Clone)]
pub struct EditorSettings {
    /// Wait after a playback command before reading the status back
    pub control_settle: Duration,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            control_settle: Duration::from_millis(500),
        }
    }
}

/// Content actions on the connected device.
///
/// Each action takes the transport once, issues its commands and finishes
/// with a reload, whether the commands succeeded or not. Subscribers see
/// the reloaded [`DeviceSnapshot`].
pub struct DiscEditor {
    pub(crate) transport: TransportHandle,
    pub(crate) snapshot: watch::Sender<DeviceSnapshot>,
    pub(crate) confirm: Arc<dyn Confirm>,
    pub(crate) settings: EditorSettings,
}

impl DiscEditor {
    pub fn new(transport: TransportHandle, confirm: Arc<dyn Confirm>) -> Self {
        let (snapshot, _) = watch::channel(DeviceSnapshot::default());
        Self {
            transport,
            snapshot,
            confirm,
            settings: EditorSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: EditorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn transport(&self) -> &TransportHandle {
        &self.transport
    }

    /// Follow snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<DeviceSnapshot> {
        self.snapshot.subscribe()
    }

    /// The last published snapshot
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Re-read everything from the device
    pub async fn reload(&self) -> Result<DeviceSnapshot> {
        let mut device = self.transport.acquire().await;
        self.reload_with(&mut **device).await
    }

    /// Re-read everything through a transport the caller already holds
    pub async fn reload_with(&self, device: &mut dyn DeviceTransport) -> Result<DeviceSnapshot> {
        let status = match device.device_status().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("Cannot get device status: {}", e);
                None
            }
        };
        let device_name = device.device_name().await?;
        let capabilities = device.capabilities().await?;

        let disc = if status.as_ref().is_some_and(|s| s.disc_present) {
            self.read_disc(device).await?
        } else {
            None
        };

        let snapshot = DeviceSnapshot {
            disc,
            status,
            device_name,
            capabilities,
        };
        debug!(
            "Reloaded: {} tracks",
            snapshot.disc.as_ref().map_or(0, Disc::track_count)
        );
        self.snapshot.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    async fn read_disc(&self, device: &mut dyn DeviceTransport) -> Result<Option<Disc>> {
        match device.list_content().await {
            Ok(disc) => Ok(Some(disc)),
            Err(e) if e.is_rejection() => {
                warn!("Device refused the listing: {}", e);
                Ok(None)
            }
            Err(e) => {
                error!("Cannot read the disc directory: {}", e);
                if !self.confirm.confirm(CORRUPTED_TITLE_PROMPT).await {
                    return Err(e);
                }
                warn!("Erasing title information to recover the directory");
                device.wipe_disc_title_info().await?;
                Ok(Some(device.list_content().await?))
            }
        }
    }

    /// Reload after an action and report the action's own error first
    async fn finish(
        &self,
        device: &mut dyn DeviceTransport,
        action: &str,
        result: Result<()>,
    ) -> Result<()> {
        match &result {
            Ok(()) => info!("{} done", action),
            Err(e) => error!("{} failed: {}", action, e),
        }
        let reloaded = self.reload_with(device).await;
        result?;
        reloaded.map(|_| ())
    }

    /// Move one track; the device keeps groups in step
    pub async fn move_track(&self, src: usize, dst: usize) -> Result<()> {
        let mut device = self.transport.acquire().await;
        let result = device.move_track(src, dst, true).await;
        self.finish(&mut **device, "Move track", result).await
    }

    /// Drag a track between rows of the grouped view.
    ///
    /// A drop on the source position returns without touching the device.
    pub async fn drag_drop_track(&self, source: ListPosition, target: ListPosition) -> Result<()> {
        if source == target {
            return Ok(());
        }

        let mut device = self.transport.acquire().await;
        let disc = device.list_content().await?;
        let Some(plan) = plan_drag_drop(&disc, source, target)? else {
            return Ok(());
        };

        let result = async {
            if let Some((from, to)) = plan.track_move {
                device.move_track(from, to, false).await?;
            }
            device.rewrite_groups(&plan.groups).await
        }
        .await;
        self.finish(&mut **device, "Drag track", result).await
    }

    /// Put the selected ungrouped tracks into a new group
    pub async fn group_tracks(&self, selection: &[usize], name: &str) -> Result<()> {
        let mut device = self.transport.acquire().await;
        let disc = device.list_content().await?;
        let range = plan_group_tracks(&disc, selection)?;

        let result = device.add_group(range.begin, range.length, name).await;
        self.finish(&mut **device, "Group tracks", result).await
    }

    /// Delete one group, leaving its tracks ungrouped
    pub async fn delete_group(&self, index: usize) -> Result<()> {
        self.delete_groups(&[index]).await
    }

    /// Delete several groups, highest index first
    pub async fn delete_groups(&self, ids: &[usize]) -> Result<()> {
        let mut device = self.transport.acquire().await;
        let result = async {
            for id in delete_order(ids) {
                device.delete_group(id).await?;
            }
            Ok::<(), MdError>(())
        }
        .await;
        self.finish(&mut **device, "Delete groups", result).await
    }

    pub async fn rename_group(
        &self,
        index: usize,
        title: &str,
        full_width_title: Option<&str>,
    ) -> Result<()> {
        let mut device = self.transport.acquire().await;
        let result = device.rename_group(index, title, full_width_title).await;
        self.finish(&mut **device, "Rename group", result).await
    }

    pub async fn rename_track(
        &self,
        index: usize,
        title: &str,
        full_width_title: Option<&str>,
    ) -> Result<()> {
        let title = strip_group_delimiters(title);
        let full_width_title = full_width_title.map(strip_group_delimiters);

        let mut device = self.transport.acquire().await;
        let result = device
            .rename_track(index, &title, full_width_title.as_deref())
            .await;
        self.finish(&mut **device, "Rename track", result).await
    }

    pub async fn rename_disc(&self, title: &str, full_width_title: Option<&str>) -> Result<()> {
        let title = strip_group_delimiters(title);
        let full_width_title = full_width_title.map(strip_group_delimiters);

        let mut device = self.transport.acquire().await;
        let result = device
            .rename_disc(&title, full_width_title.as_deref())
            .await;
        self.finish(&mut **device, "Rename disc", result).await
    }

    pub async fn delete_tracks(&self, indexes: &[usize]) -> Result<()> {
        let mut device = self.transport.acquire().await;
        let result = device.delete_tracks(indexes).await;
        self.finish(&mut **device, "Delete tracks", result).await
    }

    pub async fn wipe_disc(&self) -> Result<()> {
        let mut device = self.transport.acquire().await;
        let result = device.wipe_disc().await;
        self.finish(&mut **device, "Wipe disc", result).await
    }

    /// Eject and forget the local disc
    pub async fn eject_disc(&self) -> Result<()> {
        let mut device = self.transport.acquire().await;
        device.eject_disc().await?;
        info!("Disc ejected");

        let status = device.device_status().await.ok();
        self.snapshot.send_modify(|s| {
            s.disc = None;
            s.status = status;
        });
        Ok(())
    }
}
