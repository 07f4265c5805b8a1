//! Playback controls.
//!
//! After every command the editor gives the device a moment to settle, then
//! reads the transport state back into the snapshot. A failed status read
//! is only logged.

use crate::editor::DiscEditor;
use md_core::{DeviceTransport, Disc, Result, SeekTime};
use tracing::{debug, warn};

/// Direction of a manual track step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Forward,
    Back,
}

impl DiscEditor {
    pub async fn play(&self) -> Result<()> {
        let mut device = self.transport.acquire().await;
        device.play().await?;
        self.settle(&mut **device).await;
        Ok(())
    }

    pub async fn pause(&self) -> Result<()> {
        let mut device = self.transport.acquire().await;
        device.pause().await?;
        self.settle(&mut **device).await;
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        let mut device = self.transport.acquire().await;
        device.stop().await?;
        self.settle(&mut **device).await;
        Ok(())
    }

    /// Skip forward. Units without a skip command are driven by
    /// stop, goto and play instead.
    pub async fn next(&self) -> Result<()> {
        let mut device = self.transport.acquire().await;
        if let Err(e) = device.next().await {
            debug!("Next refused ({}), stepping manually", e);
            if !self.step(&mut **device, Step::Forward).await? {
                return Ok(());
            }
        }
        self.settle(&mut **device).await;
        Ok(())
    }

    /// Skip back, with the same fallback as [`DiscEditor::next`]
    pub async fn previous(&self) -> Result<()> {
        let mut device = self.transport.acquire().await;
        if let Err(e) = device.previous().await {
            debug!("Previous refused ({}), stepping manually", e);
            if !self.step(&mut **device, Step::Back).await? {
                return Ok(());
            }
        }
        self.settle(&mut **device).await;
        Ok(())
    }

    pub async fn goto_track(&self, index: usize) -> Result<()> {
        let mut device = self.transport.acquire().await;
        device.goto_track(index).await?;
        self.settle(&mut **device).await;
        Ok(())
    }

    /// Jump to `seconds` into track `index`
    pub async fn seek(&self, index: usize, seconds: f64) -> Result<()> {
        let time = SeekTime::from_seconds(seconds);
        let mut device = self.transport.acquire().await;
        device.goto_time(index, time).await?;
        self.settle(&mut **device).await;
        Ok(())
    }

    /// Step one track by hand. Returns false when already at the end of
    /// the disc in that direction, or the current track is unknown.
    async fn step(&self, device: &mut dyn DeviceTransport, step: Step) -> Result<bool> {
        let (current, count) = {
            let snapshot = self.snapshot.borrow();
            (
                snapshot.status.as_ref().and_then(|s| s.track),
                snapshot.disc.as_ref().map_or(0, Disc::track_count),
            )
        };

        let target = match (current, step) {
            (Some(track), Step::Forward) if track + 1 < count => track + 1,
            (Some(track), Step::Back) if track > 0 => track - 1,
            _ => return Ok(false),
        };

        device.stop().await?;
        device.goto_track(target).await?;
        device.play().await?;
        Ok(true)
    }

    async fn settle(&self, device: &mut dyn DeviceTransport) {
        tokio::time::sleep(self.settings.control_settle).await;
        match device.device_status().await {
            Ok(status) => {
                self.snapshot.send_modify(|s| s.status = Some(status));
            }
            Err(e) => warn!("Cannot get device status: {}", e),
        }
    }
}
