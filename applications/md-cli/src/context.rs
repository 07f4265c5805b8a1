//! Service context for one CLI invocation.
//!
//! Built when the command connects to the device and dropped when it exits.
//! Holds the transport, the editor on top of it and the upload
//! collaborators.

use crate::config::CliConfig;
use crate::error::Result;
use crate::export::CommandExporter;
use crate::interact::ConsoleNotifier;
use md_core::{AudioExport, Wireformat};
use md_editor::{Confirm, DiscEditor, EditorSettings};
use md_transport::{MockDevice, TransportHandle};
use md_upload::{NoWakeLock, SharedExporter, UploadSequencer};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub struct AppContext {
    pub config: CliConfig,
    pub device: MockDevice,
    pub editor: Arc<DiscEditor>,
    pub exporter: SharedExporter,
    pub confirm: Arc<dyn Confirm>,
}

impl AppContext {
    /// Open the persisted device and read its contents
    pub async fn connect(config: CliConfig, confirm: Arc<dyn Confirm>) -> Result<Self> {
        let device = MockDevice::open(&config.device.state_file).await?;
        let exporter = CommandExporter::new(
            config.export.ffmpeg_path.clone(),
            config.export.atracdenc_path.clone(),
        );
        Self::with_parts(config, device, confirm, Box::new(exporter)).await
    }

    /// Build around an already opened device and a chosen exporter
    pub async fn with_parts(
        config: CliConfig,
        device: MockDevice,
        confirm: Arc<dyn Confirm>,
        exporter: Box<dyn AudioExport>,
    ) -> Result<Self> {
        let handle = TransportHandle::new(device.clone());
        let editor = DiscEditor::new(handle, Arc::clone(&confirm)).with_settings(EditorSettings {
            control_settle: config.settle(),
        });
        let snapshot = editor.reload().await?;
        info!(
            "Connected to {} ({})",
            snapshot.device_name,
            if snapshot.disc.is_some() { "disc loaded" } else { "no disc" }
        );

        Ok(Self {
            config,
            device,
            editor: Arc::new(editor),
            exporter: Arc::new(Mutex::new(exporter)),
            confirm,
        })
    }

    /// Upload sequencer sharing this context's editor and exporter
    pub fn sequencer(&self, format: Option<Wireformat>) -> UploadSequencer {
        let settings = self.config.upload_settings(format);
        UploadSequencer::new(Arc::clone(&self.editor), Arc::clone(&self.exporter), settings)
            .with_hooks(Arc::new(NoWakeLock), Arc::new(ConsoleNotifier))
    }

    /// Save the device state and drop the context
    pub async fn close(self) -> Result<()> {
        self.device.persist().await?;
        Ok(())
    }
}
