#![allow(dead_code)]

use async_trait::async_trait;
use md_cli::{AppContext, CliConfig};
use md_core::{AudioExport, MdError, Wireformat};
use md_editor::FixedAnswer;
use md_transport::MockDevice;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tempfile::TempDir;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Quarter of a second of silence for every prepared file
#[derive(Default)]
pub struct SilenceExporter {
    prepared: Option<PathBuf>,
}

#[async_trait]
impl AudioExport for SilenceExporter {
    async fn prepare(&mut self, source: &Path) -> md_core::Result<()> {
        self.prepared = Some(source.to_path_buf());
        Ok(())
    }

    async fn export(&mut self, format: Wireformat) -> md_core::Result<Vec<u8>> {
        self.prepared
            .take()
            .ok_or_else(|| MdError::export("nothing prepared"))?;
        Ok(vec![0; format.bytes_per_second() as usize / 4])
    }
}

/// A workspace holding a demo device state file
pub struct Workspace {
    pub dir: TempDir,
    pub config: CliConfig,
}

impl Workspace {
    pub async fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let mut config = CliConfig::default();
        config.device.state_file = dir.path().join("device.json");
        config.device.settle_ms = 0;
        MockDevice::create(&config.device.state_file, false)
            .await
            .unwrap();
        Self { dir, config }
    }

    pub async fn connect(&self, consent: bool) -> AppContext {
        let device = MockDevice::open(&self.config.device.state_file)
            .await
            .unwrap();
        AppContext::with_parts(
            self.config.clone(),
            device,
            Arc::new(FixedAnswer(consent)),
            Box::new(SilenceExporter::default()),
        )
        .await
        .unwrap()
    }

    /// Disc as persisted in the state file
    pub async fn persisted(&self) -> md_core::Disc {
        MockDevice::open(&self.config.device.state_file)
            .await
            .unwrap()
            .snapshot()
    }

    pub fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }
}
