//! Lookahead conversion pipeline.
//!
//! One producer task converts items strictly in order and parks the
//! results in a bounded channel. With a lookahead of one, the next file is
//! converted while the device writes the current one, and at most one
//! finished conversion waits in memory.

use crate::error::{Result, UploadError};
use crate::types::{SourceKind, UploadItem};
use md_core::{AudioExport, Wireformat};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Export service shared between the producer task and its owner
pub type SharedExporter = Arc<Mutex<Box<dyn AudioExport>>>;

/// Device-ready data for one item
#[derive(Debug)]
pub struct Converted {
    /// Position in the submitted list
    pub index: usize,
    pub data: Vec<u8>,
    /// Format to declare when writing
    pub format: Wireformat,
}

/// Handle on a running producer
pub struct ConversionPipeline {
    results: mpsc::Receiver<Result<Converted>>,
    producer: JoinHandle<()>,
    stop: CancellationToken,
}

impl ConversionPipeline {
    /// Start converting `items` with `format`.
    ///
    /// `cancel` stops the producer before its next conversion; a conversion
    /// already running finishes. A failed conversion is delivered in order
    /// and ends the stream.
    pub fn spawn(
        items: Vec<UploadItem>,
        format: Wireformat,
        exporter: SharedExporter,
        lookahead: usize,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, results) = mpsc::channel(lookahead.max(1));
        let stop = cancel.child_token();
        let token = stop.clone();

        let producer = tokio::spawn(async move {
            for (index, item) in items.into_iter().enumerate() {
                if token.is_cancelled() {
                    debug!("Conversion stopped before item {}", index);
                    break;
                }

                debug!("Converting item {}: {}", index, item.source.display());
                let result = convert(&exporter, &item, format).await.map(|(data, format)| {
                    Converted {
                        index,
                        data,
                        format,
                    }
                });
                let failed = result.is_err();
                if let Err(e) = &result {
                    error!("Conversion of {} failed: {}", item.file_name(), e);
                }

                if tx.send(result).await.is_err() || failed {
                    break;
                }
            }
        });

        Self {
            results,
            producer,
            stop,
        }
    }

    /// Next result in submission order, `None` once the producer is done
    pub async fn next(&mut self) -> Option<Result<Converted>> {
        self.results.recv().await
    }

    /// Stop producing, discard anything waiting and wait for the task
    pub async fn shutdown(self) -> Result<()> {
        self.stop.cancel();
        drop(self.results);
        self.producer
            .await
            .map_err(|e| UploadError::Pipeline(e.to_string()))
    }
}

async fn convert(
    exporter: &SharedExporter,
    item: &UploadItem,
    format: Wireformat,
) -> Result<(Vec<u8>, Wireformat)> {
    match item.kind {
        SourceKind::Encode => {
            let mut exporter = exporter.lock().await;
            exporter.prepare(&item.source).await?;
            let data = exporter.export(format).await?;
            info!("Converted {} to {} ({} bytes)", item.file_name(), format, data.len());
            Ok((data, format))
        }
        SourceKind::PreEncoded {
            format,
            bytes_to_skip,
        } => {
            let mut data = tokio::fs::read(&item.source).await?;
            if bytes_to_skip > data.len() {
                return Err(UploadError::Unsupported(format!(
                    "{} is shorter than its header",
                    item.file_name()
                )));
            }
            data.drain(..bytes_to_skip);
            debug!("Using {} as {} without conversion", item.file_name(), format);
            Ok((data, format))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use md_core::MdError;
    use std::path::{Path, PathBuf};

    /// Returns the source file name as the converted data
    struct NameExporter {
        prepared: Option<PathBuf>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl AudioExport for NameExporter {
        async fn prepare(&mut self, source: &Path) -> md_core::Result<()> {
            if self.fail_on.is_some_and(|f| source.ends_with(f)) {
                return Err(MdError::export("unrecognized format"));
            }
            self.prepared = Some(source.to_path_buf());
            Ok(())
        }

        async fn export(&mut self, _format: Wireformat) -> md_core::Result<Vec<u8>> {
            let source = self.prepared.take().ok_or_else(|| MdError::export("nothing prepared"))?;
            Ok(source.to_string_lossy().into_owned().into_bytes())
        }
    }

    fn exporter(fail_on: Option<&'static str>) -> SharedExporter {
        Arc::new(Mutex::new(Box::new(NameExporter {
            prepared: None,
            fail_on,
        })))
    }

    fn items(names: &[&str]) -> Vec<UploadItem> {
        names.iter().map(|n| UploadItem::encode(*n, *n)).collect()
    }

    #[tokio::test]
    async fn test_results_arrive_in_order() {
        let mut pipeline = ConversionPipeline::spawn(
            items(&["a", "b", "c"]),
            Wireformat::Lp2,
            exporter(None),
            1,
            CancellationToken::new(),
        );

        let mut seen = Vec::new();
        while let Some(result) = pipeline.next().await {
            let converted = result.unwrap();
            assert_eq!(converted.format, Wireformat::Lp2);
            seen.push((converted.index, String::from_utf8(converted.data).unwrap()));
        }
        assert_eq!(seen, vec![(0, "a".into()), (1, "b".into()), (2, "c".into())]);
        pipeline.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failure_is_delivered_in_order_and_ends_stream() {
        let mut pipeline = ConversionPipeline::spawn(
            items(&["a", "bad", "c"]),
            Wireformat::Sp,
            exporter(Some("bad")),
            1,
            CancellationToken::new(),
        );

        assert!(pipeline.next().await.unwrap().is_ok());
        assert!(pipeline.next().await.unwrap().is_err());
        assert!(pipeline.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_before_start_produces_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut pipeline =
            ConversionPipeline::spawn(items(&["a", "b"]), Wireformat::Sp, exporter(None), 1, cancel);

        assert!(pipeline.next().await.is_none());
    }

    #[tokio::test]
    async fn test_pre_encoded_items_skip_their_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.oma");
        tokio::fs::write(&path, [0u8, 0, 0, 0, 1, 2, 3]).await.unwrap();

        let item = UploadItem::encode(&path, "t").with_kind(SourceKind::PreEncoded {
            format: Wireformat::Lp4,
            bytes_to_skip: 4,
        });
        let mut pipeline = ConversionPipeline::spawn(
            vec![item],
            Wireformat::Sp,
            exporter(None),
            1,
            CancellationToken::new(),
        );

        let converted = pipeline.next().await.unwrap().unwrap();
        assert_eq!(converted.data, vec![1, 2, 3]);
        assert_eq!(converted.format, Wireformat::Lp4);
    }
}
