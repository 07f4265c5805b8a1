//! Upload sequencer.
//!
//! Drives one session through
//! `Idle → Preparing → Writing(i)… → {Cancelled | Aborted} → Finalizing → Idle`,
//! holding the device for the whole session. Tracks written before a
//! cancellation or failure stay on the disc.

use crate::error::Result;
use crate::hooks::{NoNotifier, NoWakeLock, Notifier, WakeLock};
use crate::pipeline::{ConversionPipeline, SharedExporter};
use crate::types::{UploadEvent, UploadItem, UploadOutcome, UploadPhase, UploadSettings, UploadSummary};
use md_core::{MdError, TitleAllowance, WriteProgress};
use md_editor::DiscEditor;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// A running session
pub struct UploadSession {
    pub events: mpsc::Receiver<UploadEvent>,
    pub handle: JoinHandle<Result<UploadSummary>>,
    cancel: CancellationToken,
}

impl UploadSession {
    /// Ask the session to stop after the track being written
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Writes batches of files to the disc
#[derive(Clone)]
pub struct UploadSequencer {
    editor: Arc<DiscEditor>,
    exporter: SharedExporter,
    wake_lock: Arc<dyn WakeLock>,
    notifier: Arc<dyn Notifier>,
    settings: UploadSettings,
}

impl UploadSequencer {
    pub fn new(editor: Arc<DiscEditor>, exporter: SharedExporter, settings: UploadSettings) -> Self {
        Self {
            editor,
            exporter,
            wake_lock: Arc::new(NoWakeLock),
            notifier: Arc::new(NoNotifier),
            settings,
        }
    }

    #[must_use]
    pub fn with_hooks(mut self, wake_lock: Arc<dyn WakeLock>, notifier: Arc<dyn Notifier>) -> Self {
        self.wake_lock = wake_lock;
        self.notifier = notifier;
        self
    }

    /// Run a session in the background
    pub fn start(&self, items: Vec<UploadItem>) -> UploadSession {
        let (tx, events) = mpsc::channel(100);
        let cancel = CancellationToken::new();
        let sequencer = self.clone();
        let token = cancel.clone();

        let handle = tokio::spawn(async move { sequencer.run(items, tx, token).await });

        UploadSession {
            events,
            handle,
            cancel,
        }
    }

    /// Run a session to completion.
    ///
    /// Returns an error only when the session could not start (no disc);
    /// device and conversion failures end up in the summary's outcome.
    pub async fn run(
        &self,
        items: Vec<UploadItem>,
        events: mpsc::Sender<UploadEvent>,
        cancel: CancellationToken,
    ) -> Result<UploadSummary> {
        let total = items.len();
        let mut device = self.editor.transport().acquire().await;

        // No phase is published until a disc is known
        let disc = match self.editor.snapshot().disc {
            Some(disc) => disc,
            None => self
                .editor
                .reload_with(&mut **device)
                .await?
                .disc
                .ok_or_else(|| MdError::precondition("No disc loaded"))?,
        };
        let _ = events.send(UploadEvent::Phase(UploadPhase::Preparing)).await;

        if let Err(e) = device.stop().await {
            warn!("Cannot stop playback before upload: {}", e);
        }
        let _ = events.send(UploadEvent::Started { total }).await;
        info!("Upload of {} tracks started ({})", total, self.settings.format);

        if let Err(e) = self.wake_lock.acquire().await {
            warn!("Wake lock unavailable: {}", e);
        }

        let mut allowance = TitleAllowance::for_disc(&disc, self.settings.full_width_titles);
        let mut written = 0;
        let mut outcome = None;

        let mut pipeline = None;
        if let Err(e) = device.prepare_upload().await {
            outcome = Some(aborted(None, format!("Cannot prepare the device: {}", e)));
        } else {
            pipeline = Some(ConversionPipeline::spawn(
                items.clone(),
                self.settings.format,
                self.exporter.clone(),
                self.settings.lookahead,
                cancel.clone(),
            ));
        }

        if let Some(pipeline) = pipeline.as_mut() {
            for (index, item) in items.iter().enumerate() {
                if cancel.is_cancelled() {
                    info!("Upload cancelled after {} tracks", written);
                    outcome = Some(UploadOutcome::Cancelled);
                    break;
                }
                let _ = events.send(UploadEvent::Phase(UploadPhase::Writing(index))).await;
                let _ = events.send(UploadEvent::Converting { index }).await;

                let converted = match pipeline.next().await {
                    Some(Ok(_)) if cancel.is_cancelled() => {
                        info!("Upload cancelled after {} tracks", written);
                        outcome = Some(UploadOutcome::Cancelled);
                        break;
                    }
                    Some(Ok(converted)) => converted,
                    Some(Err(e)) => {
                        outcome = Some(aborted(
                            Some(index),
                            format!("{}: Unsupported or unrecognized format ({})", item.file_name(), e),
                        ));
                        break;
                    }
                    None if cancel.is_cancelled() => {
                        outcome = Some(UploadOutcome::Cancelled);
                        break;
                    }
                    None => {
                        outcome = Some(aborted(Some(index), "Conversion stopped early".to_string()));
                        break;
                    }
                };

                let titles = allowance.admit(&item.title, &item.full_width_title);
                debug!(
                    "Track {} titles: '{}' / '{}'",
                    index, titles.title, titles.full_width_title
                );
                let _ = events
                    .send(UploadEvent::TrackStarted {
                        index,
                        title: titles.title.clone(),
                    })
                    .await;
                let _ = events
                    .send(UploadEvent::WriteProgress {
                        index,
                        progress: WriteProgress::default(),
                    })
                    .await;

                let progress = events.clone();
                let result = device
                    .upload(
                        &titles.title,
                        &titles.full_width_title,
                        converted.data,
                        converted.format,
                        &mut |p| {
                            let _ = progress.try_send(UploadEvent::WriteProgress { index, progress: p });
                        },
                    )
                    .await;

                match result {
                    Ok(()) => {
                        written += 1;
                        let _ = events.send(UploadEvent::TrackWritten { index }).await;
                    }
                    Err(e) => {
                        outcome = Some(aborted(
                            Some(index),
                            format!(
                                "{}: Error uploading to device. There might not be enough space left, or an unknown error occurred. ({})",
                                item.file_name(),
                                e
                            ),
                        ));
                        break;
                    }
                }
            }
        }

        match &outcome {
            Some(UploadOutcome::Cancelled) => {
                let _ = events.send(UploadEvent::Phase(UploadPhase::Cancelled)).await;
            }
            Some(UploadOutcome::Aborted { .. }) => {
                let _ = events.send(UploadEvent::Phase(UploadPhase::Aborted)).await;
            }
            _ => {}
        }
        let _ = events.send(UploadEvent::Phase(UploadPhase::Finalizing)).await;

        if let Err(e) = device.finalize_upload().await {
            error!("Cannot finalize upload: {}", e);
            if outcome.is_none() {
                outcome = Some(aborted(None, format!("Cannot finalize upload: {}", e)));
            }
        }
        if let Some(pipeline) = pipeline {
            if let Err(e) = pipeline.shutdown().await {
                warn!("{}", e);
            }
        }
        self.wake_lock.release().await;
        if let Err(e) = self.editor.reload_with(&mut **device).await {
            warn!("Reload after upload failed: {}", e);
        }
        drop(device);

        let outcome = outcome.unwrap_or(UploadOutcome::Completed);
        match &outcome {
            UploadOutcome::Aborted { message, .. } => {
                error!("Upload aborted: {}", message);
                let _ = events
                    .send(UploadEvent::Failed {
                        message: message.clone(),
                    })
                    .await;
            }
            UploadOutcome::Completed => {
                info!("Upload finished: {} tracks written", written);
                if self.settings.notify_when_finished {
                    self.notifier
                        .notify("MiniDisc recording completed", &format!("{} tracks written", written))
                        .await;
                }
            }
            UploadOutcome::Cancelled => {}
        }

        let _ = events
            .send(UploadEvent::Finished {
                outcome: outcome.clone(),
            })
            .await;
        let _ = events.send(UploadEvent::Phase(UploadPhase::Idle)).await;

        Ok(UploadSummary {
            outcome,
            written,
            total,
        })
    }
}

fn aborted(failed_index: Option<usize>, message: String) -> UploadOutcome {
    UploadOutcome::Aborted {
        failed_index,
        message,
    }
}
