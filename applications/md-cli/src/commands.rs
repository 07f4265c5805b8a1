//! Command handlers.
//!
//! Each handler runs against an [`AppContext`] and returns the text to
//! print. Upload progress is printed as it happens.

use crate::cli::Command;
use crate::context::AppContext;
use crate::render::{render_disc, render_snapshot, render_status};
use anyhow::{bail, Context};
use md_core::{MdError, ReadProgress};
use md_editor::{download_file_name, ListPosition, SelfTestStep};
use md_upload::{probe_source, UploadEvent, UploadItem, UploadOutcome, UploadSession};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub async fn execute(ctx: &AppContext, command: Command) -> anyhow::Result<String> {
    let editor = &ctx.editor;
    match command {
        Command::Init { .. } => bail!("init does not run against a connected device"),
        Command::List { format, json } => {
            let snapshot = editor.snapshot();
            if json {
                return Ok(serde_json::to_string_pretty(&snapshot)?);
            }
            Ok(render_snapshot(
                &snapshot,
                format.unwrap_or(ctx.config.upload.format),
            ))
        }
        Command::Status => {
            let snapshot = editor.snapshot();
            Ok(match snapshot.status {
                Some(status) => render_status(&status),
                None => "State: unavailable".to_string(),
            })
        }
        Command::RenameDisc { title, full_width } => {
            editor.rename_disc(&title, full_width.as_deref()).await?;
            Ok(format!("Disc renamed to '{}'", title))
        }
        Command::RenameTrack {
            index,
            title,
            full_width,
        } => {
            editor
                .rename_track(index, &title, full_width.as_deref())
                .await?;
            Ok(format!("Track {} renamed", index))
        }
        Command::RenameGroup {
            index,
            title,
            full_width,
        } => {
            editor
                .rename_group(index, &title, full_width.as_deref())
                .await?;
            Ok(format!("Group {} renamed", index))
        }
        Command::Move { src, dst } => {
            editor.move_track(src, dst).await?;
            Ok(format!("Moved track {} to {}", src, dst))
        }
        Command::Drag {
            from_list,
            from_index,
            to_list,
            to_index,
        } => {
            editor
                .drag_drop_track(
                    ListPosition::new(from_list, from_index),
                    ListPosition::new(to_list, to_index),
                )
                .await?;
            Ok(listing(ctx))
        }
        Command::Group { name, tracks } => {
            editor.group_tracks(&tracks, &name).await?;
            Ok(format!("Created group '{}'", name))
        }
        Command::Ungroup { groups } => {
            editor.delete_groups(&groups).await?;
            Ok(format!("Deleted {} group(s)", groups.len()))
        }
        Command::Delete { tracks } => {
            let prompt = format!("Delete {} track(s)? This cannot be undone.", tracks.len());
            if !ctx.confirm.confirm(&prompt).await {
                return Ok("Nothing deleted".to_string());
            }
            editor.delete_tracks(&tracks).await?;
            Ok(format!("Deleted {} track(s)", tracks.len()))
        }
        Command::Wipe => {
            if !ctx.confirm.confirm("Erase the whole disc?").await {
                return Ok("Disc left untouched".to_string());
            }
            editor.wipe_disc().await?;
            Ok("Disc erased".to_string())
        }
        Command::Eject => {
            editor.eject_disc().await?;
            Ok("Disc ejected".to_string())
        }
        Command::Play => {
            editor.play().await?;
            Ok(status_line(ctx))
        }
        Command::Pause => {
            editor.pause().await?;
            Ok(status_line(ctx))
        }
        Command::Stop => {
            editor.stop().await?;
            Ok(status_line(ctx))
        }
        Command::Next => {
            editor.next().await?;
            Ok(status_line(ctx))
        }
        Command::Prev => {
            editor.previous().await?;
            Ok(status_line(ctx))
        }
        Command::Goto { track } => {
            editor.goto_track(track).await?;
            Ok(status_line(ctx))
        }
        Command::Seek { track, seconds } => {
            editor.seek(track, seconds).await?;
            Ok(status_line(ctx))
        }
        Command::SelfTest => self_test(ctx).await,
        Command::Upload { files, format } => upload(ctx, files, format).await,
        Command::Download { tracks, output } => download(ctx, tracks, &output).await,
    }
}

fn listing(ctx: &AppContext) -> String {
    match ctx.editor.snapshot().disc {
        Some(disc) => render_disc(&disc, ctx.config.upload.format),
        None => "No disc".to_string(),
    }
}

fn status_line(ctx: &AppContext) -> String {
    match ctx.editor.snapshot().status {
        Some(status) => render_status(&status),
        None => "State: unavailable".to_string(),
    }
}

async fn self_test(ctx: &AppContext) -> anyhow::Result<String> {
    let total = SelfTestStep::ALL.len();
    let mut on_step = |position: usize, step: SelfTestStep| {
        println!("[{}/{}] {}", position + 1, total, step.name());
    };
    let Some(report) = ctx.editor.self_test(&mut on_step).await? else {
        return Ok("Self-test cancelled".to_string());
    };
    match report.failure {
        Some(failure) => bail!("Test '{}' has failed: {}", failure.step.name(), failure.reason),
        None => Ok(format!("All {} tests have passed", report.passed.len())),
    }
}

/// Title for a file: its name without extension
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Upload items for `files`, pre-encoded material recognised up front
pub async fn upload_items(files: &[PathBuf]) -> anyhow::Result<Vec<UploadItem>> {
    let mut items = Vec::with_capacity(files.len());
    for file in files {
        let kind = probe_source(file)
            .await
            .with_context(|| format!("{}: cannot read source", file.display()))?;
        items.push(UploadItem::encode(file, title_from_path(file)).with_kind(kind));
    }
    Ok(items)
}

async fn upload(
    ctx: &AppContext,
    files: Vec<PathBuf>,
    format: Option<md_core::Wireformat>,
) -> anyhow::Result<String> {
    let items = upload_items(&files).await?;
    let session = ctx.sequencer(format).start(items);
    let cancel = session.cancel_token();

    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current track");
            cancel.cancel();
        }
    });
    let result = follow(session).await;
    ctrl_c.abort();

    let summary = result?;
    match summary.outcome {
        UploadOutcome::Completed => Ok(format!(
            "Uploaded {} of {} track(s)",
            summary.written, summary.total
        )),
        UploadOutcome::Cancelled => Ok(format!(
            "Cancelled: {} of {} track(s) written",
            summary.written, summary.total
        )),
        UploadOutcome::Aborted { message, .. } => bail!(
            "{} ({} of {} track(s) written)",
            message,
            summary.written,
            summary.total
        ),
    }
}

/// Print session events until the session ends
async fn follow(mut session: UploadSession) -> anyhow::Result<md_upload::UploadSummary> {
    while let Some(event) = session.events.recv().await {
        match event {
            UploadEvent::TrackStarted { index, title } => {
                println!("[{}] Writing '{}'", index + 1, title);
            }
            UploadEvent::TrackWritten { index } => info!("Track {} written", index + 1),
            UploadEvent::Failed { message } => eprintln!("{}", message),
            _ => {}
        }
    }
    let summary = session.handle.await.context("upload task failed")??;
    Ok(summary)
}

async fn download(ctx: &AppContext, tracks: Vec<usize>, output: &Path) -> anyhow::Result<String> {
    let disc = ctx
        .editor
        .snapshot()
        .disc
        .ok_or_else(|| MdError::precondition("No disc loaded"))?;
    let wanted: Vec<usize> = if tracks.is_empty() {
        (0..disc.track_count()).collect()
    } else {
        tracks
    };

    tokio::fs::create_dir_all(output)
        .await
        .with_context(|| format!("cannot create {}", output.display()))?;

    let mut last_reported = None;
    let mut on_progress = |index: usize, progress: ReadProgress| {
        if progress.read >= progress.total && last_reported != Some(index) {
            last_reported = Some(index);
            info!("Track {} read ({} bytes)", index, progress.total);
        }
    };
    let report = ctx
        .editor
        .download_tracks(&wanted, &mut on_progress)
        .await?;

    let mut failures = report.failures;
    let mut saved = 0;
    for track in &report.files {
        let path = output.join(&track.file_name);
        match tokio::fs::write(&path, &track.data).await {
            Ok(()) => {
                saved += 1;
                println!("{}", path.display());
            }
            Err(e) => {
                warn!("Cannot write {}: {}", path.display(), e);
                failures.push((track.index, format!("cannot write {}: {}", path.display(), e)));
            }
        }
    }
    for (index, reason) in &failures {
        let name = disc
            .track(*index)
            .map(download_file_name)
            .unwrap_or_else(|| format!("track {}", index));
        eprintln!("{}: {}", name, reason);
    }

    if saved == 0 && !failures.is_empty() {
        bail!("No track could be downloaded");
    }
    Ok(format!(
        "Downloaded {} track(s), {} failed",
        saved,
        failures.len()
    ))
}
