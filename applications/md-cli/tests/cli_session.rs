/// End-to-end command tests against a persisted reference device
mod common;

use common::Workspace;
use md_cli::commands::execute;
use md_cli::Command;
use md_core::views::sorted_tracks;
use md_transport::Faults;

#[tokio::test]
async fn test_rename_disc_is_persisted() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;

    let out = execute(
        &ctx,
        Command::RenameDisc {
            title: "Road Trip".to_string(),
            full_width: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Disc renamed to 'Road Trip'");
    ctx.close().await.unwrap();

    assert_eq!(ws.persisted().await.title, "Road Trip");
}

#[tokio::test]
async fn test_list_shows_demo_disc() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;

    let out = execute(
        &ctx,
        Command::List {
            format: None,
            json: false,
        },
    )
    .await
    .unwrap();
    assert!(out.starts_with("Device: Reference MD Unit"));
    assert!(out.contains("[1] Side A"));
    assert!(out.contains("Harbour Lights"));
    assert!(out.contains("5 tracks"));

    let json = execute(
        &ctx,
        Command::List {
            format: None,
            json: true,
        },
    )
    .await
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["device_name"], "Reference MD Unit");
}

#[tokio::test]
async fn test_declined_delete_leaves_disc_alone() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(false).await;
    ctx.device.clear_calls();

    let out = execute(&ctx, Command::Delete { tracks: vec![0, 1] })
        .await
        .unwrap();
    assert_eq!(out, "Nothing deleted");
    assert!(ctx.device.mutations().is_empty());
    assert_eq!(ctx.device.snapshot().track_count(), 5);
}

#[tokio::test]
async fn test_confirmed_delete_removes_tracks() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;

    execute(&ctx, Command::Delete { tracks: vec![4, 0] })
        .await
        .unwrap();
    ctx.close().await.unwrap();

    let titles: Vec<String> = sorted_tracks(&ws.persisted().await)
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, ["Night Drive", "Harbour Lights", "Long Way Home"]);
}

#[tokio::test]
async fn test_group_command_creates_group() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;

    execute(
        &ctx,
        Command::Group {
            name: "Side B".to_string(),
            tracks: vec![2, 3, 4],
        },
    )
    .await
    .unwrap();

    let disc = ctx.editor.snapshot().disc.unwrap();
    let side_b = disc
        .named_groups()
        .find(|g| g.title.as_deref() == Some("Side B"))
        .unwrap();
    assert_eq!(side_b.track_indices(), vec![2, 3, 4]);
}

#[tokio::test]
async fn test_upload_appends_tracks() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;
    let a = ws.write_file("First Song.flac", b"fLaC\0\0\0\0");
    let b = ws.write_file("Second Song.flac", b"fLaC\0\0\0\0");

    let out = execute(
        &ctx,
        Command::Upload {
            files: vec![a, b],
            format: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Uploaded 2 of 2 track(s)");

    let disc = ctx.editor.snapshot().disc.unwrap();
    let titles: Vec<String> = sorted_tracks(&disc).into_iter().map(|t| t.title).collect();
    assert_eq!(&titles[5..], ["First Song", "Second Song"]);
}

#[tokio::test]
async fn test_failed_upload_is_an_error() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;
    ctx.device.set_faults(Faults {
        fail_upload_at: Some(0),
        ..Faults::default()
    });
    let a = ws.write_file("a.flac", b"fLaC\0\0\0\0");

    let err = execute(
        &ctx,
        Command::Upload {
            files: vec![a],
            format: None,
        },
    )
    .await
    .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("a.flac"), "{}", message);
    assert!(message.contains("0 of 1"), "{}", message);
}

#[tokio::test]
async fn test_download_writes_files() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;
    let output = ws.dir.path().join("out");

    let out = execute(
        &ctx,
        Command::Download {
            tracks: vec![2],
            output: output.clone(),
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Downloaded 1 track(s), 0 failed");
    assert!(output.join("3. Harbour Lights.wav").exists());
}

#[tokio::test]
async fn test_download_titles_cannot_leave_the_output_directory() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;
    for (index, title) in [(0, "../../escaped"), (1, "AC/DC")] {
        execute(
            &ctx,
            Command::RenameTrack {
                index,
                title: title.to_string(),
                full_width: None,
            },
        )
        .await
        .unwrap();
    }
    let output = ws.dir.path().join("a").join("b").join("out");

    let out = execute(
        &ctx,
        Command::Download {
            tracks: vec![0, 1],
            output: output.clone(),
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Downloaded 2 track(s), 0 failed");
    assert!(output.join("1. .._.._escaped.aea").exists());
    assert!(output.join("2. AC_DC.aea").exists());
    assert!(!ws.dir.path().join("a").join("escaped.aea").exists());
}

#[tokio::test]
async fn test_download_continues_after_a_write_failure() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;
    let output = ws.dir.path().join("out");
    // A directory in the way of the first file
    std::fs::create_dir_all(output.join("1. Opening Theme.aea")).unwrap();

    let out = execute(
        &ctx,
        Command::Download {
            tracks: vec![0, 1],
            output: output.clone(),
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Downloaded 1 track(s), 1 failed");
    assert!(output.join("2. Night Drive.aea").is_file());
}

#[tokio::test]
async fn test_playback_commands_report_status() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;

    let out = execute(&ctx, Command::Play).await.unwrap();
    assert!(out.starts_with("State: Playing"), "{}", out);

    let out = execute(&ctx, Command::Goto { track: 3 }).await.unwrap();
    assert!(out.contains("track 3"), "{}", out);

    let out = execute(&ctx, Command::Stop).await.unwrap();
    assert!(out.starts_with("State: Ready"), "{}", out);
}

#[tokio::test]
async fn test_eject_then_list() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;

    execute(&ctx, Command::Eject).await.unwrap();
    let out = execute(
        &ctx,
        Command::List {
            format: None,
            json: false,
        },
    )
    .await
    .unwrap();
    assert!(out.ends_with("No disc"));
}

#[tokio::test]
async fn test_self_test_needs_consent() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(false).await;

    let out = execute(&ctx, Command::SelfTest).await.unwrap();
    assert_eq!(out, "Self-test cancelled");
    ctx.close().await.unwrap();
    assert_eq!(ws.persisted().await.track_count(), 5);
}

#[tokio::test]
async fn test_self_test_erases_the_disc() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;

    let out = execute(&ctx, Command::SelfTest).await.unwrap();
    assert_eq!(out, "All 14 tests have passed");
    ctx.close().await.unwrap();
    assert_eq!(ws.persisted().await.track_count(), 0);
}

#[tokio::test]
async fn test_self_test_failure_is_an_error() {
    let ws = Workspace::new().await;
    let ctx = ws.connect(true).await;
    ctx.device.set_faults(Faults {
        refuse_skip: true,
        ..Faults::default()
    });

    let err = execute(&ctx, Command::SelfTest).await.unwrap_err();
    assert!(err.to_string().starts_with("Test 'Next Track' has failed"), "{}", err);
}
