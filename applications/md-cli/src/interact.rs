//! Terminal implementations of the editor and upload hooks

use async_trait::async_trait;
use md_editor::Confirm;
use md_upload::Notifier;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

/// Asks on the terminal. Anything but `y`/`yes` declines, including EOF.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirm;

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let mut stderr = tokio::io::stderr();
        let question = format!("{} [y/N] ", prompt);
        if let Err(e) = stderr.write_all(question.as_bytes()).await {
            warn!("Cannot write prompt: {}", e);
            return false;
        }
        let _ = stderr.flush().await;

        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(_) => is_yes(&line),
            Err(e) => {
                warn!("Cannot read answer: {}", e);
                false
            }
        }
    }
}

/// Prints the notification and logs it
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, title: &str, body: &str) {
        info!(title, body, "Notification");
        println!("{}: {}", title, body);
    }
}
