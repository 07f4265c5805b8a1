//! Side effects around an upload session that the host environment provides
use async_trait::async_trait;
use md_core::Result;

/// Keeps the host awake while a session runs. Best effort: failures are
/// logged and the session carries on.
#[async_trait]
pub trait WakeLock: Send + Sync {
    async fn acquire(&self) -> Result<()>;
    async fn release(&self);
}

/// Tells the user a session finished
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoWakeLock;

#[async_trait]
impl WakeLock for NoWakeLock {
    async fn acquire(&self) -> Result<()> {
        Ok(())
    }

    async fn release(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoNotifier;

#[async_trait]
impl Notifier for NoNotifier {
    async fn notify(&self, _title: &str, _body: &str) {}
}
