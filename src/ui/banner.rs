//! Transient status banner with an auto-hide timer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Visual tone of a banner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tone {
    /// Neutral notice.
    #[default]
    Info,
    /// Something failed.
    Error,
}

impl Tone {
    /// CSS color of the banner text.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Info => "#ffd700",
            Self::Error => "#ff5252",
        }
    }
}

/// Where banners are drawn.
pub trait BannerSink: Send + Sync {
    /// Make the banner visible with `message`.
    fn show_banner(&self, message: &str, tone: Tone);
    /// Hide the banner.
    fn hide_banner(&self);
}

/// Shows a banner and hides it after a fixed delay.
///
/// Only the most recent banner owns the hide timer: showing a new banner
/// aborts the pending hide of the previous one.
pub struct StatusBanner {
    sink: Arc<dyn BannerSink>,
    timeout: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl StatusBanner {
    /// Create a banner drawing into `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn BannerSink>, timeout: Duration) -> Self {
        Self {
            sink,
            timeout,
            pending: Mutex::new(None),
        }
    }

    /// Show `message` and (re)arm the hide timer. Must be called inside a tokio runtime.
    pub fn show(&self, message: &str, tone: Tone) {
        self.sink.show_banner(message, tone);

        let sink = Arc::clone(&self.sink);
        let timeout = self.timeout;
        let hide = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            sink.hide_banner();
        });

        if let Some(previous) = self.pending.lock().replace(hide) {
            previous.abort();
        }
    }

    /// Hide immediately and cancel the pending timer.
    pub fn dismiss(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.abort();
        }
        self.sink.hide_banner();
    }
}

impl Drop for StatusBanner {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.get_mut().take() {
            pending.abort();
        }
    }
}
