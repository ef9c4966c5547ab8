//! Install lifecycle events and their observers

use std::sync::Arc;

use tokio::sync::mpsc;

/// Lifecycle notification emitted during one install attempt.
///
/// An attempt emits `DownloadStart`, any number of `DownloadProgress`,
/// `DownloadEnd`, `InstallStart` and `InstallEnd`, in that order, and stops
/// early on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    /// Total size in bytes, when the server reports one
    DownloadStart { size: Option<u64> },
    /// Cumulative bytes received so far
    DownloadProgress { received: u64 },
    DownloadEnd,
    InstallStart,
    InstallEnd,
}

impl InstallEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InstallEvent::DownloadStart { .. } => "download_start",
            InstallEvent::DownloadProgress { .. } => "download_progress",
            InstallEvent::DownloadEnd => "download_end",
            InstallEvent::InstallStart => "install_start",
            InstallEvent::InstallEnd => "install_end",
        }
    }
}

/// Receives lifecycle events as they happen
pub trait InstallObserver: Send + Sync {
    fn on_event(&self, event: &InstallEvent);
}

impl InstallObserver for mpsc::UnboundedSender<InstallEvent> {
    fn on_event(&self, event: &InstallEvent) {
        // A dropped receiver only means nobody is listening anymore
        let _ = self.send(event.clone());
    }
}

/// Writes line-oriented progress to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl InstallObserver for LogObserver {
    fn on_event(&self, event: &InstallEvent) {
        match event {
            InstallEvent::DownloadStart { size: Some(size) } => {
                log::info!("Downloading {:.1} MB", *size as f64 / 1_048_576.0)
            }
            InstallEvent::DownloadStart { size: None } => log::info!("Downloading"),
            InstallEvent::DownloadProgress { received } => log::trace!("Received {received} bytes"),
            InstallEvent::DownloadEnd => log::info!("Done!"),
            InstallEvent::InstallStart => log::info!("Installing ..."),
            InstallEvent::InstallEnd => log::info!("Installed"),
        }
    }
}

/// Fans each event out to every registered observer, in registration order
#[derive(Clone, Default)]
pub struct EventSink {
    observers: Vec<Arc<dyn InstallObserver>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Arc<dyn InstallObserver>) {
        self.observers.push(observer);
    }

    pub fn emit(&self, event: InstallEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("observers", &self.observers.len())
            .finish()
    }
}
