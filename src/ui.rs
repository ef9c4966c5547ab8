//! Terminal progress for the install command

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use service_downloader::{InstallEvent, InstallObserver};
use tokio_util::sync::CancellationToken;

/// Mirrors download progress onto an `indicatif` bar
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new() -> Result<Self> {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:50.green/blue}] {bytes}/{total_bytes}  {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("█▓░"),
        );
        Ok(Self { bar })
    }
}

impl InstallObserver for ProgressBarObserver {
    fn on_event(&self, event: &InstallEvent) {
        match event {
            InstallEvent::DownloadStart { size } => {
                self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                match size {
                    Some(total) => self.bar.set_length(*total),
                    None => self.bar.unset_length(),
                }
                self.bar.set_message("downloading");
            }
            InstallEvent::DownloadProgress { received } => self.bar.set_position(*received),
            InstallEvent::DownloadEnd => self.bar.finish_with_message("downloaded"),
            InstallEvent::InstallStart | InstallEvent::InstallEnd => {}
        }
    }
}

impl Drop for ProgressBarObserver {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

/// Cancel `token` on the first Ctrl-C
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling download");
            token.cancel();
        }
    });
}
