//! Download-and-install orchestration
//!
//! One call to [`InstallOrchestrator::install_service`] runs the whole
//! pipeline for a platform: resolve the artifact, download it into a temp
//! file, extract it into the install directory. Stages run strictly one after
//! another; concurrent attempts are not coordinated and must be serialized by
//! the caller.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::package::Package;
use super::progress::{EventSink, InstallEvent, InstallObserver};
use crate::config::ServiceConfig;
use crate::download::extract::{extract_archive, mark_executable};
use crate::download::proxy::{ProxyEnvironment, SystemEnvironment};
use crate::download::{HttpFetcher, PlatformResolver};
use crate::error::{InstallError, InstallResult};
use crate::platform::Platform;

/// Stage of the current install attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Idle,
    ResolvingTarget,
    Downloading,
    Installing,
    Done,
    Failed,
}

/// What a successful install attempt produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub file_name: String,
    pub url: String,
    pub install_dir: PathBuf,
    pub bytes_downloaded: u64,
}

/// Drives resolution, download and extraction for one service config
pub struct InstallOrchestrator<E = SystemEnvironment> {
    config: Arc<ServiceConfig>,
    fetcher: HttpFetcher<E>,
    events: EventSink,
    temp_dir: Option<PathBuf>,
    cancel: CancellationToken,
    state: watch::Sender<InstallState>,
}

impl InstallOrchestrator {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_fetcher(config, HttpFetcher::new())
    }
}

impl<E: ProxyEnvironment> InstallOrchestrator<E> {
    pub fn with_fetcher(config: ServiceConfig, fetcher: HttpFetcher<E>) -> Self {
        let (state, _) = watch::channel(InstallState::Idle);
        Self {
            config: Arc::new(config),
            fetcher,
            events: EventSink::new(),
            temp_dir: None,
            cancel: CancellationToken::new(),
            state,
        }
    }

    /// Register an observer for lifecycle events
    pub fn with_observer(mut self, observer: Arc<dyn InstallObserver>) -> Self {
        self.events.add(observer);
        self
    }

    /// Allocate download temp files in `dir` instead of the OS temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Abort in-flight downloads when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn resolver(&self) -> PlatformResolver<'_> {
        PlatformResolver::new(&self.config)
    }

    pub fn state(&self) -> InstallState {
        *self.state.borrow()
    }

    /// Follow state transitions of this orchestrator
    pub fn subscribe(&self) -> watch::Receiver<InstallState> {
        self.state.subscribe()
    }

    fn transition(&self, next: InstallState) {
        log::debug!("Install state {:?} -> {:?}", self.state(), next);
        self.state.send_replace(next);
    }

    /// Download the service archive for `platform` and extract it into the
    /// install directory.
    ///
    /// The temp file is removed whether the attempt succeeds or fails; a
    /// partially extracted install directory is left as it is.
    pub async fn install_service(&self, platform: &Platform) -> InstallResult<InstallOutcome> {
        self.transition(InstallState::Idle);

        match self.run(platform).await {
            Ok(outcome) => {
                self.transition(InstallState::Done);
                Ok(outcome)
            }
            Err(e) => {
                log::error!("Install failed: {e}");
                self.transition(InstallState::Failed);
                Err(e)
            }
        }
    }

    async fn run(&self, platform: &Platform) -> InstallResult<InstallOutcome> {
        self.transition(InstallState::ResolvingTarget);

        let resolver = self.resolver();
        let file_name = resolver.file_name_for(platform)?.to_string();
        let install_dir = resolver.ensure_install_directory(platform).await?;
        log::info!("Installing service to {}", install_dir.display());

        let url = resolver.download_url_for(&file_name);
        log::info!("Downloading {url}");

        let package = Package::allocate(url, install_dir, self.temp_dir.as_deref())?;

        self.transition(InstallState::Downloading);
        let mut file = package.open_for_write()?;
        let bytes_downloaded = self
            .fetcher
            .download(
                &package.url,
                &mut file,
                self.config.proxy(),
                Some(self.config.strict_ssl),
                &self.events,
                &self.cancel,
            )
            .await?;
        drop(file);
        log::debug!("Downloaded {bytes_downloaded} bytes to {}", package.tmp_path().display());

        self.transition(InstallState::Installing);
        self.events.emit(InstallEvent::InstallStart);

        let extraction_error = |source| InstallError::Extraction {
            dir: package.install_path.clone(),
            source,
        };
        extract_archive(package.tmp_path(), &package.install_path)
            .await
            .map_err(extraction_error)?;
        mark_executable(&package.install_path, &self.config.executable_files)
            .await
            .map_err(extraction_error)?;

        self.events.emit(InstallEvent::InstallEnd);

        let outcome = InstallOutcome {
            file_name,
            url: package.url.clone(),
            install_dir: package.install_path.clone(),
            bytes_downloaded,
        };

        if let Err(e) = package.close() {
            log::warn!("Failed to remove temporary download file: {e}");
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    fn config(root: &std::path::Path) -> ServiceConfig {
        ServiceConfig {
            download_file_names: BTreeMap::from([(
                "Linux-64".to_string(),
                "svc-linux.tar.gz".to_string(),
            )]),
            version: "1.2.3".into(),
            install_directory: format!("{}/{{platform}}", root.display()),
            // Port 9 (discard) is never served in tests
            download_url: "http://127.0.0.1:9/{version}/{fileName}".into(),
            proxy: None,
            strict_ssl: true,
            executable_files: vec![],
        }
    }

    fn orchestrator(root: &std::path::Path) -> InstallOrchestrator<HashMap<String, String>> {
        InstallOrchestrator::with_fetcher(
            config(root),
            HttpFetcher::with_environment(HashMap::new()),
        )
    }

    #[tokio::test]
    async fn unsupported_platform_fails_before_any_side_effect() {
        let root = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<InstallEvent>();
        let orchestrator = orchestrator(root.path())
            .with_temp_dir(downloads.path())
            .with_observer(Arc::new(tx));

        let err = orchestrator
            .install_service(&"SomeUnknownOS".parse().unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::UnsupportedPlatform(_)));
        assert_eq!(orchestrator.state(), InstallState::Failed);
        assert!(rx.try_recv().is_err());
        assert_eq!(std::fs::read_dir(downloads.path()).unwrap().count(), 0);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_download_removes_temp_file() {
        let root = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(root.path()).with_temp_dir(downloads.path());
        let mut states = orchestrator.subscribe();

        let err = orchestrator.install_service(&Platform::Linux64).await.unwrap_err();

        assert!(matches!(err, InstallError::Download { .. }));
        assert_eq!(*states.borrow_and_update(), InstallState::Failed);
        assert_eq!(std::fs::read_dir(downloads.path()).unwrap().count(), 0);
        assert!(root.path().join("linux-x64").is_dir(), "install dir is not rolled back");
    }

    #[tokio::test]
    async fn missing_temp_dir_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(root.path()).with_temp_dir(root.path().join("absent"));

        let err = orchestrator.install_service(&Platform::Linux64).await.unwrap_err();
        assert!(matches!(err, InstallError::TempFile(_)));
    }
}
