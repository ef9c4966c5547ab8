//! Locate an installed service executable, installing it on first use

use std::path::{Path, PathBuf};

use super::orchestration::InstallOrchestrator;
use crate::download::proxy::{ProxyEnvironment, SystemEnvironment};
use crate::error::{InstallError, InstallResult};
use crate::platform::Platform;

/// First entry of `executable_files` that exists as a file under `install_dir`
pub fn find_server_path(install_dir: &Path, executable_files: &[String]) -> Option<PathBuf> {
    executable_files
        .iter()
        .map(|name| install_dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Hands out the service executable path, downloading only when missing
pub struct ServerProvider<E = SystemEnvironment> {
    orchestrator: InstallOrchestrator<E>,
}

impl<E: ProxyEnvironment> ServerProvider<E> {
    pub fn new(orchestrator: InstallOrchestrator<E>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &InstallOrchestrator<E> {
        &self.orchestrator
    }

    pub async fn get_or_download_server(&self, platform: &Platform) -> InstallResult<PathBuf> {
        let executables = &self.orchestrator.config().executable_files;
        if executables.is_empty() {
            return Err(InstallError::InvalidConfig(
                "executableFiles must name at least one server executable".to_string(),
            ));
        }

        let install_dir = self.orchestrator.resolver().install_dir_for(platform);
        if let Some(path) = find_server_path(&install_dir, executables) {
            log::debug!("Using installed server {}", path.display());
            return Ok(path);
        }

        log::info!("No server found in {}, installing", install_dir.display());
        let outcome = self.orchestrator.install_service(platform).await?;

        find_server_path(&outcome.install_dir, executables).ok_or(InstallError::ServerNotFound {
            dir: outcome.install_dir,
        })
    }
}
