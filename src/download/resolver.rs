//! Platform to artifact resolution
//!
//! Looks up the archive file name for a platform and fills the configured
//! install-directory and download-URL templates.

use std::path::PathBuf;

use crate::config::ServiceConfig;
use crate::error::{InstallError, InstallResult, UnsupportedPlatform};
use crate::platform::Platform;

/// Replace every `{key}` and legacy `{#key#}` occurrence in `template`
fn expand(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
            .replace(&format!("{{#{key}#}}"), value)
    })
}

/// Resolves download and install locations from a [`ServiceConfig`]
#[derive(Debug, Clone, Copy)]
pub struct PlatformResolver<'a> {
    config: &'a ServiceConfig,
}

impl<'a> PlatformResolver<'a> {
    pub fn new(config: &'a ServiceConfig) -> Self {
        Self { config }
    }

    /// Archive file name configured for `platform`
    pub fn file_name_for(&self, platform: &Platform) -> Result<&'a str, UnsupportedPlatform> {
        let config = self.config;
        match config.download_file_names.get(platform.id()) {
            Some(file_name) => {
                log::debug!("Platform {platform} uses {file_name}");
                Ok(file_name.as_str())
            }
            None if platform.is_linux() => {
                Err(UnsupportedPlatform::LinuxDistribution(platform.id().to_string()))
            }
            None => Err(UnsupportedPlatform::Platform(platform.id().to_string())),
        }
    }

    /// Install directory for `platform`, without touching the filesystem
    pub fn install_dir_for(&self, platform: &Platform) -> PathBuf {
        PathBuf::from(expand(
            &self.config.install_directory,
            &[
                ("version", self.config.version.as_str()),
                ("platform", platform.display_name().as_str()),
            ],
        ))
    }

    /// Install directory for `platform`, created if it does not exist yet.
    ///
    /// Only the final directory is created; a missing parent is an error.
    pub async fn ensure_install_directory(&self, platform: &Platform) -> InstallResult<PathBuf> {
        let path = self.install_dir_for(platform);

        match tokio::fs::create_dir(&path).await {
            Ok(()) => log::debug!("Created install directory {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => {}
            Err(source) => return Err(InstallError::DirectoryCreation { path, source }),
        }

        Ok(path)
    }

    /// Fully-qualified download URL for `file_name`
    pub fn download_url_for(&self, file_name: &str) -> String {
        expand(
            &self.config.download_url,
            &[("version", self.config.version.as_str()), ("fileName", file_name)],
        )
    }
}
