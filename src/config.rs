use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{InstallError, InstallResult};

fn default_true() -> bool {
    true
}

/// Download and install settings for the service, read once at startup.
///
/// Keys use the camelCase names of the host application's `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Platform id (e.g. `Linux-64`) to the archive file name for that platform
    pub download_file_names: BTreeMap<String, String>,
    pub version: String,
    /// Template with `{version}` and `{platform}` placeholders
    #[serde(alias = "installDirectoy")]
    pub install_directory: String,
    /// Template with `{version}` and `{fileName}` placeholders
    pub download_url: String,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(rename = "strictSSL", default = "default_true")]
    pub strict_ssl: bool,
    /// Paths relative to the install directory, in lookup order
    #[serde(default)]
    pub executable_files: Vec<String>,
}

impl ServiceConfig {
    /// Load a config file, choosing TOML or JSON by extension
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: ServiceConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            _ => serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject templates the resolver cannot work with
    pub fn validate(&self) -> InstallResult<()> {
        if self.version.trim().is_empty() {
            return Err(InstallError::InvalidConfig("version is empty".into()));
        }
        // No default root is derived from the home directory; callers must
        // always name the install location.
        if self.install_directory.trim().is_empty() {
            return Err(InstallError::InvalidConfig("installDirectory is empty".into()));
        }
        if self.download_url.trim().is_empty() {
            return Err(InstallError::InvalidConfig("downloadUrl is empty".into()));
        }
        Ok(())
    }

    /// Configured proxy, with an empty string treated as absent
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "downloadFileNames": { "Linux-64": "svc-linux.tar.gz", "Windows_64": "svc-win.zip" },
        "version": "1.2.3",
        "installDirectory": "/opt/svc/{version}/{platform}",
        "downloadUrl": "https://cdn.example.com/{version}/{fileName}",
        "proxy": "",
        "executableFiles": ["svc", "svc.exe"]
    }"#;

    #[test]
    fn parses_host_json_layout() {
        let config: ServiceConfig = serde_json::from_str(JSON).unwrap();

        assert_eq!(config.download_file_names["Linux-64"], "svc-linux.tar.gz");
        assert_eq!(config.version, "1.2.3");
        assert!(config.strict_ssl, "strictSSL defaults to true");
        assert_eq!(config.proxy(), None);
        assert_eq!(config.executable_files, vec!["svc", "svc.exe"]);
        config.validate().unwrap();
    }

    #[test]
    fn accepts_legacy_install_directory_key() {
        let json = JSON.replace("installDirectory", "installDirectoy");
        let config: ServiceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.install_directory, "/opt/svc/{version}/{platform}");
    }

    #[test]
    fn loads_toml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svc.toml");
        std::fs::write(
            &path,
            r#"
version = "2.0.0"
installDirectory = "/srv/{version}"
downloadUrl = "http://mirror/{fileName}"
strictSSL = false
proxy = "http://proxy:3128"

[downloadFileNames]
OSX = "svc-osx.zip"
"#,
        )
        .unwrap();

        let config = ServiceConfig::load(&path).unwrap();
        assert!(!config.strict_ssl);
        // Stored as written, but downloads still verify certificates
        assert!(crate::download::proxy::effective_strict_tls(Some(config.strict_ssl)));
        assert_eq!(config.proxy(), Some("http://proxy:3128"));
        assert_eq!(config.download_file_names["OSX"], "svc-osx.zip");
    }

    #[test]
    fn rejects_empty_install_directory() {
        let mut config: ServiceConfig = serde_json::from_str(JSON).unwrap();
        config.install_directory = String::new();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, InstallError::InvalidConfig(_)));
    }
}
