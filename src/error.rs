//! Error types for resolving, downloading and installing the service
//!
//! Every stage of an install attempt has its own variant so callers can tell
//! a missing platform mapping apart from a network failure or a corrupt
//! archive. Stage-local causes are kept as `#[source]` for diagnostics.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during an install attempt
#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),

    #[error("Failed to create install directory {}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to allocate temporary download file")]
    TempFile(#[source] std::io::Error),

    #[error("Failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: DownloadFailure,
    },

    #[error("Failed to extract archive into {}", dir.display())]
    Extraction {
        dir: PathBuf,
        #[source]
        source: ExtractFailure,
    },

    #[error("Install cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No service executable found in {}", dir.display())]
    ServerNotFound { dir: PathBuf },
}

/// The platform has no entry in the configured download file names
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedPlatform {
    #[error("Unsupported linux distribution: {0}")]
    LinuxDistribution(String),

    #[error("Unsupported platform: {0}")]
    Platform(String),
}

/// Underlying cause of a failed download
#[derive(Error, Debug)]
pub enum DownloadFailure {
    #[error("invalid download url")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build http client")]
    Client(#[source] reqwest::Error),

    #[error("request failed")]
    Transport(#[source] reqwest::Error),

    #[error("server responded with HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("no data received for {0:?}")]
    Timeout(std::time::Duration),

    #[error("connection closed after {received} of {expected} bytes")]
    Incomplete { received: u64, expected: u64 },

    #[error("failed to write downloaded data")]
    Write(#[source] std::io::Error),
}

/// Underlying cause of a failed extraction
#[derive(Error, Debug)]
pub enum ExtractFailure {
    #[error("unrecognized archive format")]
    UnknownFormat,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error("extraction task failed")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for install operations
pub type InstallResult<T> = Result<T, InstallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_platform_messages_distinguish_linux() {
        let linux = InstallError::from(UnsupportedPlatform::LinuxDistribution("Linux-86".into()));
        let other = InstallError::from(UnsupportedPlatform::Platform("SomeUnknownOS".into()));

        assert_eq!(linux.to_string(), "Unsupported linux distribution: Linux-86");
        assert_eq!(other.to_string(), "Unsupported platform: SomeUnknownOS");
    }

    #[test]
    fn download_error_keeps_cause() {
        let err = InstallError::Download {
            url: "https://cdn.example.com/a.zip".into(),
            source: DownloadFailure::Status(reqwest::StatusCode::NOT_FOUND),
        };

        let cause = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(err.to_string(), "Failed to download https://cdn.example.com/a.zip");
        assert_eq!(cause.as_deref(), Some("server responded with HTTP 404 Not Found"));
    }
}
