//! Download and install a platform-specific service archive
//!
//! The library resolves which artifact a platform needs from a
//! [`ServiceConfig`], downloads it (through a proxy when one is configured or
//! found in the environment) and extracts it into the install directory,
//! reporting lifecycle events to registered observers.

pub mod config;
pub mod download;
pub mod error;
pub mod install;
pub mod platform;

pub use config::ServiceConfig;
pub use download::{HttpFetcher, PlatformResolver, ProxyResolver};
pub use error::{DownloadFailure, ExtractFailure, InstallError, InstallResult, UnsupportedPlatform};
pub use install::{
    EventSink, InstallEvent, InstallObserver, InstallOrchestrator, InstallOutcome, InstallState,
    LogObserver, ServerProvider,
};
pub use platform::Platform;
