//! Service artifact resolution, download and extraction
//!
//! ## Module Organization
//!
//! - `resolver` - Platform to file name, install directory and download URL
//! - `proxy` - Proxy selection from explicit settings or the environment
//! - `core` - Streaming HTTP download with progress events
//! - `extract` - Archive extraction (ZIP, TAR, TAR.GZ)

pub mod core;
pub mod extract;
pub mod proxy;
pub mod resolver;

pub use self::core::HttpFetcher;
pub use extract::{extract_archive, mark_executable, ArchiveFormat};
pub use proxy::{
    ProxyAuth, ProxyEnvironment, ProxyParams, ProxyResolver, ProxyTransport, SystemEnvironment,
    effective_strict_tls,
};
pub use resolver::PlatformResolver;
