//! Runtime platform identification
//!
//! A [`Platform`] selects which archive to download (by its id, the key of
//! `downloadFileNames`) and names the install directory (by its display name).

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;

/// OS/architecture identifier for the service archive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows64,
    Windows86,
    Osx,
    OsxArm64,
    Linux64,
    Linux86,
    LinuxArm64,
    /// Any identifier without a built-in mapping, with the OS it belongs to
    Other { id: String, os: String },
}

/// Global cache for platform detection (initialized once, used everywhere)
static PLATFORM_CACHE: OnceCell<Platform> = OnceCell::new();

impl Platform {
    /// Detect current platform (cached after first call)
    pub fn detect() -> &'static Platform {
        PLATFORM_CACHE.get_or_init(|| {
            let platform = Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH);
            log::debug!("Detected platform {} ({})", platform, platform.display_name());
            platform
        })
    }

    /// Map `std::env::consts::{OS, ARCH}` values to a platform
    pub fn from_os_arch(os: &str, arch: &str) -> Self {
        match (os, arch) {
            ("windows", "x86_64" | "aarch64") => Platform::Windows64,
            ("windows", "x86") => Platform::Windows86,
            ("macos", "aarch64") => Platform::OsxArm64,
            ("macos", _) => Platform::Osx,
            ("linux", "x86_64") => Platform::Linux64,
            ("linux", "x86") => Platform::Linux86,
            ("linux", "aarch64") => Platform::LinuxArm64,
            (os, arch) => Platform::other(format!("{os}-{arch}"), os),
        }
    }

    pub fn other(id: impl Into<String>, os: impl Into<String>) -> Self {
        Platform::Other {
            id: id.into(),
            os: os.into(),
        }
    }

    /// Key used in the `downloadFileNames` table
    pub fn id(&self) -> &str {
        match self {
            Platform::Windows64 => "Windows_64",
            Platform::Windows86 => "Windows_86",
            Platform::Osx => "OSX",
            Platform::OsxArm64 => "OSX_ARM64",
            Platform::Linux64 => "Linux-64",
            Platform::Linux86 => "Linux-86",
            Platform::LinuxArm64 => "Linux_ARM64",
            Platform::Other { id, .. } => id,
        }
    }

    /// Human-readable name substituted for `{platform}` in the install directory
    pub fn display_name(&self) -> String {
        match self {
            Platform::Windows64 => "win-x64".into(),
            Platform::Windows86 => "win-x86".into(),
            Platform::Osx => "osx".into(),
            Platform::OsxArm64 => "osx-arm64".into(),
            Platform::Linux64 => "linux-x64".into(),
            Platform::Linux86 => "linux-x86".into(),
            Platform::LinuxArm64 => "linux-arm64".into(),
            Platform::Other { id, .. } => id.to_lowercase(),
        }
    }

    pub fn is_linux(&self) -> bool {
        match self {
            Platform::Linux64 | Platform::Linux86 | Platform::LinuxArm64 => true,
            Platform::Other { os, .. } => os == "linux",
            _ => false,
        }
    }
}

impl FromStr for Platform {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Windows_64" => Platform::Windows64,
            "Windows_86" => Platform::Windows86,
            "OSX" => Platform::Osx,
            "OSX_ARM64" => Platform::OsxArm64,
            "Linux-64" | "Linux_64" => Platform::Linux64,
            "Linux-86" | "Linux_86" => Platform::Linux86,
            "Linux_ARM64" => Platform::LinuxArm64,
            // Unmapped ids (e.g. distribution names like `Ubuntu_16`) belong to the host OS
            other => Platform::other(other, std::env::consts::OS),
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
