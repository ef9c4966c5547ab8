//! Per-attempt download package owning its temporary file

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{InstallError, InstallResult};

/// Resolved download target plus the temp file the archive lands in.
///
/// The temp file is deleted when the package is dropped, so every exit path
/// of an install attempt cleans up after itself.
#[derive(Debug)]
pub struct Package {
    pub url: String,
    pub install_path: PathBuf,
    tmp_file: NamedTempFile,
}

impl Package {
    /// Allocate the temp file, in `temp_dir` or the OS default location
    pub fn allocate(
        url: String,
        install_path: PathBuf,
        temp_dir: Option<&Path>,
    ) -> InstallResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("package-");

        let tmp_file = match temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(InstallError::TempFile)?;

        log::debug!("Allocated {} for {}", tmp_file.path().display(), url);

        Ok(Self {
            url,
            install_path,
            tmp_file,
        })
    }

    pub fn tmp_path(&self) -> &Path {
        self.tmp_file.path()
    }

    /// Open a separate async handle for writing the download
    pub fn open_for_write(&self) -> InstallResult<tokio::fs::File> {
        let file = self.tmp_file.reopen().map_err(InstallError::TempFile)?;
        Ok(tokio::fs::File::from_std(file))
    }

    /// Remove the temp file now, reporting failures instead of ignoring them
    pub fn close(self) -> std::io::Result<()> {
        self.tmp_file.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://x/a.zip";

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn temp_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let package =
            Package::allocate(URL.into(), dir.path().join("out"), Some(dir.path())).unwrap();

        assert_eq!(entries(dir.path()), 1);
        assert!(package
            .tmp_path()
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("package-")));

        drop(package);
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn close_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let package =
            Package::allocate(URL.into(), dir.path().join("out"), Some(dir.path())).unwrap();
        let path = package.tmp_path().to_path_buf();

        package.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn missing_temp_dir_is_a_temp_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Package::allocate(URL.into(), dir.path().into(), Some(&dir.path().join("nope")))
            .unwrap_err();

        assert!(matches!(err, InstallError::TempFile(_)));
    }

    #[tokio::test]
    async fn writes_through_reopened_handle() {
        use tokio::io::AsyncWriteExt;

        let dir = tempfile::tempdir().unwrap();
        let package = Package::allocate(URL.into(), dir.path().into(), Some(dir.path())).unwrap();

        let mut file = package.open_for_write().unwrap();
        file.write_all(b"archive").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        assert_eq!(std::fs::read(package.tmp_path()).unwrap(), b"archive");
    }
}
