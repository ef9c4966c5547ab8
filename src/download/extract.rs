//! Archive extraction into the install directory
//!
//! The downloaded temp file carries no extension, so the format is sniffed
//! from its leading bytes. Zip, gzip-compressed tar and plain tar are
//! supported.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use zip::ZipArchive;

use crate::error::ExtractFailure;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const GZIP_MAGIC: &[u8] = b"\x1f\x8b";
const TAR_MAGIC: &[u8] = b"ustar";
const TAR_MAGIC_OFFSET: usize = 257;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    Tar,
}

/// Identify the archive format from the file's magic bytes
pub fn detect_format(archive_path: &Path) -> std::io::Result<Option<ArchiveFormat>> {
    let mut header = Vec::with_capacity(TAR_MAGIC_OFFSET + TAR_MAGIC.len());
    File::open(archive_path)?
        .take((TAR_MAGIC_OFFSET + TAR_MAGIC.len()) as u64)
        .read_to_end(&mut header)?;

    let format = if header.starts_with(ZIP_MAGIC) {
        Some(ArchiveFormat::Zip)
    } else if header.starts_with(GZIP_MAGIC) {
        Some(ArchiveFormat::TarGz)
    } else if header.get(TAR_MAGIC_OFFSET..) == Some(TAR_MAGIC) {
        Some(ArchiveFormat::Tar)
    } else {
        None
    };

    Ok(format)
}

/// Extract `archive_path` into `dest_dir`, which must already exist
pub async fn extract_archive(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<ArchiveFormat, ExtractFailure> {
    let archive_path = archive_path.to_path_buf();
    let dest_dir = dest_dir.to_path_buf();

    // Decompression is CPU-bound and uses blocking file I/O
    tokio::task::spawn_blocking(move || {
        let format = detect_format(&archive_path)?.ok_or(ExtractFailure::UnknownFormat)?;
        log::debug!("Extracting {:?} archive {}", format, archive_path.display());

        match format {
            ArchiveFormat::Zip => unpack_zip(&archive_path, &dest_dir)?,
            ArchiveFormat::TarGz => {
                Archive::new(GzDecoder::new(File::open(&archive_path)?)).unpack(&dest_dir)?
            }
            ArchiveFormat::Tar => Archive::new(File::open(&archive_path)?).unpack(&dest_dir)?,
        }

        Ok(format)
    })
    .await?
}

fn unpack_zip(archive_path: &Path, dest_dir: &Path) -> Result<(), ExtractFailure> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            log::warn!("Skipping zip entry outside the install directory: {}", entry.name());
            continue;
        };
        let out_path = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out_file)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}

/// Mark the configured service executables as runnable (Unix only).
///
/// Returns the paths that were updated; listed files missing from the
/// install directory are skipped with a warning.
pub async fn mark_executable(
    install_dir: &Path,
    files: &[String],
) -> Result<Vec<PathBuf>, ExtractFailure> {
    let mut marked = Vec::with_capacity(files.len());

    for file in files {
        let path = install_dir.join(file);
        if !tokio::fs::try_exists(&path).await? {
            log::warn!("Executable {} not found after install", path.display());
            continue;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut permissions = tokio::fs::metadata(&path).await?.permissions();
            permissions.set_mode(0o755);
            tokio::fs::set_permissions(&path, permissions).await?;
        }

        marked.push(path);
    }

    Ok(marked)
}
