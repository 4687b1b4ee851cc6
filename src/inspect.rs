//! File metadata for the `get_file_info` operation.

use crate::config::ServerConfig;
use crate::error::ConvertError;
use crate::format::Format;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata about one candidate input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    /// Absolute, canonical path.
    pub path: PathBuf,
    pub size_bytes: u64,
    pub size_mb: f64,
    /// Lowercase extension with a leading dot, or empty.
    pub extension: String,
    /// Registered format, if the extension is known.
    pub format: Option<Format>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub readable: bool,
    pub within_size_limit: bool,
}

/// Inspect `path` without reading its contents.
///
/// # Errors
/// [`ConvertError::NotFound`] or [`ConvertError::NotAFile`].
pub async fn file_info(path: &Path, config: &ServerConfig) -> Result<FileInfo, ConvertError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|_| ConvertError::NotFound {
            path: path.to_path_buf(),
        })?;
    if !meta.is_file() {
        return Err(ConvertError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    let absolute = tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf());
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default();
    let readable = tokio::fs::File::open(path).await.is_ok();
    let size = meta.len();

    Ok(FileInfo {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: absolute,
        size_bytes: size,
        size_mb: (size as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
        format: Format::from_extension(&extension),
        extension,
        created: meta.created().ok().map(DateTime::<Utc>::from),
        modified: meta.modified().ok().map(DateTime::<Utc>::from),
        readable,
        within_size_limit: size <= config.max_file_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_format_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Notes.MD");
        std::fs::write(&path, "# hi\n").unwrap();

        let config = ServerConfig::builder().max_file_size(4).build().unwrap();
        let info = file_info(&path, &config).await.unwrap();
        assert_eq!(info.name, "Notes.MD");
        assert_eq!(info.extension, ".md");
        assert_eq!(info.format, Some(Format::Markdown));
        assert_eq!(info.size_bytes, 5);
        assert!(info.readable);
        assert!(!info.within_size_limit);
        assert!(info.path.is_absolute());
        assert!(info.modified.is_some());
    }

    #[tokio::test]
    async fn unknown_extension_has_no_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, [0u8; 3]).unwrap();
        let info = file_info(&path, &ServerConfig::default()).await.unwrap();
        assert_eq!(info.format, None);
        assert!(info.within_size_limit);
    }

    #[tokio::test]
    async fn missing_and_directory_paths_fail() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::default();
        let err = file_info(&dir.path().join("none.txt"), &config).await.unwrap_err();
        assert!(matches!(err, ConvertError::NotFound { .. }));
        let err = file_info(dir.path(), &config).await.unwrap_err();
        assert!(matches!(err, ConvertError::NotAFile { .. }));
    }
}
