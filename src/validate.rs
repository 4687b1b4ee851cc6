//! Input path validation.
//!
//! Runs before any strategy touches the input: existence, type, and size
//! against [`crate::ServerConfig::max_file_size`].

use crate::error::ConvertError;
use std::path::Path;
use tracing::debug;

/// Check that `path` is an existing regular file no larger than `max_size`
/// bytes. Returns the file size on success.
///
/// # Errors
/// - [`ConvertError::NotFound`] — nothing exists at `path`
/// - [`ConvertError::NotAFile`] — `path` is a directory or other non-file
/// - [`ConvertError::TooLarge`] — the file exceeds `max_size`
pub fn validate_input(path: &Path, max_size: u64) -> Result<u64, ConvertError> {
    let meta = match std::fs::metadata(path) {
        Ok(m) => m,
        // Unreadable parent directories are reported as not found too.
        Err(_) => {
            return Err(ConvertError::NotFound {
                path: path.to_path_buf(),
            })
        }
    };

    if !meta.is_file() {
        return Err(ConvertError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    let size = meta.len();
    if size > max_size {
        return Err(ConvertError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_size,
        });
    }

    debug!("Validated input {} ({} bytes)", path.display(), size);
    Ok(size)
}

/// Check that `path` is an existing directory.
pub fn validate_dir(path: &Path) -> Result<(), ConvertError> {
    if !path.exists() {
        return Err(ConvertError::NotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(ConvertError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
