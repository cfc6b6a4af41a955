use crate::error::CliError;
use std::path::{Path, PathBuf};

/// True when `path` points at an existing regular file.
pub fn is_file(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

/// Validate that `path` is an existing directory and return it absolutized.
pub fn validate_folder_path(path: impl AsRef<Path>) -> Result<PathBuf, CliError> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path).map_err(|_| CliError::PathNotFound {
        path: path.to_path_buf(),
    })?;
    if !metadata.is_dir() {
        return Err(CliError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    absolutize(path)
}

/// Validate that `path` is an existing regular file and return it absolutized.
pub fn validate_file_path(path: impl AsRef<Path>) -> Result<PathBuf, CliError> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path).map_err(|_| CliError::PathNotFound {
        path: path.to_path_buf(),
    })?;
    if !metadata.is_file() {
        return Err(CliError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    absolutize(path)
}

fn absolutize(path: &Path) -> Result<PathBuf, CliError> {
    path.canonicalize()
        .map_err(|_| CliError::WrongPath(path.display().to_string()))
}
