use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}}) {{msg}}",
                label
            ))
            .progress_chars("#>-"),
    );
    pb
}

/// Safely create output directories and return their paths
pub fn create_output_directory(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        log::warn!(
            "Directory {:?} already exists. Deleting and recreating it.",
            path
        );
        fs::remove_dir_all(path)
            .and_then(|_| fs::create_dir_all(path))
            .map_err(|e| ConvertError::io(path, e))?;
    } else {
        fs::create_dir_all(path).map_err(|e| ConvertError::io(path, e))?;
    }
    Ok(path.to_path_buf())
}

/// Remove a directory tree if it exists
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| ConvertError::io(path, e))?;
    }
    Ok(())
}

/// Archive file name for a dataset directory: its base name with spaces replaced
pub fn archive_file_name(input_dir: &Path) -> String {
    let base = input_dir
        .file_name()
        .map(|name| name.to_string_lossy().replace(' ', "_"))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "dataset".to_string());
    format!("{}.zip", base)
}
