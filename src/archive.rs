//! Zip packaging of the staged VOC dataset.

use jwalk::WalkDir;
use log::{debug, info, warn};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ConvertError, Result};
use crate::types::{ANNOTATIONS_DIR, IMAGES_DIR};
use crate::utils::remove_dir_if_exists;

/// Collect the regular files below `dir`, sorted by path
pub fn collect_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .skip_hidden(false)
        .sort(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .collect()
}

fn partial_path(zip_path: &Path) -> PathBuf {
    let mut name: OsString = zip_path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Pack `<staging>/JPEGImages` and `<staging>/Annotations` into `zip_path`.
///
/// The archive is written next to its destination under a `.partial` name and
/// renamed only once it is complete. Returns the number of entries written.
pub fn archive_outputs(staging: &Path, zip_path: &Path) -> Result<usize> {
    let partial = partial_path(zip_path);
    match write_archive(staging, &partial) {
        Ok(count) => {
            fs::rename(&partial, zip_path).map_err(|e| ConvertError::io(zip_path, e))?;
            info!("Wrote {} entries to {:?}", count, zip_path);
            Ok(count)
        }
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&partial) {
                if remove_err.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove incomplete archive {:?}: {}", partial, remove_err);
                }
            }
            Err(e)
        }
    }
}

fn write_archive(staging: &Path, archive_path: &Path) -> Result<usize> {
    let file = File::create(archive_path).map_err(|e| ConvertError::io(archive_path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let zip_err = |source| ConvertError::Archive {
        path: archive_path.to_path_buf(),
        source,
    };

    let mut count = 0;
    for dir_name in [IMAGES_DIR, ANNOTATIONS_DIR] {
        for path in collect_files(&staging.join(dir_name)) {
            let Some(file_name) = path.file_name() else {
                continue;
            };
            let entry_name = format!("{}/{}", dir_name, file_name.to_string_lossy());
            debug!("Adding {}", entry_name);

            zip.start_file(entry_name, options).map_err(zip_err)?;
            let mut source = File::open(&path).map_err(|e| ConvertError::io(&path, e))?;
            io::copy(&mut source, &mut zip).map_err(|e| ConvertError::io(&path, e))?;
            count += 1;
        }
    }

    zip.finish().map_err(zip_err)?;
    Ok(count)
}

/// Remove the staging directories and, when asked, the source dataset
pub fn cleanup(staging: &Path, input_dir: &Path, remove_input: bool) -> Result<()> {
    remove_dir_if_exists(&staging.join(IMAGES_DIR))?;
    remove_dir_if_exists(&staging.join(ANNOTATIONS_DIR))?;

    if remove_input {
        info!("Removing input directory {:?}", input_dir);
        remove_dir_if_exists(input_dir)?;
    }
    Ok(())
}
