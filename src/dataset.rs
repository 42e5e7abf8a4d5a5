use glob::glob;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::archive::{archive_outputs, cleanup};
use crate::config::ConversionConfig;
use crate::error::{ConvertError, Result};
use crate::extract::{extract, read_annotation};
use crate::image_io::convert_image;
use crate::types::{ProcessingStats, ANNOTATIONS_DIR, IMAGES_DIR};
use crate::utils::{archive_file_name, create_output_directory, create_progress_bar};
use crate::voc::build;
use crate::xml_writer::to_xml_string;

/// Struct to hold the paths to the staging directories
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub annotations_dir: PathBuf,
}

/// Set up the staging directories below the output directory
pub fn setup_output_directories(output_dir: &Path) -> Result<OutputDirs> {
    fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;
    Ok(OutputDirs {
        root: output_dir.to_path_buf(),
        images_dir: create_output_directory(&output_dir.join(IMAGES_DIR))?,
        annotations_dir: create_output_directory(&output_dir.join(ANNOTATIONS_DIR))?,
    })
}

/// List the images in `img_dir` whose extension is allowed.
///
/// Returns the accepted paths sorted by name and the number of files skipped.
pub fn collect_images(img_dir: &Path, config: &ConversionConfig) -> Result<(Vec<PathBuf>, usize)> {
    if !img_dir.is_dir() {
        return Err(ConvertError::io(
            img_dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "image directory not found"),
        ));
    }

    let pattern = format!("{}/*", glob::Pattern::escape(&img_dir.to_string_lossy()));
    let entries = glob(&pattern).map_err(|e| ConvertError::io(img_dir, std::io::Error::other(e)))?;

    let mut images = Vec::new();
    let mut skipped = 0;
    for path in entries.filter_map(|entry| entry.ok()).filter(|p| p.is_file()) {
        let accepted = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| config.accepts_extension(ext));
        if accepted {
            images.push(path);
        } else {
            debug!("Skipping unsupported file {:?}", path);
            skipped += 1;
        }
    }
    images.sort();
    Ok((images, skipped))
}

/// Annotation file for an image: `ann/<file name with extension>.json`
pub fn annotation_path(input_dir: &Path, image_path: &Path) -> PathBuf {
    let mut name = image_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".json");
    input_dir.join("ann").join(name)
}

/// Base name shared by an image's `.jpg` and `.xml` outputs: its file stem, unchanged.
pub fn output_stem(image_path: &Path) -> Result<String> {
    image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConvertError::malformed_input(format!("invalid image name {:?}", image_path)))
}

/// Convert one image and its annotation into the staging directories.
///
/// Records are extracted before anything is written, so a malformed
/// annotation leaves no output for this image. Returns the object count.
pub fn process_image(
    image_path: &Path,
    config: &ConversionConfig,
    output_dirs: &OutputDirs,
) -> Result<usize> {
    let stem = output_stem(image_path)?;

    let annotation = read_annotation(&annotation_path(&config.input_dir, image_path))?;
    let boxes = extract(&annotation)?;

    let target_filename = format!("{}.jpg", stem);
    let target_path = output_dirs.images_dir.join(&target_filename);
    let dims = convert_image(image_path, &target_path, config.jpeg_quality)?;

    if let Some(declared) = annotation.size {
        if declared.width != dims.width || declared.height != dims.height {
            warn!(
                "Annotation size {}x{} differs from image size {}x{} for {:?}",
                declared.width, declared.height, dims.width, dims.height, image_path
            );
        }
    }

    let folder = output_dirs
        .images_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| IMAGES_DIR.to_string());
    let doc = build(
        &boxes,
        &target_filename,
        &folder,
        &target_path.to_string_lossy(),
        dims,
    )?;
    let xml = to_xml_string(&doc)?;

    let xml_path = output_dirs.annotations_dir.join(format!("{}.xml", stem));
    fs::write(&xml_path, xml).map_err(|e| ConvertError::io(&xml_path, e))?;

    Ok(doc.objects.len())
}

// Drop whatever a failed image left in the staging directories
fn remove_partial_outputs(stem: &str, output_dirs: &OutputDirs) {
    for path in [
        output_dirs.images_dir.join(format!("{}.jpg", stem)),
        output_dirs.annotations_dir.join(format!("{}.xml", stem)),
    ] {
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove partial output {:?}: {}", path, e);
            }
        }
    }
}

/// Convert every image of the dataset into the staging directories.
pub fn process_images(
    images: &[PathBuf],
    config: &ConversionConfig,
    output_dirs: &OutputDirs,
    stats: &mut ProcessingStats,
) -> Result<()> {
    let pb = create_progress_bar(images.len() as u64, "Convert");
    // Output stem -> image file that produced it
    let mut claimed: HashMap<String, String> = HashMap::new();

    for image_path in images {
        let name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Only converted images claim a stem
        let claim = output_stem(image_path).and_then(|stem| match claimed.get(&stem) {
            Some(first) => Err(ConvertError::DuplicateOutput {
                name: stem,
                first: first.clone(),
            }),
            None => Ok(stem),
        });
        let stem = match claim {
            Ok(stem) => stem,
            Err(e) if config.skip_invalid => {
                error!("Skipping {}: {}", name, e);
                stats.increment_failed();
                pb.inc(1);
                continue;
            }
            Err(e) => {
                pb.abandon_with_message("aborted");
                return Err(e.for_image(name));
            }
        };

        match process_image(image_path, config, output_dirs) {
            Ok(objects) => {
                debug!("Converted {} ({} objects)", name, objects);
                stats.record_success(objects);
                claimed.insert(stem, name);
            }
            Err(e) if config.skip_invalid => {
                error!("Skipping {}: {}", name, e);
                remove_partial_outputs(&stem, output_dirs);
                stats.increment_failed();
            }
            Err(e) => {
                pb.abandon_with_message("aborted");
                return Err(e.for_image(name));
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("done");
    Ok(())
}

/// Main conversion pipeline: stage every image, then write the archive.
pub fn convert_dataset(config: &ConversionConfig) -> Result<ProcessingStats> {
    let start = Instant::now();
    let mut stats = ProcessingStats::new();

    info!("Creating output folder structure in {:?}", config.output_dir);
    let output_dirs = setup_output_directories(&config.output_dir)?;

    info!("Counting available images...");
    let (images, skipped) = collect_images(&config.input_dir.join("img"), config)?;
    stats.images_found = images.len();
    stats.skipped_unsupported = skipped;

    info!("Starting conversion process for {} images", images.len());
    process_images(&images, config, &output_dirs, &mut stats)?;

    let zip_path = output_dirs.root.join(archive_file_name(&config.input_dir));
    info!("Creating archive {:?}", zip_path);
    archive_outputs(&output_dirs.root, &zip_path)?;

    cleanup(&output_dirs.root, &config.input_dir, config.cleanup)?;

    stats.print_summary();
    info!(
        "Conversion time: {:.2} seconds",
        start.elapsed().as_secs_f64()
    );
    Ok(stats)
}
