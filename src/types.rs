use serde::Deserialize;

use crate::error::{ConvertError, Result};

// Image extensions accepted by default, matched case-sensitively
pub const DEFAULT_IMG_FORMATS: &[&str] = &["jpg", "JPG", "png", "PNG"];

// Channel count written to every VOC document
pub const VOC_DEPTH: u8 = 3;

// Placeholder for the VOC source/database element
pub const VOC_DATABASE: &str = "None";

// Directory names inside the output archive
pub const IMAGES_DIR: &str = "JPEGImages";
pub const ANNOTATIONS_DIR: &str = "Annotations";

// The SourceAnnotation struct representing one Supervisely annotation file
#[derive(Debug, Deserialize, Clone)]
pub struct SourceAnnotation {
    pub objects: Vec<SourceObject>,
    #[serde(default)]
    pub size: Option<SourceSize>,
}

// The SourceObject struct representing one labeled object
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SourceObject {
    pub class_title: String,
    pub points: SourcePoints,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcePoints {
    pub exterior: Vec<[f64; 2]>,
    #[serde(default)]
    pub interior: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SourceSize {
    pub width: u32,
    pub height: u32,
}

/// A labeled rectangle given by two opposite corners in source pixel space.
///
/// The corners are kept exactly as the source lists them, so `left > right`
/// or `upper > lower` is possible.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBox {
    pub class_name: String,
    pub left: f64,
    pub upper: f64,
    pub right: f64,
    pub lower: f64,
}

/// Pixel dimensions of a decoded target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let dims = Self { width, height };
        dims.validate()?;
        Ok(dims)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConvertError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub images_found: usize,
    pub images_converted: usize,
    pub skipped_unsupported: usize,
    pub failed_conversions: usize,
    pub objects_written: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, objects: usize) {
        self.images_converted += 1;
        self.objects_written += objects;
    }

    pub fn increment_failed(&mut self) {
        self.failed_conversions += 1;
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Images found: {}", self.images_found);
        log::info!("Images converted: {}", self.images_converted);
        log::info!("Objects written: {}", self.objects_written);
        log::info!(
            "Skipped (unsupported extension): {}",
            self.skipped_unsupported
        );

        if self.failed_conversions > 0 {
            log::warn!("Failed conversions: {}", self.failed_conversions);
        }
    }
}
