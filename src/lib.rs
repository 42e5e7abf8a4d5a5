//! Supervisely to Pascal VOC converter
//!
//! This library converts a Supervisely dataset (`img/` plus per-image JSON in
//! `ann/`) into Pascal VOC XML annotations and packages the result as a zip
//! archive with `JPEGImages/` and `Annotations/`.

pub mod archive;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod image_io;
pub mod types;
pub mod utils;
pub mod voc;
pub mod xml_writer;

// Re-export commonly used types and functions
pub use config::{Args, ConversionConfig};
pub use dataset::{convert_dataset, process_image, setup_output_directories, OutputDirs};
pub use error::{ConvertError, Result};
pub use extract::{extract, parse_annotation, read_annotation};
pub use types::{ImageDimensions, LabeledBox, ProcessingStats, SourceAnnotation};
pub use voc::{build, from_xml_str, AnnotationDocument};
pub use xml_writer::{to_xml_string, write_xml};
