//! Pascal VOC annotation data structures
//!
//! This module holds the in-memory VOC document and the builder that maps
//! labeled boxes onto it. Rendering lives in `xml_writer`.

use serde::Deserialize;
use xml::reader::{EventReader, ParserConfig};

use crate::error::{ConvertError, Result};
use crate::types::{ImageDimensions, LabeledBox, VOC_DATABASE, VOC_DEPTH};

/// VOC source information
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    pub database: String,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            database: VOC_DATABASE.to_string(),
        }
    }
}

/// VOC image size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
    pub depth: u8,
}

/// VOC bounding box in whole pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BndBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

/// VOC object entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Object {
    pub name: String,
    pub bndbox: BndBox,
}

impl Object {
    pub fn from_box(labeled: &LabeledBox) -> Self {
        Self {
            name: labeled.class_name.clone(),
            bndbox: BndBox {
                xmin: round_coord(labeled.left),
                ymin: round_coord(labeled.upper),
                xmax: round_coord(labeled.right),
                ymax: round_coord(labeled.lower),
            },
        }
    }
}

/// Complete VOC annotation for one image
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnnotationDocument {
    pub folder: String,
    pub filename: String,
    pub path: String,
    pub source: Source,
    pub size: Size,
    pub segmented: u8,
    #[serde(rename = "object", default)]
    pub objects: Vec<Object>,
}

impl AnnotationDocument {
    /// Check that every field the serializer needs is present.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("folder", &self.folder),
            ("filename", &self.filename),
            ("path", &self.path),
            ("source/database", &self.source.database),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(ConvertError::malformed_document(format!(
                "missing {}",
                field
            )));
        }
        if self.size.width == 0 || self.size.height == 0 {
            return Err(ConvertError::malformed_document(format!(
                "size is {}x{}",
                self.size.width, self.size.height
            )));
        }
        if let Some(index) = self.objects.iter().position(|o| o.name.is_empty()) {
            return Err(ConvertError::malformed_document(format!(
                "object {} has no name",
                index
            )));
        }
        Ok(())
    }
}

/// Round to the nearest integer, ties to even.
pub fn round_coord(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Build a VOC document for one image from its labeled boxes.
///
/// Depth is always 3 and `segmented` always 0. Coordinates are rounded but
/// never clamped to the image bounds.
pub fn build(
    boxes: &[LabeledBox],
    target_filename: &str,
    folder: &str,
    path: &str,
    dims: ImageDimensions,
) -> Result<AnnotationDocument> {
    dims.validate()?;

    Ok(AnnotationDocument {
        folder: folder.to_string(),
        filename: target_filename.to_string(),
        path: path.to_string(),
        source: Source::default(),
        size: Size {
            width: dims.width,
            height: dims.height,
            depth: VOC_DEPTH,
        },
        segmented: 0,
        objects: boxes.iter().map(Object::from_box).collect(),
    })
}

/// Parse VOC XML back into a document.
///
/// Indentation between elements is skipped, but text content is kept as
/// written, including leading and trailing spaces.
pub fn from_xml_str(xml: &str) -> Result<AnnotationDocument> {
    let config = ParserConfig::new()
        .trim_whitespace(false)
        .whitespace_to_characters(false)
        .cdata_to_characters(true)
        .ignore_comments(true)
        .coalesce_characters(true);
    let mut deserializer =
        serde_xml_rs::Deserializer::new(EventReader::new_with_config(xml.as_bytes(), config));
    AnnotationDocument::deserialize(&mut deserializer)
        .map_err(|e| ConvertError::malformed_document(e.to_string()))
}
