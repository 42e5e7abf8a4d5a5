//! Decoding of Supervisely annotation files into labeled boxes.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::types::{LabeledBox, SourceAnnotation};

/// Read and decode a single Supervisely JSON annotation file.
pub fn read_annotation(path: &Path) -> Result<SourceAnnotation> {
    let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| ConvertError::malformed_input(format!("{}: {}", path.display(), e)))
}

/// Decode a Supervisely annotation held in memory.
pub fn parse_annotation(json: &str) -> Result<SourceAnnotation> {
    serde_json::from_str(json).map_err(|e| ConvertError::malformed_input(e.to_string()))
}

/// Turn every object of an annotation unit into a `LabeledBox`.
///
/// The first exterior point becomes `(left, upper)` and the second
/// `(right, lower)`; any further points are ignored. Corners are passed
/// through unchanged, so a box drawn from bottom-right to top-left stays
/// inverted. One bad object fails the whole unit.
pub fn extract(annotation: &SourceAnnotation) -> Result<Vec<LabeledBox>> {
    annotation
        .objects
        .iter()
        .enumerate()
        .map(|(index, object)| {
            if object.class_title.is_empty() {
                return Err(ConvertError::malformed_input(format!(
                    "object {} has an empty classTitle",
                    index
                )));
            }

            match object.points.exterior.as_slice() {
                [[left, upper], [right, lower], ..] => Ok(LabeledBox {
                    class_name: object.class_title.clone(),
                    left: *left,
                    upper: *upper,
                    right: *right,
                    lower: *lower,
                }),
                points => Err(ConvertError::malformed_input(format!(
                    "object {} ({}) has {} exterior point(s), expected at least 2",
                    index,
                    object.class_title,
                    points.len()
                ))),
            }
        })
        .collect()
}
