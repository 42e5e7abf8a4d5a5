use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::types::ImageDimensions;

pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Map an image path to a format this build can decode
pub fn source_format(path: &Path) -> Result<ImageFormat> {
    match ImageFormat::from_path(path) {
        Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => Ok(format),
        _ => Err(ConvertError::UnsupportedImageFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Re-encode `source` as a JPEG at `target` and return the written image's size.
pub fn convert_image(source: &Path, target: &Path, quality: u8) -> Result<ImageDimensions> {
    source_format(source)?;

    // The extension only gates the file; the decoder follows the content
    let reader = ImageReader::open(source)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| ConvertError::io(source, e))?;
    let format = reader.format();
    let image = reader.decode().map_err(|e| ConvertError::Image {
        path: source.to_path_buf(),
        source: e,
    })?;
    debug!(
        "Decoded {:?} ({:?}, {}x{})",
        source,
        format,
        image.width(),
        image.height()
    );

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

    let mut writer = BufWriter::new(File::create(target).map_err(|e| ConvertError::io(target, e))?);
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))
        .map_err(|e| ConvertError::Image {
            path: target.to_path_buf(),
            source: e,
        })?;
    writer.flush().map_err(|e| ConvertError::io(target, e))?;
    drop(writer);

    read_dimensions(target)
}

/// Read the pixel size of an image file without decoding the whole image
pub fn read_dimensions(path: &Path) -> Result<ImageDimensions> {
    let (width, height) = image::image_dimensions(path).map_err(|e| ConvertError::Image {
        path: path.to_path_buf(),
        source: e,
    })?;
    ImageDimensions::new(width, height)
}
