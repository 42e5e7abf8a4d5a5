//! Error types for the conversion pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while converting a Supervisely dataset to Pascal VOC.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source annotation is missing required fields or is structurally wrong.
    #[error("malformed annotation: {message}")]
    MalformedInput { message: String },

    /// The image extension is not one the converter can decode.
    #[error("unsupported image format: {}", path.display())]
    UnsupportedImageFormat { path: PathBuf },

    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The annotation document cannot be rendered or parsed.
    #[error("malformed annotation document: {reason}")]
    MalformedDocument { reason: String },

    #[error("image {}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two images would produce the same `<name>.jpg` / `<name>.xml`.
    #[error("output name {name:?} is already used by {first}")]
    DuplicateOutput { name: String, first: String },

    #[error("failed to write annotation document")]
    Write(#[source] std::io::Error),

    #[error("xml writer")]
    Xml(#[from] xml::writer::Error),

    #[error("archive {}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Wraps a failure with the name of the image being converted.
    #[error("failed to convert {image}")]
    Item {
        image: String,
        #[source]
        source: Box<ConvertError>,
    },
}

impl ConvertError {
    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    pub fn malformed_document(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the image name to an error raised while converting it.
    pub fn for_image(self, image: impl Into<String>) -> Self {
        Self::Item {
            image: image.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any `Item` context wrappers.
    pub fn root(&self) -> &ConvertError {
        match self {
            Self::Item { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
