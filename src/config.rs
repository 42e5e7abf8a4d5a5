use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use crate::image_io::DEFAULT_JPEG_QUALITY;
use crate::types::DEFAULT_IMG_FORMATS;

/// Command-line arguments parser for converting Supervisely JSON to Pascal VOC.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Supervisely dataset directory containing `img/` and `ann/`
    #[arg(short = 'i', long = "input_dir")]
    pub input_dir: String,

    /// Directory that receives the zip archive
    #[arg(short = 'o', long = "output_dir")]
    pub output_dir: String,

    /// Image extensions to convert, matched case-sensitively
    #[arg(
        long = "extensions",
        value_delimiter = ',',
        default_values_t = DEFAULT_IMG_FORMATS.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        value_parser = validate_extension
    )]
    pub extensions: Vec<String>,

    /// Quality of the re-encoded JPEG images
    #[arg(long = "jpeg_quality", default_value_t = DEFAULT_JPEG_QUALITY, value_parser = validate_quality)]
    pub jpeg_quality: u8,

    /// Delete the input directory after a successful conversion
    #[arg(long = "cleanup")]
    pub cleanup: bool,

    /// Skip images that fail to convert instead of aborting the batch
    #[arg(long = "skip_invalid")]
    pub skip_invalid: bool,
}

impl Args {
    pub fn to_conversion_config(&self) -> ConversionConfig {
        ConversionConfig {
            input_dir: PathBuf::from(&self.input_dir),
            output_dir: PathBuf::from(&self.output_dir),
            extensions: self.extensions.clone(),
            jpeg_quality: self.jpeg_quality,
            cleanup: self.cleanup,
            skip_invalid: self.skip_invalid,
        }
    }
}

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Extensions (without the dot) the dataset walker accepts
    pub extensions: Vec<String>,
    pub jpeg_quality: u8,
    pub cleanup: bool,
    pub skip_invalid: bool,
}

impl ConversionConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            extensions: DEFAULT_IMG_FORMATS.iter().map(|s| s.to_string()).collect(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            cleanup: false,
            skip_invalid: false,
        }
    }

    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|allowed| allowed == ext)
    }
}

// Validate that the quality is between 1 and 100
pub fn validate_quality(s: &str) -> Result<u8, String> {
    match u8::from_str(s) {
        Ok(val) if (1..=100).contains(&val) => Ok(val),
        _ => Err("QUALITY must be between 1 and 100".to_string()),
    }
}

// Accept "jpg" or ".jpg", store without the dot
pub fn validate_extension(s: &str) -> Result<String, String> {
    let ext = s.trim().trim_start_matches('.');
    if ext.is_empty() || ext.contains(['/', '\\', '.']) {
        Err(format!("invalid image extension: {:?}", s))
    } else {
        Ok(ext.to_string())
    }
}
