//! Validated image uploads.
//!
//! An upload is accepted only when its bytes decode as an image. The stored
//! file keeps the extension of the uploaded file name, falling back to the
//! detected format when the name has none.
//!
//! Decoding is bounded: oversized dimensions or allocations are refused before
//! pixel buffers are allocated. Validation is CPU bound and callers on an
//! async executor should run it on a blocking thread.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use image::{ImageError, ImageReader, Limits};

use super::experience::ImagePath;

/// Longest accepted file extension.
const EXTENSION_MAX: usize = 10;

/// Widest and tallest accepted image, in pixels.
const MAX_IMAGE_DIMENSION: u32 = 8192;

/// Largest allocation the decoder may make.
const MAX_DECODE_ALLOC: u64 = 128 * 1024 * 1024;

/// Reasons an upload is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageValidationError {
    /// No bytes were uploaded.
    Empty,
    /// The bytes are not a decodable image.
    NotAnImage { reason: String },
    /// The image exceeds the decoding limits.
    TooLarge { reason: String },
}

impl fmt::Display for ImageValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "the submitted file is empty"),
            Self::NotAnImage { reason } => write!(
                f,
                "upload a valid image: the file was either not an image or corrupted ({reason})"
            ),
            Self::TooLarge { reason } => write!(f, "the image is too large to process ({reason})"),
        }
    }
}

impl std::error::Error for ImageValidationError {}

/// Image bytes that decoded successfully, with their target extension.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    bytes: Vec<u8>,
    extension: String,
}

impl ImageUpload {
    /// Decode `bytes` to prove they form an image.
    ///
    /// # Examples
    /// ```
    /// use experiences::domain::ImageUpload;
    ///
    /// assert!(ImageUpload::validate(Some("notimage.txt"), b"notimage".to_vec()).is_err());
    /// ```
    pub fn validate(file_name: Option<&str>, bytes: Vec<u8>) -> Result<Self, ImageValidationError> {
        if bytes.is_empty() {
            return Err(ImageValidationError::Empty);
        }
        let mut reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|err| ImageValidationError::NotAnImage {
                reason: err.to_string(),
            })?;
        let format = reader.format().ok_or_else(|| ImageValidationError::NotAnImage {
            reason: "the image format could not be determined".to_owned(),
        })?;
        reader.limits(decode_limits());
        reader.decode().map_err(|err| match err {
            ImageError::Limits(limit) => ImageValidationError::TooLarge {
                reason: limit.to_string(),
            },
            other => ImageValidationError::NotAnImage {
                reason: other.to_string(),
            },
        })?;
        let extension = file_name
            .and_then(extension_of)
            .or_else(|| format.extensions_str().first().map(|ext| (*ext).to_owned()))
            .unwrap_or_else(|| "img".to_owned());
        Ok(Self { bytes, extension })
    }

    /// Lowercase extension, without the dot.
    pub fn extension(&self) -> &str {
        self.extension.as_str()
    }

    /// Raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Fresh storage path for this upload.
    pub fn target_path(&self) -> ImagePath {
        ImagePath::generate(&self.extension)
    }
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("len", &self.bytes.len())
            .field("extension", &self.extension)
            .finish()
    }
}

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

fn extension_of(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    let valid = !ext.is_empty()
        && ext.len() <= EXTENSION_MAX
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}
