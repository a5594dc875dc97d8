use crate::storage::StorageError;
use thiserror::Error;

/// Failures surfaced by the upload pipeline. The `Display` text is what the
/// caller shows to the user.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file type: {0}. Please use JPEG, PNG, GIF or WEBP")]
    UnsupportedType(String),

    #[error("Invalid file name: {0}. The name must use English letters and digits only")]
    InvalidName(String),

    #[error("Image compression failed, please choose a smaller image")]
    Compression(#[source] EncodingError),

    #[error("Image upload failed, please try again")]
    Storage(#[source] StorageError),
}

/// Failures of the decode / resize / re-encode stage.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Image has no pixels: {0}x{1}")]
    EmptyImage(u32, u32),

    #[error("Byte budget must be greater than zero")]
    InvalidBudget,

    #[error("Invalid quality value: {0}. Must be between 1 and 10 tenths")]
    InvalidQuality(u8),

    #[error("Image decoding error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image encoding error: {0}")]
    Encode(String),

    #[error("Compression task interrupted: {0}")]
    Interrupted(String),
}

pub type Result<T> = std::result::Result<T, UploadError>;
