pub mod cli;
pub mod compressor;
pub mod constants;
pub mod error;
pub mod formats;
pub mod logger;
pub mod sanitize;
pub mod storage;
pub mod upload;
pub mod utils;

pub use compressor::{
    decode_image, fit_within, resize_to_fit, CompressedImage, Compressor, CompressorOptions,
    JpegQualityEncoder, LossyEncoder, Quality, SearchStrategy,
};
pub use error::{EncodingError, Result, UploadError};
pub use formats::{accept_filter, MediaType};
pub use sanitize::{sanitize_file_name, validate_file_name, Clock, FixedClock, SystemClock};
pub use storage::{
    LocalStorage, MemoryStorage, ObjectStorage, PutOptions, StorageError, StoredObject,
};
pub use upload::{
    storage_key_from_reference, ImageUploader, SourceFile, UploadResult, UploaderConfig,
};
