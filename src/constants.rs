/// Size budget for stored images in bytes (1 MiB)
pub const MAX_UPLOAD_SIZE: u64 = 1024 * 1024;

/// Longest side allowed after resizing, in pixels
pub const MAX_DIMENSION: u32 = 1080;

// Quality is tracked in tenths: 8 = 0.8, 1 = 0.1
pub const INITIAL_QUALITY_TENTHS: u8 = 8;
pub const MIN_QUALITY_TENTHS: u8 = 1;
pub const MAX_QUALITY_TENTHS: u8 = 10;
pub const QUALITY_STEP_TENTHS: u8 = 1;

pub const CACHE_CONTROL: &str = "3600";
pub const DEFAULT_BUCKET: &str = "workout_images";
pub const DEFAULT_STORAGE_DIR: &str = "./storage";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/storage/v1/object/public";

pub const PROGRESS_COMPRESSING: u8 = 10;
pub const PROGRESS_COMPRESSED: u8 = 50;
pub const PROGRESS_UPLOADED: u8 = 100;

// Decoder limits applied before any pixel buffer is allocated
pub const MAX_DECODE_DIMENSION: u32 = 16384;
pub const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

/// Unicode blocks rejected in file names (Arabic, Arabic Supplement,
/// Arabic Extended-A and both Arabic presentation form blocks)
pub const UNSUPPORTED_NAME_RANGES: &[(char, char)] = &[
    ('\u{0600}', '\u{06FF}'),
    ('\u{0750}', '\u{077F}'),
    ('\u{08A0}', '\u{08FF}'),
    ('\u{FB50}', '\u{FDFF}'),
    ('\u{FE70}', '\u{FEFF}'),
];

pub const PROGRESS_BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}";

// Common output message prefixes
pub const ORIGINAL_SIZE_PREFIX: &str = "📊 Original size:";
pub const FINAL_SIZE_PREFIX: &str = "📈 Final size:";
pub const COMPRESSION_RATIO_PREFIX: &str = "🎯 Compression ratio:";
pub const SUCCESS_PREFIX: &str = "✅";
pub const INFO_PREFIX: &str = "📋";
