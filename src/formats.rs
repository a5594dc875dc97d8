//! Media types accepted by the upload pipeline
//!
//! Two lossy photo formats (JPEG, WebP), one lossless format (PNG) and one
//! animated format (GIF). Anything else is rejected before decoding.

use crate::error::UploadError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// JPEG photo
    Jpeg,
    /// WebP photo
    WebP,
    /// PNG, lossless
    Png,
    /// GIF, possibly animated
    Gif,
}

impl MediaType {
    /// Every accepted type, in the order shown to the user
    pub const ALL: [MediaType; 4] = [
        MediaType::Jpeg,
        MediaType::Png,
        MediaType::Gif,
        MediaType::WebP,
    ];

    /// Parses a declared MIME type. Case-insensitive; parameters such as
    /// `; charset=...` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            "image/gif" => Some(MediaType::Gif),
            "image/webp" => Some(MediaType::WebP),
            _ => None,
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            "gif" => Some(MediaType::Gif),
            "webp" => Some(MediaType::WebP),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::WebP => "image/webp",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaType::Jpeg => "JPEG",
            MediaType::Png => "PNG",
            MediaType::Gif => "GIF",
            MediaType::WebP => "WebP",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for MediaType {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::from_mime(s).ok_or_else(|| UploadError::UnsupportedType(s.to_string()))
    }
}

/// Comma-separated MIME list for a file picker's accept filter
pub fn accept_filter() -> String {
    MediaType::ALL
        .iter()
        .map(MediaType::mime)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_mime() {
        assert_eq!(MediaType::from_mime("image/jpeg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime("IMAGE/PNG"), Some(MediaType::Png));
        assert_eq!(MediaType::from_mime("image/gif"), Some(MediaType::Gif));
        assert_eq!(
            MediaType::from_mime("image/webp; q=0.9"),
            Some(MediaType::WebP)
        );

        assert_eq!(MediaType::from_mime("application/pdf"), None);
        assert_eq!(MediaType::from_mime("image/bmp"), None);
        assert_eq!(MediaType::from_mime(""), None);
    }

    #[test]
    fn test_media_type_from_str_error() {
        let result = MediaType::from_str("application/pdf");
        assert!(matches!(result, Err(UploadError::UnsupportedType(t)) if t == "application/pdf"));
    }

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(MediaType::from_extension("JPG"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_extension("jpeg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_extension("webp"), Some(MediaType::WebP));
        assert_eq!(MediaType::from_extension("tiff"), None);
    }

    #[test]
    fn test_accept_filter() {
        assert_eq!(accept_filter(), "image/jpeg,image/png,image/gif,image/webp");
    }

    #[test]
    fn test_media_type_display() {
        assert_eq!(format!("{}", MediaType::Jpeg), "JPEG");
        assert_eq!(format!("{}", MediaType::WebP), "WebP");
    }
}
