use crate::constants::{
    INITIAL_QUALITY_TENTHS, MAX_DECODE_ALLOC, MAX_DECODE_DIMENSION, MAX_DIMENSION,
    MAX_QUALITY_TENTHS, MIN_QUALITY_TENTHS, QUALITY_STEP_TENTHS,
};
use crate::error::EncodingError;
use crate::formats::MediaType;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{
    DynamicImage, ExtendedColorType, GenericImageView, ImageReader, Limits, Rgb, RgbImage, Rgba,
};
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

/// Lossy encoding quality in tenths, from 0.1 to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const INITIAL: Quality = Quality(INITIAL_QUALITY_TENTHS);
    pub const FLOOR: Quality = Quality(MIN_QUALITY_TENTHS);

    pub fn from_tenths(tenths: u8) -> Result<Self, EncodingError> {
        if !(MIN_QUALITY_TENTHS..=MAX_QUALITY_TENTHS).contains(&tenths) {
            return Err(EncodingError::InvalidQuality(tenths));
        }
        Ok(Quality(tenths))
    }

    pub fn tenths(&self) -> u8 {
        self.0
    }

    pub fn as_f32(&self) -> f32 {
        f32::from(self.0) / 10.0
    }

    /// Quality on the 1..=100 scale used by encoders
    pub fn encoder_value(&self) -> u8 {
        self.0 * 10
    }

    fn step_down(self) -> Option<Quality> {
        let next = self.0.checked_sub(QUALITY_STEP_TENTHS)?;
        (next >= MIN_QUALITY_TENTHS).then_some(Quality(next))
    }

    fn is_floor(&self) -> bool {
        self.0 <= MIN_QUALITY_TENTHS
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.as_f32())
    }
}

/// A lossy encode primitive the quality search drives
pub trait LossyEncoder: Send + Sync {
    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, EncodingError>;

    /// Media type of the bytes `encode` produces
    fn media_type(&self) -> MediaType;
}

/// Baseline JPEG through the `image` crate. Transparent pixels are
/// composited onto white.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegQualityEncoder;

/// Flattens alpha onto a white background
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let blend = |c: u8| -> u8 {
            let (c, a) = (u32::from(c), u32::from(a));
            ((c * a + 255 * (255 - a) + 127) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}

impl LossyEncoder for JpegQualityEncoder {
    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, EncodingError> {
        let rgb = flatten_onto_white(image);
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.encoder_value());
        encoder
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| EncodingError::Encode(e.to_string()))?;

        if buf.is_empty() {
            return Err(EncodingError::Encode("encoder produced no output".to_string()));
        }
        Ok(buf)
    }

    fn media_type(&self) -> MediaType {
        MediaType::Jpeg
    }
}

/// How the compressor walks the quality range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// Step down from the initial quality one tenth at a time
    #[default]
    Linear,
    /// Try the initial quality, then binary-search the rest of the range
    Bisection,
}

#[derive(Debug, Clone)]
pub struct CompressorOptions {
    pub max_dimension: u32,
    pub initial_quality: Quality,
    pub strategy: SearchStrategy,
}

impl Default for CompressorOptions {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            initial_quality: Quality::INITIAL,
            strategy: SearchStrategy::Linear,
        }
    }
}

impl CompressorOptions {
    pub fn new(
        max_dimension: Option<u32>,
        initial_quality: Option<u8>,
        strategy: Option<SearchStrategy>,
    ) -> Result<Self, EncodingError> {
        let initial_quality = match initial_quality {
            Some(tenths) => Quality::from_tenths(tenths)?,
            None => Quality::INITIAL,
        };

        Ok(Self {
            max_dimension: max_dimension.filter(|&d| d > 0).unwrap_or(MAX_DIMENSION),
            initial_quality,
            strategy: strategy.unwrap_or_default(),
        })
    }
}

/// Output of a finished quality search
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub quality: Quality,
    pub attempts: u32,
    pub width: u32,
    pub height: u32,
    pub media_type: MediaType,
}

impl CompressedImage {
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Scales `(width, height)` down so the larger side equals `max`, keeping the
/// aspect ratio. Sizes already within `max` are returned unchanged, and a
/// `max` of zero disables the cap.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if max == 0 || (width <= max && height <= max) {
        return (width, height);
    }

    let scale = |side: u32, long_side: u32| -> u32 {
        let scaled = (f64::from(side) * f64::from(max) / f64::from(long_side)).round() as u32;
        scaled.clamp(1, max)
    };

    if width > height {
        (max, scale(height, width))
    } else {
        (scale(width, height), max)
    }
}

/// Resizes in place when either side exceeds `max_dimension`. Never upscales.
pub fn resize_to_fit(img: &mut DynamicImage, max_dimension: u32) {
    let (width, height) = img.dimensions();
    let (new_width, new_height) = fit_within(width, height, max_dimension);
    if (new_width, new_height) != (width, height) {
        tracing::debug!(width, height, new_width, new_height, "resizing image");
        *img = img.resize_exact(new_width, new_height, FilterType::Lanczos3);
    }
}

/// Decodes an in-memory image, guessing the format from its content.
///
/// # Security
/// - Caps decoded width/height and total decoder allocation so a small
///   file cannot expand into an unbounded pixel buffer
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, EncodingError> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_DIMENSION);
    limits.max_image_height = Some(MAX_DECODE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);

    let mut reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| EncodingError::Decode(image::ImageError::IoError(e)))?;
    reader.limits(limits);
    Ok(reader.decode()?)
}

/// Re-encodes images under a byte budget.
///
/// Cheap to clone; the encoder is shared.
#[derive(Clone)]
pub struct Compressor {
    encoder: Arc<dyn LossyEncoder>,
    options: CompressorOptions,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(CompressorOptions::default())
    }
}

impl fmt::Debug for Compressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compressor")
            .field("media_type", &self.encoder.media_type())
            .field("options", &self.options)
            .finish()
    }
}

impl Compressor {
    pub fn new(options: CompressorOptions) -> Self {
        Self::with_encoder(JpegQualityEncoder, options)
    }

    pub fn with_encoder(encoder: impl LossyEncoder + 'static, options: CompressorOptions) -> Self {
        Self {
            encoder: Arc::new(encoder),
            options,
        }
    }

    pub fn options(&self) -> &CompressorOptions {
        &self.options
    }

    /// Decodes `data` and runs [`Compressor::compress`] on the result.
    pub fn compress_bytes(
        &self,
        data: &[u8],
        max_bytes: u64,
    ) -> Result<CompressedImage, EncodingError> {
        let image = decode_image(data)?;
        self.compress(&image, max_bytes)
    }

    /// Resizes to the dimension cap, then searches for the highest quality
    /// whose output fits in `max_bytes`.
    ///
    /// If even the floor quality (0.1) does not fit, the floor result is
    /// returned anyway; callers must not assume the budget was met.
    ///
    /// # Errors
    /// * `EmptyImage` if either side is zero
    /// * `InvalidBudget` if `max_bytes` is zero
    /// * `Encode` if the encoder produced no output at some quality
    pub fn compress(
        &self,
        image: &DynamicImage,
        max_bytes: u64,
    ) -> Result<CompressedImage, EncodingError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(EncodingError::EmptyImage(width, height));
        }
        if max_bytes == 0 {
            return Err(EncodingError::InvalidBudget);
        }

        let mut img = image.clone();
        resize_to_fit(&mut img, self.options.max_dimension);

        let mut search = Search {
            encoder: self.encoder.as_ref(),
            image: &img,
            max_bytes,
            attempts: 0,
        };
        let (quality, bytes) = match self.options.strategy {
            SearchStrategy::Linear => search.linear(self.options.initial_quality)?,
            SearchStrategy::Bisection => search.bisection(self.options.initial_quality)?,
        };

        tracing::debug!(
            quality = %quality,
            attempts = search.attempts,
            size_bytes = bytes.len(),
            max_bytes,
            "quality search finished"
        );

        Ok(CompressedImage {
            bytes,
            quality,
            attempts: search.attempts,
            width: img.width(),
            height: img.height(),
            media_type: self.encoder.media_type(),
        })
    }
}

struct Search<'a> {
    encoder: &'a dyn LossyEncoder,
    image: &'a DynamicImage,
    max_bytes: u64,
    attempts: u32,
}

impl Search<'_> {
    fn attempt(&mut self, quality: Quality) -> Result<Vec<u8>, EncodingError> {
        self.attempts += 1;
        let bytes = self.encoder.encode(self.image, quality)?;
        tracing::debug!(
            quality = %quality,
            size_bytes = bytes.len(),
            attempt = self.attempts,
            "compression attempt"
        );
        Ok(bytes)
    }

    fn fits(&self, bytes: &[u8]) -> bool {
        bytes.len() as u64 <= self.max_bytes
    }

    fn linear(&mut self, start: Quality) -> Result<(Quality, Vec<u8>), EncodingError> {
        let mut quality = start;
        loop {
            let bytes = self.attempt(quality)?;
            if self.fits(&bytes) || quality.is_floor() {
                return Ok((quality, bytes));
            }
            match quality.step_down() {
                Some(next) => quality = next,
                None => return Ok((quality, bytes)),
            }
        }
    }

    fn bisection(&mut self, start: Quality) -> Result<(Quality, Vec<u8>), EncodingError> {
        let first = self.attempt(start)?;
        if self.fits(&first) || start.is_floor() {
            return Ok((start, first));
        }

        // Highest fitting quality in [floor, start - 1]
        let mut low = MIN_QUALITY_TENTHS;
        let mut high = start.tenths() - QUALITY_STEP_TENTHS;
        let mut best: Option<(Quality, Vec<u8>)> = None;
        let mut floor_bytes: Option<Vec<u8>> = None;

        while low <= high {
            let mid = Quality(low + (high - low) / 2);
            let bytes = self.attempt(mid)?;
            if self.fits(&bytes) {
                low = mid.tenths() + 1;
                best = Some((mid, bytes));
            } else if mid.is_floor() {
                floor_bytes = Some(bytes);
                break;
            } else {
                high = mid.tenths() - 1;
            }
        }

        if let Some(found) = best {
            return Ok(found);
        }
        let bytes = match floor_bytes {
            Some(bytes) => bytes,
            None => self.attempt(Quality::FLOOR)?,
        };
        Ok((Quality::FLOOR, bytes))
    }
}
