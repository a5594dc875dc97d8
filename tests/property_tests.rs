use image::DynamicImage;
use proptest::prelude::*;
use workout_images::{
    fit_within, sanitize_file_name, validate_file_name, Compressor, CompressorOptions,
    EncodingError, LossyEncoder, MediaType, Quality, SearchStrategy,
};

/// Output length is `base + per_tenth * quality`, independent of the pixels
struct SyntheticEncoder {
    base: usize,
    per_tenth: usize,
}

impl LossyEncoder for SyntheticEncoder {
    fn encode(&self, _image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, EncodingError> {
        Ok(vec![0u8; self.base + self.per_tenth * quality.tenths() as usize])
    }

    fn media_type(&self) -> MediaType {
        MediaType::Jpeg
    }
}

fn search_strategy() -> impl Strategy<Value = SearchStrategy> {
    prop_oneof![Just(SearchStrategy::Linear), Just(SearchStrategy::Bisection)]
}

proptest! {
    #[test]
    fn resize_preserves_aspect_ratio(
        width in 1u32..=20_000u32,
        height in 1u32..=20_000u32
    ) {
        let long = width.max(height);
        let short = width.min(height);
        prop_assume!(long > 1080);
        // Keep the short side from being clamped to a single pixel
        prop_assume!(u64::from(short) * 1080 >= u64::from(long));

        let (w, h) = fit_within(width, height, 1080);

        prop_assert_eq!(w.max(h), 1080);
        // |w/h - width/height| within half a pixel of rounding on the short side
        let diff = (u64::from(w) * u64::from(height)).abs_diff(u64::from(h) * u64::from(width));
        prop_assert!(2 * diff <= u64::from(long));
    }

    #[test]
    fn resize_never_upscales(width in 1u32..=1080u32, height in 1u32..=1080u32) {
        prop_assert_eq!(fit_within(width, height, 1080), (width, height));
    }

    #[test]
    fn search_terminates_within_eight_trials(
        base in 0usize..5_000usize,
        per_tenth in 0usize..5_000usize,
        max_bytes in 1u64..60_000u64,
        strategy in search_strategy()
    ) {
        let options = CompressorOptions::new(None, None, Some(strategy)).unwrap();
        let compressor = Compressor::with_encoder(SyntheticEncoder { base, per_tenth }, options);

        let result = compressor.compress(&DynamicImage::new_rgb8(4, 4), max_bytes).unwrap();

        prop_assert!(result.attempts >= 1 && result.attempts <= 8);
        prop_assert!(result.len() <= max_bytes || result.quality == Quality::FLOOR);
    }

    #[test]
    fn linear_search_picks_highest_fitting_quality(
        per_tenth in 1usize..1_000usize,
        max_bytes in 1u64..10_000u64
    ) {
        let options = CompressorOptions::new(None, None, Some(SearchStrategy::Linear)).unwrap();
        let compressor = Compressor::with_encoder(SyntheticEncoder { base: 0, per_tenth }, options);

        let result = compressor.compress(&DynamicImage::new_rgb8(4, 4), max_bytes).unwrap();

        if result.quality < Quality::INITIAL && result.len() <= max_bytes {
            // One tenth higher would not have fit
            let above = per_tenth as u64 * u64::from(result.quality.tenths() + 1);
            prop_assert!(above > max_bytes);
        }
    }

    #[test]
    fn bisection_matches_linear_choice(
        per_tenth in 1usize..1_000usize,
        max_bytes in 1u64..10_000u64
    ) {
        let img = DynamicImage::new_rgb8(4, 4);
        let linear = Compressor::with_encoder(
            SyntheticEncoder { base: 0, per_tenth },
            CompressorOptions::new(None, None, Some(SearchStrategy::Linear)).unwrap(),
        );
        let bisection = Compressor::with_encoder(
            SyntheticEncoder { base: 0, per_tenth },
            CompressorOptions::new(None, None, Some(SearchStrategy::Bisection)).unwrap(),
        );

        let a = linear.compress(&img, max_bytes).unwrap();
        let b = bisection.compress(&img, max_bytes).unwrap();
        prop_assert_eq!(a.quality, b.quality);
        prop_assert_eq!(a.len(), b.len());
    }

    #[test]
    fn sanitize_is_deterministic(name in "\\PC{0,40}", ts in 0i64..4_102_444_800_000i64) {
        prop_assert_eq!(sanitize_file_name(&name, ts), sanitize_file_name(&name, ts));
    }

    #[test]
    fn sanitize_differs_across_milliseconds(
        name in "\\PC{0,40}",
        ts in 0i64..4_102_444_800_000i64,
        delta in 1i64..1_000_000i64
    ) {
        prop_assert_ne!(sanitize_file_name(&name, ts), sanitize_file_name(&name, ts + delta));
    }

    #[test]
    fn sanitize_strips_stem_to_alphanumerics(
        stem in "[^.]{0,30}",
        ext in "[a-z]{1,4}",
        ts in 0i64..4_102_444_800_000i64
    ) {
        let name = format!("{}.{}", stem, ext);
        let suffix = format!("_{}.{}", ts, ext);

        let sanitized = sanitize_file_name(&name, ts);
        let sanitized_stem = sanitized.strip_suffix(&suffix).unwrap();

        prop_assert_eq!(sanitized_stem.chars().count(), stem.chars().count());
        prop_assert!(sanitized_stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn sanitize_keeps_clean_names(
        stem in "[A-Za-z0-9]{1,30}",
        ext in "[a-z]{2,4}",
        ts in 0i64..4_102_444_800_000i64
    ) {
        let name = format!("{}.{}", stem, ext);
        prop_assert_eq!(sanitize_file_name(&name, ts), format!("{}_{}.{}", stem, ts, ext));
    }

    #[test]
    fn arabic_characters_are_always_rejected(
        prefix in "[a-zA-Z0-9 _-]{0,10}",
        letter in proptest::char::range('\u{0621}', '\u{064A}'),
        suffix in "[a-zA-Z0-9 _-]{0,10}"
    ) {
        let name = format!("{}{}{}.png", prefix, letter, suffix);
        prop_assert!(validate_file_name(&name).is_err());
    }

    #[test]
    fn printable_ascii_names_are_accepted(name in "[ -~]{0,40}") {
        prop_assert!(validate_file_name(&name).is_ok());
    }
}
