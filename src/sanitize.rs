use crate::constants::UNSUPPORTED_NAME_RANGES;
use crate::error::{Result, UploadError};

/// Source of the millisecond timestamp appended to storage keys
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Rejects names containing characters from scripts the sanitizer cannot
/// transliterate.
///
/// Other non-ASCII characters pass here and are replaced later by
/// [`sanitize_file_name`].
pub fn validate_file_name(name: &str) -> Result<()> {
    let rejected = name.chars().any(|c| {
        UNSUPPORTED_NAME_RANGES
            .iter()
            .any(|&(start, end)| (start..=end).contains(&c))
    });

    if rejected {
        return Err(UploadError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Builds a storage-safe, unique object name.
///
/// The name is split at its last period. Every stem character outside
/// `[A-Za-z0-9]` becomes `_`, then `_{timestamp_millis}` is appended and the
/// original extension reattached. A name without a period gets no extension.
///
/// # Example
/// ```
/// use workout_images::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("leg-press.png", 1700000000000), "leg_press_1700000000000.png");
/// ```
pub fn sanitize_file_name(name: &str, timestamp_millis: i64) -> String {
    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, extension)) => (stem, Some(extension)),
        None => (name, None),
    };

    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    match extension {
        Some(extension) => format!("{}_{}.{}", stem, timestamp_millis, extension),
        None => format!("{}_{}", stem, timestamp_millis),
    }
}
