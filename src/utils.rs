//! Console helpers shared by the CLI commands

use crate::constants::{COMPRESSION_RATIO_PREFIX, FINAL_SIZE_PREFIX, PROGRESS_BAR_TEMPLATE};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar from 0 to 100, fed by the upload progress callback
pub fn create_upload_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Human-readable size, e.g. "1.2 MB", "512 B"
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Size reduction as a percentage; negative when the output grew
pub fn calculate_compression_ratio(original_size: u64, final_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    ((original_size as f64 - final_size as f64) / original_size as f64) * 100.0
}

pub fn print_size_summary(original_size: u64, final_size: u64) {
    let ratio = calculate_compression_ratio(original_size, final_size);

    crate::info!("{} {} ({})", FINAL_SIZE_PREFIX, final_size, format_file_size(final_size));
    crate::info!("{} {:.1}%", COMPRESSION_RATIO_PREFIX, ratio);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_calculate_compression_ratio() {
        assert_eq!(calculate_compression_ratio(1000, 800), 20.0);
        assert_eq!(calculate_compression_ratio(1000, 1200), -20.0);
        assert_eq!(calculate_compression_ratio(1000, 1000), 0.0);
        assert_eq!(calculate_compression_ratio(0, 500), 0.0);
    }

    #[test]
    fn test_create_upload_progress_bar() {
        let pb = create_upload_progress_bar("Uploading");
        pb.set_position(50);
        assert_eq!(pb.position(), 50);
        assert_eq!(pb.length(), Some(100));
        pb.finish_and_clear();
    }
}
