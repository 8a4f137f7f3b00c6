//! Output and color utilities for consistent terminal formatting
//!
//! Provides shared color functions respecting NO_COLOR environment variable.

use colored::Colorize;
use std::time::Duration;

/// Check if colors should be used (respects NO_COLOR env var)
pub fn use_colors() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Colorize report header (bold)
pub fn colorize_header(text: &str, use_color: bool) -> String {
    if use_color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize chunk id (cyan)
pub fn colorize_id(text: &str, use_color: bool) -> String {
    if use_color {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize similarity score (yellow)
pub fn colorize_score(text: &str, use_color: bool) -> String {
    if use_color {
        text.yellow().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize passage text (dimmed)
pub fn colorize_text(text: &str, use_color: bool) -> String {
    if use_color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

/// Format an elapsed duration as µs, ms or s with two decimals
pub fn format_duration(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if seconds < 0.001 {
        format!("{:.2} µs", seconds * 1_000_000.0)
    } else if seconds < 1.0 {
        format!("{:.2} ms", seconds * 1000.0)
    } else {
        format!("{:.2} s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_nanos(12_500)), "12.50 µs");
        assert_eq!(format_duration(Duration::from_micros(500)), "500.00 µs");
        assert_eq!(format_duration(Duration::from_millis(1)), "1.00 ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999.00 ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50 s");
        assert_eq!(format_duration(Duration::from_secs(60)), "60.00 s");
    }

    #[test]
    fn test_plain_output_is_unchanged() {
        assert_eq!(colorize_header("RESULTS", false), "RESULTS");
        assert_eq!(colorize_id("para-1", false), "para-1");
        assert_eq!(colorize_score("0.5000", false), "0.5000");
        assert_eq!(colorize_text("text", false), "text");
    }
}
