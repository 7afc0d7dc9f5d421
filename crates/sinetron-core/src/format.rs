//! Time and count formatting shared by hosting UIs

/// Format seconds as `m:ss`, or `h:mm:ss` past an hour.
/// Non-finite or negative input renders as `0:00`.
pub fn format_timestamp(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds as u64;
    let hrs = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hrs > 0 {
        format!("{hrs}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}

/// `position / duration` pair for the player clock
pub fn format_clock(position: f64, duration: Option<f64>) -> String {
    format!(
        "{} / {}",
        format_timestamp(position),
        format_timestamp(duration.unwrap_or(0.0))
    )
}

/// Compact view counts: 1200 -> "1.2K", 3400000 -> "3.4M"
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_minutes() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(7.4), "0:07");
        assert_eq!(format_timestamp(61.0), "1:01");
        assert_eq!(format_timestamp(599.9), "9:59");
    }

    #[test]
    fn test_format_timestamp_hours() {
        assert_eq!(format_timestamp(3600.0), "1:00:00");
        assert_eq!(format_timestamp(5400.0), "1:30:00");
        assert_eq!(format_timestamp(3661.0), "1:01:01");
    }

    #[test]
    fn test_format_timestamp_garbage_in() {
        assert_eq!(format_timestamp(f64::NAN), "0:00");
        assert_eq!(format_timestamp(f64::INFINITY), "0:00");
        assert_eq!(format_timestamp(-12.0), "0:00");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(65.0, Some(3600.0)), "1:05 / 1:00:00");
        assert_eq!(format_clock(5.0, None), "0:05 / 0:00");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_200), "1.2K");
        assert_eq!(format_count(3_400_000), "3.4M");
    }
}
