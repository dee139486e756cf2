use crate::round_to;

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format a byte count as a human readable size.
///
/// Picks the largest unit from `B`, `KB`, `MB` and `GB` that keeps the value at or above 1, using
/// powers of 1024, and rounds to two decimal places. Trailing zeros are dropped so `1536` formats as
/// `1.5 KB` and `1048576` as `1 MB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{} {}", round_to(value, 2), UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bytes() {
        assert_eq!("0 B", format_bytes(0));
    }

    #[test]
    fn below_one_kilobyte() {
        assert_eq!("1 B", format_bytes(1));
        assert_eq!("1023 B", format_bytes(1023));
    }

    #[test]
    fn fractional_kilobytes() {
        assert_eq!("1.5 KB", format_bytes(1536));
        assert_eq!("1 KB", format_bytes(1024));
    }

    #[test]
    fn exact_megabyte() {
        assert_eq!("1 MB", format_bytes(1_048_576));
    }

    #[test]
    fn rounds_to_two_places() {
        // 1.2345 MB
        assert_eq!("1.23 MB", format_bytes(1_294_467));
    }

    #[test]
    fn gigabytes_are_the_largest_unit() {
        assert_eq!("2 GB", format_bytes(2 * 1024 * 1024 * 1024));
        assert_eq!("2048 GB", format_bytes(2 * 1024 * 1024 * 1024 * 1024));
    }
}
