/// Compact US-dollar formatting: "$1.2T", "$345.6B", "$12K", "$950".
/// At most one fraction digit, trimmed when it is zero.
pub fn usd_compact(value: f64) -> String {
    let abs = value.abs();
    let (scaled, mut suffix) = if abs >= 1e12 {
        (value / 1e12, "T")
    } else if abs >= 1e9 {
        (value / 1e9, "B")
    } else if abs >= 1e6 {
        (value / 1e6, "M")
    } else if abs >= 1e3 {
        (value / 1e3, "K")
    } else {
        (value, "")
    };
    let mut rounded = (scaled * 10.0).round() / 10.0;
    // a value that rounds to 1000 of a unit rolls over to the next band
    if rounded.abs() >= 1000.0 {
        let next = match suffix {
            "" => Some("K"),
            "K" => Some("M"),
            "M" => Some("B"),
            "B" => Some("T"),
            _ => None,
        };
        if let Some(next) = next {
            suffix = next;
            rounded = (rounded / 100.0).round() / 10.0;
        }
    }
    if (rounded - rounded.trunc()).abs() < f64::EPSILON {
        format!("${}{}", rounded.trunc() as i64, suffix)
    } else {
        format!("${:.1}{}", rounded, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_bands() {
        assert_eq!(usd_compact(950.0), "$950");
        assert_eq!(usd_compact(1_000.0), "$1K");
        assert_eq!(usd_compact(1_234.0), "$1.2K");
        assert_eq!(usd_compact(12_000_000.0), "$12M");
        assert_eq!(usd_compact(345_600_000_000.0), "$345.6B");
        assert_eq!(usd_compact(1_230_000_000_000.0), "$1.2T");
    }

    #[test]
    fn trims_zero_fraction() {
        assert_eq!(usd_compact(2_000_000_000.0), "$2B");
        assert_eq!(usd_compact(2_040_000_000.0), "$2B");
        assert_eq!(usd_compact(2_060_000_000.0), "$2.1B");
    }

    #[test]
    fn rounding_rolls_over_to_the_next_band() {
        assert_eq!(usd_compact(999_950.0), "$1M");
        assert_eq!(usd_compact(999_940.0), "$999.9K");
        assert_eq!(usd_compact(999.96), "$1K");
        assert_eq!(usd_compact(999_950_000_000.0), "$1T");
    }

    #[test]
    fn zero_is_plain() {
        assert_eq!(usd_compact(0.0), "$0");
    }
}
