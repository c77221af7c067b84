// Token lifetime parsing

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Lifetime used when the configured value is missing or unparseable
pub const DEFAULT_TTL_SECONDS: i64 = 3600;

/// Longest accepted lifetime: 100 years of 365 days
pub const MAX_TTL_SECONDS: i64 = 100 * 365 * 86_400;

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)?)\s*([smhdwMy])$").expect("duration pattern is valid")
    })
}

fn unit_seconds(unit: &str) -> Option<f64> {
    match unit {
        "s" => Some(1.0),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        "d" => Some(DAY),
        "w" => Some(7.0 * DAY),
        "M" => Some(30.0 * DAY),
        "y" => Some(365.0 * DAY),
        _ => None,
    }
}

/// Parse a configured token lifetime into seconds
///
/// Accepts bare integer seconds (`"90"`) or `<number><unit>` shorthand
/// (`"15m"`, `"2h"`, `"1.5d"`), where `M` is a 30-day month and `y` a 365-day
/// year. Anything else, including zero or negative lifetimes and anything
/// above [`MAX_TTL_SECONDS`], logs a warning and falls back to
/// [`DEFAULT_TTL_SECONDS`].
pub fn resolve_ttl(raw: &str) -> i64 {
    match parse_ttl(raw.trim()) {
        Some(seconds) => seconds,
        None => {
            warn!(
                "Unrecognized token lifetime '{}', falling back to {} seconds",
                raw, DEFAULT_TTL_SECONDS
            );
            DEFAULT_TTL_SECONDS
        }
    }
}

fn parse_ttl(value: &str) -> Option<i64> {
    if let Ok(seconds) = value.parse::<i64>() {
        return (1..=MAX_TTL_SECONDS).contains(&seconds).then_some(seconds);
    }

    let captures = duration_pattern().captures(value)?;
    let amount: f64 = captures[1].parse().ok()?;
    let seconds = (amount * unit_seconds(&captures[2])?).floor();

    if seconds.is_finite() && seconds >= 1.0 && seconds <= MAX_TTL_SECONDS as f64 {
        Some(seconds as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bare_integer_is_seconds() {
        assert_eq!(resolve_ttl("90"), 90);
        assert_eq!(resolve_ttl(" 3600 "), 3600);
    }

    #[test]
    fn test_every_unit() {
        assert_eq!(resolve_ttl("45s"), 45);
        assert_eq!(resolve_ttl("15m"), 900);
        assert_eq!(resolve_ttl("2h"), 7200);
        assert_eq!(resolve_ttl("1d"), 86_400);
        assert_eq!(resolve_ttl("1w"), 604_800);
        assert_eq!(resolve_ttl("1M"), 2_592_000);
        assert_eq!(resolve_ttl("1y"), 31_536_000);
    }

    #[test]
    fn test_minutes_and_months_are_case_sensitive() {
        assert_ne!(resolve_ttl("1m"), resolve_ttl("1M"));
        assert_eq!(resolve_ttl("1H"), DEFAULT_TTL_SECONDS);
    }

    #[test]
    fn test_fractional_amounts() {
        assert_eq!(resolve_ttl("1.5h"), 5400);
        assert_eq!(resolve_ttl("0.5m"), 30);
    }

    #[test]
    fn test_garbage_falls_back_to_default() {
        assert_eq!(resolve_ttl("garbage"), DEFAULT_TTL_SECONDS);
        assert_eq!(resolve_ttl(""), DEFAULT_TTL_SECONDS);
        assert_eq!(resolve_ttl("h2"), DEFAULT_TTL_SECONDS);
        assert_eq!(resolve_ttl("2 hours"), DEFAULT_TTL_SECONDS);
        assert_eq!(resolve_ttl("1.5"), DEFAULT_TTL_SECONDS);
    }

    #[test]
    fn test_non_positive_lifetimes_fall_back() {
        assert_eq!(resolve_ttl("0"), DEFAULT_TTL_SECONDS);
        assert_eq!(resolve_ttl("-60"), DEFAULT_TTL_SECONDS);
        assert_eq!(resolve_ttl("0s"), DEFAULT_TTL_SECONDS);
        assert_eq!(resolve_ttl("0.1s"), DEFAULT_TTL_SECONDS);
    }

    #[test]
    fn test_lifetimes_beyond_a_century_fall_back() {
        assert_eq!(resolve_ttl("100y"), MAX_TTL_SECONDS);
        assert_eq!(resolve_ttl(&MAX_TTL_SECONDS.to_string()), MAX_TTL_SECONDS);
        assert_eq!(resolve_ttl(&(MAX_TTL_SECONDS + 1).to_string()), DEFAULT_TTL_SECONDS);
        assert_eq!(resolve_ttl("9223372036854775807"), DEFAULT_TTL_SECONDS);
        assert_eq!(resolve_ttl("101y"), DEFAULT_TTL_SECONDS);
        assert_eq!(resolve_ttl("99999999999999999999w"), DEFAULT_TTL_SECONDS);
    }

    proptest! {
        #[test]
        fn prop_hours_scale_linearly(hours in 1i64..10_000) {
            prop_assert_eq!(resolve_ttl(&format!("{}h", hours)), hours * 3600);
        }

        #[test]
        fn prop_result_is_always_in_range(raw in "\\PC{0,12}") {
            let ttl = resolve_ttl(&raw);
            prop_assert!(ttl > 0 && ttl <= MAX_TTL_SECONDS);
        }
    }
}
