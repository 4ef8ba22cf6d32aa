//! Free-text duration and cost handling for learning paths

use regex::Regex;
use std::sync::OnceLock;

pub const HOURS_PER_DAY: f64 = 8.0;
pub const HOURS_PER_WEEK: f64 = 40.0;
pub const HOURS_PER_MONTH: f64 = 160.0;

fn leading_number() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)").expect("leading number pattern is valid"))
}

fn any_number() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("number pattern is valid"))
}

/// Convert "3 weeks", "2 days", "1 month" or "12" into hours.
///
/// Unparseable text counts as zero.
pub fn parse_hours(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let Some(value) = leading_number()
        .captures(&lower)
        .and_then(|cap| cap[1].parse::<f64>().ok())
    else {
        return 0.0;
    };

    if lower.contains("week") {
        value * HOURS_PER_WEEK
    } else if lower.contains("day") {
        value * HOURS_PER_DAY
    } else if lower.contains("month") {
        value * HOURS_PER_MONTH
    } else {
        value
    }
}

/// Re-express a total in hours (< 24), days (< 168) or weeks
pub fn format_hours(hours: f64) -> String {
    if hours < 24.0 {
        format!("{} hours", trim_number(hours))
    } else if hours < 168.0 {
        format!("{} days", (hours / 24.0).ceil())
    } else {
        format!("{} weeks", (hours / 168.0).ceil())
    }
}

/// First decimal number in a cost string ("$49.99" -> 49.99, "Free" -> 0)
pub fn parse_cost(text: &str) -> f64 {
    any_number()
        .captures(text)
        .and_then(|cap| cap[1].parse::<f64>().ok())
        .unwrap_or(0.0)
}

pub fn format_cost(total: f64) -> String {
    if total <= 0.0 {
        "Free".to_string()
    } else {
        format!("${}", trim_number(total))
    }
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hours_units() {
        assert_eq!(parse_hours("3 weeks"), 120.0);
        assert_eq!(parse_hours("2 days"), 16.0);
        assert_eq!(parse_hours("1 month"), 160.0);
        assert_eq!(parse_hours("12"), 12.0);
        assert_eq!(parse_hours("1.5 Weeks"), 60.0);
        assert_eq!(parse_hours("a while"), 0.0);
    }

    #[test]
    fn test_format_hours_picks_unit() {
        assert_eq!(format_hours(0.0), "0 hours");
        assert_eq!(format_hours(16.0), "16 hours");
        assert_eq!(format_hours(40.0), "2 days");
        assert_eq!(format_hours(200.0), "2 weeks");
    }

    #[test]
    fn test_cost() {
        assert_eq!(parse_cost("$49.99"), 49.99);
        assert_eq!(parse_cost("Free"), 0.0);
        assert_eq!(parse_cost("USD 20 / month"), 20.0);
        assert_eq!(format_cost(0.0), "Free");
        assert_eq!(format_cost(69.99), "$69.99");
        assert_eq!(format_cost(20.0), "$20");
    }
}
