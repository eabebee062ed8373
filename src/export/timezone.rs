//! Timezone field detection and guidance texts

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::Field;

static TIMEZONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)timezone").unwrap());

pub const TIMEZONE_RECOMMENDATIONS: [&str; 5] = [
    "Store all dates/times in UTC format",
    "Convert to local timezone only for display purposes",
    "Include user timezone in API requests if server expects local time",
    "Use timezone-aware date libraries (moment.js, luxon, etc.)",
    "Consider automatic timezone detection for mobile users",
];

pub const TIMEZONE_COMMON_ISSUES: [&str; 4] = [
    "Date/time comparisons across different timezones",
    "Date filtering not accounting for timezone offset",
    "Date displays showing incorrect time due to timezone conversion",
    "Daylight saving time transitions affecting time calculations",
];

pub const MOBILE_TIMEZONE_RECOMMENDATIONS: [&str; 5] = [
    "Store all date/time in UTC on the server",
    "Convert to local timezone only for display purposes",
    "Use a timezone library (moment-timezone, date-fns-tz)",
    "Consider automatic timezone detection",
    "Handle daylight saving time transitions properly",
];

/// The user timezone field: named `tz` or labelled exactly "Timezone" (any case)
pub fn is_timezone_field(name: &str, field: &Field) -> bool {
    name == "tz"
        || field
            .label
            .as_deref()
            .is_some_and(|label| label.eq_ignore_ascii_case("timezone"))
}

/// Any field whose name or label mentions a timezone
pub fn mentions_timezone(name: &str, field: &Field) -> bool {
    name == "tz"
        || TIMEZONE_PATTERN.is_match(name)
        || field
            .label
            .as_deref()
            .is_some_and(|label| TIMEZONE_PATTERN.is_match(label))
}

/// Guidance block attached to exports when timezone handling is requested
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimezoneGuidance {
    pub recommendations: Vec<String>,
    pub common_issues: Vec<String>,
}

impl Default for TimezoneGuidance {
    fn default() -> Self {
        Self {
            recommendations: TIMEZONE_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
            common_issues: TIMEZONE_COMMON_ISSUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, ScalarType};

    #[test]
    fn test_strict_and_loose_detection() {
        let tz = Field::selection(Vec::new()).with_label("Timezone");
        let offset = Field::scalar(ScalarType::Char).with_label("Timezone offset");

        assert!(is_timezone_field("tz", &tz));
        assert!(is_timezone_field("user_tz", &tz));
        assert!(!is_timezone_field("tz_offset", &offset));

        assert!(mentions_timezone("tz_offset", &offset));
        assert!(mentions_timezone("x_timezone_name", &Field::scalar(ScalarType::Char)));
        assert!(!mentions_timezone("name", &Field::scalar(ScalarType::Char)));
    }
}
