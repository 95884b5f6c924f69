// Scalar parsing convention shared by every entity transform.
//
// GMP delivers everything as strings; these helpers turn them into typed
// values. All of them are total over absent input — a missing optional
// field is never an error (structural mismatches are the entity parser's
// problem, not the scalar layer's).

use chrono::{DateTime, FixedOffset};

/// Tri-state protocol boolean: not-present is meaningful and distinct from
/// an explicit `0` or `1`, so parsers return `Option<YesNo>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Yes => "1",
            Self::No => "0",
        }
    }
}

/// Parse a `"0"`/`"1"` scalar, preserving absence.
pub fn parse_yes_no(value: Option<&str>) -> Option<YesNo> {
    match value {
        Some("1") => Some(YesNo::Yes),
        Some(_) => Some(YesNo::No),
        None => None,
    }
}

/// Parse a `"0"`/`"1"` scalar where absence simply means `false`.
pub fn parse_bool(value: Option<&str>) -> bool {
    matches!(value, Some("1"))
}

pub fn parse_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

pub fn parse_float(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Severity scores are plain floats; kept as a named helper so call sites
/// read like the protocol.
pub fn parse_severity(value: Option<&str>) -> Option<f64> {
    parse_float(value)
}

/// Parse an ISO 8601 timestamp, preserving the server's timezone offset.
/// Never normalized to UTC — display layers need the server-local wall
/// clock as given.
pub fn parse_date(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    value.and_then(|v| DateTime::parse_from_rfc3339(v.trim()).ok())
}

/// Split a comma-separated scalar into trimmed, non-empty parts.
pub fn parse_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// A non-empty owned string, `None` for absent or empty input.
pub fn parse_text(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_no_is_tri_state() {
        assert_eq!(parse_yes_no(Some("1")), Some(YesNo::Yes));
        assert_eq!(parse_yes_no(Some("0")), Some(YesNo::No));
        assert_eq!(parse_yes_no(None), None);
    }

    #[test]
    fn bool_treats_absence_as_false() {
        assert!(parse_bool(Some("1")));
        assert!(!parse_bool(Some("0")));
        assert!(!parse_bool(None));
    }

    #[test]
    fn date_preserves_offset() {
        let date = parse_date(Some("2026-08-24T11:41:23+02:00")).expect("parses");
        assert_eq!(date.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(date.to_rfc3339(), "2026-08-24T11:41:23+02:00");
    }

    #[test]
    fn date_rejects_garbage_quietly() {
        assert_eq!(parse_date(Some("yesterday")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn csv_drops_empty_parts() {
        assert_eq!(parse_csv(Some("a, b,,c ")), ["a", "b", "c"]);
        assert!(parse_csv(None).is_empty());
    }

    #[test]
    fn numbers_parse_or_stay_absent() {
        assert_eq!(parse_int(Some("42")), Some(42));
        assert_eq!(parse_int(Some("many")), None);
        assert_eq!(parse_severity(Some("9.8")), Some(9.8));
    }
}
