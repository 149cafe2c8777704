//! Execution timestamps embedded in the `Executed By & Date` column.
//!
//! A field carries either one timestamp or a `New Value` / `Old Value` revision pair, each written
//! as `05-Jan-2024 02:15:30 PM (IST)`. The zone abbreviation is informational: every timestamp is
//! read in the fixed reference offset UTC+05:30.
use crate::audit::AnalysisError;
use chrono::DateTime;
use chrono::FixedOffset;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Offset every timestamp is interpreted in.
pub const REFERENCE_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// Text shown in place of a timestamp that could not be located.
pub const TIMESTAMP_NOT_FOUND: &str = "Timestamp not found";

const NEW_VALUE_MARKER: &str = "New Value";
const OLD_VALUE_MARKER: &str = "Old Value";
const TIMESTAMP_FORMAT: &str = "%d-%b-%Y %I:%M:%S %p";

static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}-[a-zA-Z]{3}-\d{4} \d{2}:\d{2}:\d{2} [AP]M \([A-Z]+\)").expect("Hardcode regex pattern")
});

static ZONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([A-Z]+\)").expect("Hardcode regex pattern"));

/// Timestamps found in one `Executed By & Date` field. `None` marks a timestamp that was not found.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionStamp {
    /// Plain execution entry
    Single { timestamp: Option<String> },
    /// Revised entry carrying both the new and the old value
    Revision {
        new_value: Option<String>,
        old_value: Option<String>,
    },
}

impl ExecutionStamp {
    /// Locates the timestamp(s) in a field.
    ///
    /// When both markers are present each timestamp is searched for only after its own marker;
    /// otherwise the first timestamp anywhere in the field is taken.
    pub fn extract(field: &str) -> ExecutionStamp {
        match (field.find(NEW_VALUE_MARKER), field.find(OLD_VALUE_MARKER)) {
            (Some(new_at), Some(old_at)) => ExecutionStamp::Revision {
                new_value: find_timestamp(&field[new_at + NEW_VALUE_MARKER.len()..]),
                old_value: find_timestamp(&field[old_at + OLD_VALUE_MARKER.len()..]),
            },
            _ => ExecutionStamp::Single {
                timestamp: find_timestamp(field),
            },
        }
    }

    /// The timestamp elapsed time is measured from: the old value of a revision, else the single one.
    pub fn reference(&self) -> Option<&str> {
        match self {
            ExecutionStamp::Single { timestamp } => timestamp.as_deref(),
            ExecutionStamp::Revision { old_value, .. } => old_value.as_deref(),
        }
    }
}

impl fmt::Display for ExecutionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |timestamp: &Option<String>| timestamp.clone().unwrap_or_else(|| TIMESTAMP_NOT_FOUND.to_owned());
        match self {
            ExecutionStamp::Single { timestamp } => write!(f, "{}", show(timestamp)),
            ExecutionStamp::Revision { new_value, old_value } => {
                write!(f, "New Value: {}; Old Value: {}", show(new_value), show(old_value))
            }
        }
    }
}

fn find_timestamp(text: &str) -> Option<String> {
    TIMESTAMP_PATTERN.find(text).map(|matched| matched.as_str().to_owned())
}

/// The fixed offset timestamps are read in.
pub fn reference_offset() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_OFFSET_SECONDS).expect("UTC+05:30 is a valid offset")
}

/// Parses `DD-Mon-YYYY HH:MM:SS AM (ZONE)` into an instant at the reference offset.
pub fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>, AnalysisError> {
    let local = ZONE_PATTERN.replace_all(text, "");
    let naive = NaiveDateTime::parse_from_str(local.trim(), TIMESTAMP_FORMAT).map_err(|error| {
        AnalysisError::TimestampParse {
            text: text.to_owned(),
            message: error.to_string(),
        }
    })?;
    naive
        .and_local_timezone(reference_offset())
        .single()
        .ok_or_else(|| AnalysisError::TimestampParse {
            text: text.to_owned(),
            message: "ambiguous local time".to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_single_timestamp() {
        let stamp = ExecutionStamp::extract("J. Doe 05-Jan-2024 02:15:30 PM (IST) signed");
        assert_eq!(
            stamp,
            ExecutionStamp::Single { timestamp: Some("05-Jan-2024 02:15:30 PM (IST)".to_owned()) }
        );
        assert_eq!(stamp.reference(), Some("05-Jan-2024 02:15:30 PM (IST)"));
    }

    #[test]
    fn test_missing_timestamp() {
        let stamp = ExecutionStamp::extract("J. Doe, 5 Jan 2024");
        assert_eq!(stamp.reference(), None);
        assert_eq!(stamp.to_string(), TIMESTAMP_NOT_FOUND);
    }

    #[test]
    fn test_revision_uses_old_value_as_reference() {
        let stamp = ExecutionStamp::extract(
            "New Value X 05-Jan-2024 09:00:00 AM (IST) Old Value Y 05-Jan-2024 08:00:00 AM (IST)",
        );
        assert_eq!(
            stamp,
            ExecutionStamp::Revision {
                new_value: Some("05-Jan-2024 09:00:00 AM (IST)".to_owned()),
                old_value: Some("05-Jan-2024 08:00:00 AM (IST)".to_owned()),
            }
        );
        assert_eq!(stamp.reference(), Some("05-Jan-2024 08:00:00 AM (IST)"));
    }

    #[test]
    fn test_revision_searches_after_each_marker() {
        // the only timestamp precedes "Old Value", so the old value is not found
        let stamp = ExecutionStamp::extract("New Value 05-Jan-2024 09:00:00 AM (IST) Old Value pending");
        assert_eq!(
            stamp,
            ExecutionStamp::Revision {
                new_value: Some("05-Jan-2024 09:00:00 AM (IST)".to_owned()),
                old_value: None,
            }
        );
        assert_eq!(stamp.reference(), None);
        assert_eq!(stamp.to_string(), "New Value: 05-Jan-2024 09:00:00 AM (IST); Old Value: Timestamp not found");
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        let stamp = ExecutionStamp::extract("new value 05-Jan-2024 09:00:00 AM (IST) old value 05-Jan-2024 08:00:00 AM (IST)");
        assert_eq!(stamp.reference(), Some("05-Jan-2024 09:00:00 AM (IST)"));
    }

    #[test]
    fn test_single_marker_falls_back_to_whole_field() {
        let stamp = ExecutionStamp::extract("05-Jan-2024 07:00:00 AM (IST) New Value 05-Jan-2024 09:00:00 AM (IST)");
        assert_eq!(stamp.reference(), Some("05-Jan-2024 07:00:00 AM (IST)"));
    }

    #[test]
    fn test_parse_uses_reference_offset() {
        let instant = parse_timestamp("05-Jan-2024 02:15:30 PM (PST)").unwrap();
        let expected = reference_offset().with_ymd_and_hms(2024, 1, 5, 14, 15, 30).unwrap();
        assert_eq!(instant, expected);
        assert_eq!(instant.offset().local_minus_utc(), REFERENCE_OFFSET_SECONDS);
    }

    #[test]
    fn test_parse_accepts_lowercase_month() {
        assert!(parse_timestamp("05-jan-2024 12:00:00 AM (IST)").is_ok());
    }

    #[test]
    fn test_parse_errors() {
        for text in ["05-Foo-2024 02:15:30 PM (IST)", "05-Jan-2024 13:15:30 PM (IST)", "31-Feb-2024 01:00:00 AM (IST)"] {
            match parse_timestamp(text) {
                Err(AnalysisError::TimestampParse { text: failed, .. }) => assert_eq!(failed, text),
                other => panic!("expected parse error for {text}: {other:?}"),
            }
        }
    }
}
