//! Canonical text for scalar literal values

use chrono::Utc;

use super::SqlError;
use crate::Value;

/// Format one literal.
///
/// Timestamps are normalized to UTC civil time before formatting, so two
/// constants denoting the same instant render identically no matter which
/// offset they were constructed with. Booleans have no literal form in this
/// dialect; boolean logic flows through the conditional rule instead.
pub(crate) fn format(value: &Value) -> Result<String, SqlError> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(_) => Err(SqlError::UnsupportedLiteral("boolean")),
        Value::Int(v) => Ok(v.to_string()),
        Value::Float(v) => Ok(v.to_string()),
        Value::String(s) => Ok(format!("'{s}'")),
        Value::Enum { value, .. } => Ok(value.to_string()),
        Value::Timestamp(ts) => Ok(ts
            .with_timezone(&Utc)
            .format("'%Y-%m-%d %H:%M:%S%.6f'")
            .to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn test_strings_single_quoted_passthrough() {
        assert_eq!(format(&Value::from("aaa")).unwrap(), "'aaa'");
        assert_eq!(format(&Value::from("o'clock")).unwrap(), "'o'clock'");
    }

    #[test]
    fn test_numbers_invariant_decimal() {
        assert_eq!(format(&Value::Int(-5)).unwrap(), "-5");
        assert_eq!(format(&Value::Float(100.0)).unwrap(), "100");
        assert_eq!(format(&Value::Float(0.25)).unwrap(), "0.25");
    }

    #[test]
    fn test_null_keyword() {
        assert_eq!(format(&Value::Null).unwrap(), "NULL");
    }

    #[test]
    fn test_boolean_has_no_literal_form() {
        let err = format(&Value::Bool(true)).unwrap_err();
        assert!(matches!(err, SqlError::UnsupportedLiteral("boolean")));
    }

    #[test]
    fn test_enum_renders_underlying_value() {
        assert_eq!(format(&Value::enumerated("Hoge", 1)).unwrap(), "1");
    }

    #[test]
    fn test_timestamp_already_utc() {
        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2014, 10, 16, 21, 0, 0)
            .unwrap();

        assert_eq!(
            format(&Value::Timestamp(ts)).unwrap(),
            "'2014-10-16 21:00:00.000000'"
        );
    }

    #[test]
    fn test_timestamp_offset_subtracted() {
        // 2014-10-17 06:00 at UTC+9 is the same instant as 2014-10-16 21:00 UTC.
        let ts = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2014, 10, 17, 6, 0, 0)
            .unwrap();

        assert_eq!(
            format(&Value::Timestamp(ts)).unwrap(),
            "'2014-10-16 21:00:00.000000'"
        );
    }

    #[test]
    fn test_timestamp_microsecond_padding() {
        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2014, 10, 16, 21, 0, 0)
            .unwrap()
            + chrono::Duration::milliseconds(1);

        assert_eq!(
            format(&Value::Timestamp(ts)).unwrap(),
            "'2014-10-16 21:00:00.001000'"
        );
    }
}
