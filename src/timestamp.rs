use chrono::{DateTime, Utc};

/// A message `ts` value that cannot be decoded into an instant.
///
/// A corrupt timestamp would scramble day bucketing for everything after
/// it, so decoding fails fast instead of guessing.
#[derive(Debug, thiserror::Error)]
#[error("malformed timestamp: {raw:?}")]
pub struct MalformedTimestamp {
    pub raw: String,
}

/// Parse a Slack message timestamp into a UTC instant.
///
/// The wire format is `"<seconds>.<fraction>"`, e.g. `"1579000000.123456"`.
/// The fractional part is a per-channel uniqueness suffix rather than
/// meaningful sub-second precision; it is validated and then dropped, so
/// the result is truncated to whole seconds.
pub fn parse_ts(raw: &str) -> Result<DateTime<Utc>, MalformedTimestamp> {
    let malformed = || MalformedTimestamp {
        raw: raw.to_string(),
    };

    let Some((seconds, fraction)) = raw.split_once('.') else {
        return Err(malformed());
    };
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        // Also catches a second '.' separator.
        return Err(malformed());
    }
    let seconds: i64 = seconds.parse().map_err(|_| malformed())?;
    DateTime::from_timestamp(seconds, 0).ok_or_else(malformed)
}

/// Day bucket key for an instant: its calendar date in UTC, `YYYY-MM-DD`.
///
/// Used both as the archive file stem and as the comparison key for
/// day-boundary detection while partitioning.
pub fn day_key(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_derives_day_key() {
        let ts = parse_ts("1579000000.123456").unwrap();
        assert_eq!(day_key(&ts), "2020-01-14");
    }

    #[test]
    fn truncates_to_whole_seconds() {
        let low = parse_ts("1579000000.000001").unwrap();
        let high = parse_ts("1579000000.999999").unwrap();
        assert_eq!(low, high);
    }

    #[test]
    fn day_key_changes_at_utc_midnight() {
        let before = parse_ts("1579046399.000100").unwrap();
        let after = parse_ts("1579046400.000200").unwrap();
        assert_eq!(day_key(&before), "2020-01-14");
        assert_eq!(day_key(&after), "2020-01-15");
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(parse_ts("abc").is_err());
        assert!(parse_ts("1579000000").is_err());
    }

    #[test]
    fn rejects_multiple_separators() {
        assert!(parse_ts("1.2.3").is_err());
    }

    #[test]
    fn rejects_non_numeric_parts() {
        assert!(parse_ts("notanumber.123").is_err());
        assert!(parse_ts("1579000000.12ab").is_err());
        assert!(parse_ts("1579000000.").is_err());
    }
}
