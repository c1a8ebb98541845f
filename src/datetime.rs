//! Date/time utilities.
//!
//! Selfoss reports item times as `YYYY-MM-DD HH:MM:SS[.ffffff]±HH:MM` (or
//! with a `T` separator). Watermarks are kept in a named timezone and
//! stored as `YYYY-MM-DD HH:MM:SS±HHMM`.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{RelayError, Result};

/// Format of a persisted watermark line.
pub const WATERMARK_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// Offset-less format written by older versions of the relay.
const LEGACY_WATERMARK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used for message footers.
pub const FOOTER_FORMAT: &str = "%Y/%m/%d %H:%M";

/// How far back the first run looks when no watermark exists yet.
const FIRST_RUN_LOOKBACK_DAYS: i64 = 3 * 365;

/// Parse an IANA timezone name (e.g., "Europe/Berlin", "UTC").
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| RelayError::Config(format!("unknown timezone '{}': {}", name, e)))
}

/// Normalize a selfoss timestamp to `YYYY-MM-DD HH:MM:SS±HHMM` form.
///
/// Fractional seconds are dropped, a `T` separator becomes a space and a
/// trailing `Z` becomes `+0000`.
pub fn trim_fraction(raw: &str) -> String {
    let raw = raw.trim();
    let mut out = String::with_capacity(raw.len());
    let mut in_fraction = false;

    for (i, ch) in raw.char_indices() {
        if i == 10 && ch == 'T' {
            out.push(' ');
            continue;
        }
        if i == 19 && ch == '.' {
            in_fraction = true;
            continue;
        }
        if in_fraction {
            if ch.is_ascii_digit() {
                continue;
            }
            in_fraction = false;
        }
        out.push(ch);
    }

    match out.strip_suffix('Z') {
        Some(stripped) => format!("{}+0000", stripped),
        None => out,
    }
}

/// Parse an item timestamp. The offset is mandatory.
pub fn parse_item_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    let normalized = trim_fraction(raw);
    DateTime::parse_from_str(&normalized, WATERMARK_FORMAT)
        .map_err(|e| RelayError::Parse(format!("invalid item timestamp '{}': {}", raw, e)))
}

/// Parse a persisted watermark into the given timezone.
///
/// Lines without an offset are read as wall-clock time in `tz`.
pub fn parse_watermark(raw: &str, tz: &Tz) -> Result<DateTime<Tz>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_str(raw, WATERMARK_FORMAT) {
        return Ok(dt.with_timezone(tz));
    }

    let naive = NaiveDateTime::parse_from_str(raw, LEGACY_WATERMARK_FORMAT)
        .map_err(|e| RelayError::Parse(format!("invalid watermark '{}': {}", raw, e)))?;

    tz.from_local_datetime(&naive).earliest().ok_or_else(|| {
        RelayError::Parse(format!("watermark '{}' does not exist in {}", raw, tz))
    })
}

/// Format a watermark for persisting.
pub fn format_watermark(dt: &DateTime<Tz>) -> String {
    dt.format(WATERMARK_FORMAT).to_string()
}

/// Format an item time in the given timezone for display.
pub fn format_local(dt: &DateTime<FixedOffset>, tz: &Tz) -> String {
    dt.with_timezone(tz).format(FOOTER_FORMAT).to_string()
}

/// Watermark used when none has been persisted yet: now minus three years.
pub fn first_run_watermark(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz) - TimeDelta::days(FIRST_RUN_LOOKBACK_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Europe/Berlin").unwrap(), Tz::Europe__Berlin);
        assert_eq!(parse_timezone("UTC").unwrap(), Tz::UTC);
        assert!(matches!(
            parse_timezone("Invalid/Zone"),
            Err(RelayError::Config(_))
        ));
    }

    #[test]
    fn test_trim_fraction() {
        assert_eq!(
            trim_fraction("2024-01-01 10:00:00.123456+01:00"),
            "2024-01-01 10:00:00+01:00"
        );
        assert_eq!(
            trim_fraction("2024-01-01T10:00:00+0100"),
            "2024-01-01 10:00:00+0100"
        );
        assert_eq!(
            trim_fraction("2024-01-01T10:00:00.5Z"),
            "2024-01-01 10:00:00+0000"
        );
        assert_eq!(
            trim_fraction("2024-01-01 10:00:00+0100"),
            "2024-01-01 10:00:00+0100"
        );
    }

    #[test]
    fn test_parse_item_timestamp_offsets() {
        let compact = parse_item_timestamp("2024-01-01 10:00:00+0100").unwrap();
        let colon = parse_item_timestamp("2024-01-01T10:00:00+01:00").unwrap();
        let utc = parse_item_timestamp("2024-01-01T09:00:00Z").unwrap();

        assert_eq!(compact, colon);
        assert_eq!(compact, utc);
        assert_eq!(compact.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_parse_item_timestamp_fraction() {
        let dt = parse_item_timestamp("2024-01-01 10:00:00.999999+01:00").unwrap();
        assert_eq!(dt.format("%H:%M:%S").to_string(), "10:00:00");
    }

    #[test]
    fn test_parse_item_timestamp_requires_offset() {
        assert!(matches!(
            parse_item_timestamp("2024-01-01 10:00:00"),
            Err(RelayError::Parse(_))
        ));
        assert!(matches!(
            parse_item_timestamp("not a date"),
            Err(RelayError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_watermark_with_offset() {
        let tz = Tz::Europe__Berlin;
        let wm = parse_watermark("2023-12-31 00:00:00+0000\n", &tz).unwrap();
        assert_eq!(format_watermark(&wm), "2023-12-31 01:00:00+0100");
    }

    #[test]
    fn test_parse_watermark_legacy() {
        let tz = Tz::Europe__Berlin;
        let wm = parse_watermark("2024-07-01 12:00:00", &tz).unwrap();
        assert_eq!(format_watermark(&wm), "2024-07-01 12:00:00+0200");
    }

    #[test]
    fn test_parse_watermark_invalid() {
        let tz = Tz::UTC;
        assert!(matches!(
            parse_watermark("garbage", &tz),
            Err(RelayError::Parse(_))
        ));
    }

    #[test]
    fn test_format_local() {
        let dt = parse_item_timestamp("2024-01-15 10:30:00+0000").unwrap();
        assert_eq!(format_local(&dt, &Tz::Asia__Tokyo), "2024/01/15 19:30");
        assert_eq!(format_local(&dt, &Tz::UTC), "2024/01/15 10:30");
    }

    #[test]
    fn test_first_run_watermark_is_in_the_past() {
        let tz = Tz::UTC;
        let wm = first_run_watermark(&tz);
        let age = Utc::now().signed_duration_since(wm);
        assert!(age.num_days() >= FIRST_RUN_LOOKBACK_DAYS);
    }
}
