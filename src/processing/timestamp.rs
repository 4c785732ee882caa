//! Timestamp normalization to nanoseconds since the Unix epoch.
//!
//! Accepted inputs, in order of precedence:
//!
//! - native spreadsheet dates (date serials counted from 1899-12-30, the epoch that absorbs the
//!   1900 leap-year quirk; naive local time at the configured UTC offset)
//! - numeric epoch values in the configured [`TimeUnit`]
//! - text parsed with the configured `strftime` format

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::schema::TimestampColumn;
use crate::types::{Cell, TimeUnit};

/// Days between the spreadsheet epoch (1899-12-30) and the Unix epoch.
const EXCEL_UNIX_EPOCH_DAYS: i64 = 25_569;
const NANOS_PER_DAY: i64 = 86_400 * 1_000_000_000;

/// Result of normalizing a timestamp cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampOutcome {
    /// Nanoseconds since the Unix epoch.
    Nanos(i64),
    /// The cell cannot be turned into a timestamp; the row must be dropped.
    Drop(String),
}

/// Current wall-clock time in nanoseconds.
pub fn wall_clock_ns() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

/// Normalize `cell` according to `spec`.
///
/// With no timestamp column configured the result is `now()`.
pub fn normalize(
    cell: &Cell,
    spec: Option<&TimestampColumn>,
    now: impl FnOnce() -> i64,
) -> TimestampOutcome {
    let Some(spec) = spec else {
        return TimestampOutcome::Nanos(now());
    };

    match cell {
        Cell::Empty => TimestampOutcome::Drop("empty timestamp".to_string()),
        Cell::DateTime(serial) => excel_serial_to_nanos(*serial, spec.utc_offset_secs)
            .map(TimestampOutcome::Nanos)
            .unwrap_or_else(|| {
                TimestampOutcome::Drop(format!("date serial {serial} is out of range"))
            }),
        _ => {
            if let Some(unit) = spec.unit {
                if let Some(ns) = numeric_to_nanos(cell, unit) {
                    return TimestampOutcome::Nanos(ns);
                }
                if spec.format.is_none() {
                    return TimestampOutcome::Drop(format!(
                        "'{}' is not a numeric timestamp",
                        cell.to_text()
                    ));
                }
            }
            match spec.format.as_deref() {
                Some(format) => {
                    let text = cell.to_text();
                    parse_formatted(&text, format, spec.utc_offset_secs)
                        .map(TimestampOutcome::Nanos)
                        .unwrap_or_else(|| {
                            TimestampOutcome::Drop(format!(
                                "'{text}' does not match format '{format}'"
                            ))
                        })
                }
                None => TimestampOutcome::Drop("no timestamp unit or format".to_string()),
            }
        }
    }
}

/// Convert a spreadsheet date serial to nanoseconds, rounded to the microsecond.
pub fn excel_serial_to_nanos(serial: f64, utc_offset_secs: i64) -> Option<i64> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.floor();
    let micros_of_day = ((serial - days) * 86_400_000_000.0).round() as i64;
    let days = days as i64 - EXCEL_UNIX_EPOCH_DAYS;
    days.checked_mul(NANOS_PER_DAY)?
        .checked_add(micros_of_day.checked_mul(1_000)?)?
        .checked_sub(utc_offset_secs.checked_mul(1_000_000_000)?)
}

fn numeric_to_nanos(cell: &Cell, unit: TimeUnit) -> Option<i64> {
    let scale = unit.nanos_per_unit();
    match cell {
        Cell::Int(i) => i.checked_mul(scale),
        Cell::Float(f) => float_to_nanos(*f, scale),
        Cell::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i.checked_mul(scale),
                Err(_) => float_to_nanos(s.parse::<f64>().ok()?, scale),
            }
        }
        _ => None,
    }
}

fn float_to_nanos(f: f64, scale: i64) -> Option<i64> {
    if !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return (f as i64).checked_mul(scale);
    }
    let ns = (f * scale as f64).round();
    if ns.abs() < i64::MAX as f64 {
        Some(ns as i64)
    } else {
        None
    }
}

/// Parse `text` with `format`. Zoned formats (`%z`) are used as is; naive date-times and dates
/// are taken to be at `utc_offset_secs` east of UTC.
fn parse_formatted(text: &str, format: &str, utc_offset_secs: i64) -> Option<i64> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_str(text, format) {
        return dt.timestamp_nanos_opt();
    }
    let naive = NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    naive
        .and_utc()
        .timestamp_nanos_opt()?
        .checked_sub(utc_offset_secs.checked_mul(1_000_000_000)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(unit: Option<TimeUnit>, format: Option<&str>) -> TimestampColumn {
        TimestampColumn {
            column: "ts".to_string(),
            index: 0,
            unit,
            format: format.map(str::to_string),
            utc_offset_secs: 0,
        }
    }

    fn never() -> i64 {
        panic!("clock must not be consulted when a timestamp column is configured")
    }

    #[test]
    fn seconds_scale_to_nanos() {
        let s = spec(Some(TimeUnit::S), None);
        assert_eq!(
            normalize(&Cell::Int(1_700_000_000), Some(&s), never),
            TimestampOutcome::Nanos(1_700_000_000_000_000_000)
        );
        assert_eq!(
            normalize(&Cell::Float(1_700_000_000.0), Some(&s), never),
            TimestampOutcome::Nanos(1_700_000_000_000_000_000)
        );
        assert_eq!(
            normalize(&Cell::String("1700000000".into()), Some(&s), never),
            TimestampOutcome::Nanos(1_700_000_000_000_000_000)
        );
    }

    #[test]
    fn other_units_scale() {
        let cell = Cell::Int(1_700_000_000_123);
        assert_eq!(
            normalize(&cell, Some(&spec(Some(TimeUnit::Ms), None)), never),
            TimestampOutcome::Nanos(1_700_000_000_123_000_000)
        );
        assert_eq!(
            normalize(&Cell::Int(5), Some(&spec(Some(TimeUnit::Us), None)), never),
            TimestampOutcome::Nanos(5_000)
        );
        assert_eq!(
            normalize(&Cell::Int(5), Some(&spec(Some(TimeUnit::Ns), None)), never),
            TimestampOutcome::Nanos(5)
        );
        assert_eq!(
            normalize(&Cell::Float(1.5), Some(&spec(Some(TimeUnit::S), None)), never),
            TimestampOutcome::Nanos(1_500_000_000)
        );
    }

    #[test]
    fn no_column_uses_clock() {
        assert_eq!(normalize(&Cell::Empty, None, || 42), TimestampOutcome::Nanos(42));
    }

    #[test]
    fn empty_and_garbage_drop() {
        let s = spec(Some(TimeUnit::S), None);
        assert!(matches!(normalize(&Cell::Empty, Some(&s), never), TimestampOutcome::Drop(_)));
        assert!(matches!(
            normalize(&Cell::String("soon".into()), Some(&s), never),
            TimestampOutcome::Drop(_)
        ));
        assert!(matches!(
            normalize(&Cell::Int(i64::MAX), Some(&s), never),
            TimestampOutcome::Drop(_)
        ));
    }

    #[test]
    fn unit_falls_back_to_format() {
        let s = spec(Some(TimeUnit::S), Some("%Y-%m-%d %H:%M:%S"));
        assert_eq!(
            normalize(&Cell::String("2023-11-14 22:13:20".into()), Some(&s), never),
            TimestampOutcome::Nanos(1_700_000_000_000_000_000)
        );
    }

    #[test]
    fn format_only_handles_dates_and_offsets() {
        let s = spec(None, Some("%Y-%m-%d"));
        assert_eq!(
            normalize(&Cell::String("1970-01-02".into()), Some(&s), never),
            TimestampOutcome::Nanos(86_400_000_000_000)
        );

        let zoned = spec(None, Some("%Y-%m-%dT%H:%M:%S%z"));
        assert_eq!(
            normalize(&Cell::String("1970-01-01T08:00:00+0800".into()), Some(&zoned), never),
            TimestampOutcome::Nanos(0)
        );

        let mut local = spec(None, Some("%Y-%m-%d %H:%M:%S"));
        local.utc_offset_secs = 8 * 3600;
        assert_eq!(
            normalize(&Cell::String("1970-01-01 08:00:00".into()), Some(&local), never),
            TimestampOutcome::Nanos(0)
        );
    }

    #[test]
    fn excel_serial_conversion() {
        let s = spec(Some(TimeUnit::S), None);
        // 1970-01-01 00:00:00
        assert_eq!(
            normalize(&Cell::DateTime(25_569.0), Some(&s), never),
            TimestampOutcome::Nanos(0)
        );
        // 2023-11-14 12:00:00
        assert_eq!(
            excel_serial_to_nanos(45_244.5, 0),
            Some(1_699_963_200_000_000_000)
        );
        // Same wall time read as UTC+8.
        assert_eq!(
            excel_serial_to_nanos(45_244.5, 8 * 3600),
            Some(1_699_963_200_000_000_000 - 8 * 3600 * 1_000_000_000)
        );
        assert_eq!(excel_serial_to_nanos(f64::NAN, 0), None);
    }
}
