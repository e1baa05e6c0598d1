//! Date module: format-aware date parsing and ordering for date snippets and rules.
//!
//! Snippet configurations describe date formats with moment-style tokens
//! (`DD.MM.YYYY`, `YYYY-MM-DD HH:mm`). They are translated to chrono format
//! strings before parsing.

use crate::types::Value;
use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

/// Format assumed when a snippet or rule does not carry one.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

/// Translates a moment-style format into a chrono format string.
///
/// Text inside square brackets is copied literally; unknown letters are kept
/// as literal characters.
pub fn moment_to_chrono_format(format: &str) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::with_capacity(format.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '[' {
            i += 1;
            while i < chars.len() && chars[i] != ']' {
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        let spec = match (c, run) {
            ('Y', 4) => Some("%Y"),
            ('Y', 2) => Some("%y"),
            ('M', 1) | ('M', 2) => Some("%m"),
            ('D', 1) | ('D', 2) => Some("%d"),
            ('H', 1) | ('H', 2) => Some("%H"),
            ('h', 1) | ('h', 2) => Some("%I"),
            ('m', 1) | ('m', 2) => Some("%M"),
            ('s', 1) | ('s', 2) => Some("%S"),
            ('A', 1) | ('a', 1) => Some("%p"),
            _ => None,
        };
        match spec {
            Some(spec) => out.push_str(spec),
            None => (0..run).for_each(|_| push_literal(&mut out, c)),
        }
        i += run;
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn has_time(chrono_format: &str) -> bool {
    ["%H", "%I", "%M", "%S"].iter().any(|spec| chrono_format.contains(spec))
}

/// Parses `input` with a moment-style `format`, falling back to ISO 8601.
///
/// Formats may leave out the day or the month (`MM.YYYY`, `YYYY`); the
/// missing fields default to the first day or month.
pub fn parse_date(input: &str, format: Option<&str>) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let chrono_format = moment_to_chrono_format(format.unwrap_or(DEFAULT_DATE_FORMAT));
    parse_with_format(input, &chrono_format).or_else(|| parse_iso(input))
}

fn parse_with_format(input: &str, chrono_format: &str) -> Option<NaiveDateTime> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, input, StrftimeItems::new(chrono_format)).ok()?;
    // Setters only fill fields the input left empty; a conflict keeps the parsed value.
    let _ = parsed.set_month(1);
    let _ = parsed.set_day(1);
    let date = parsed.to_naive_date().ok()?;
    if !has_time(chrono_format) {
        return date.and_hms_opt(0, 0, 0);
    }
    let _ = parsed.set_minute(0);
    Some(date.and_time(parsed.to_naive_time().ok()?))
}

fn parse_iso(input: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Reads a value as a date: strings through `format`, numbers as epoch milliseconds.
pub fn value_to_date(value: &Value, format: Option<&str>) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_date(s, format),
        Value::Number(ms) if ms.is_finite() => {
            DateTime::from_timestamp_millis(*ms as i64).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

/// Orders two date strings by their parsed value.
///
/// An unparsable date sorts after every valid date; two unparsable dates are equal.
pub fn snippet_date_compare(a: &str, b: &str, format: Option<&str>) -> Ordering {
    match (parse_date(a, format), parse_date(b, format)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moment_to_chrono_format() {
        assert_eq!(moment_to_chrono_format("DD.MM.YYYY"), "%d.%m.%Y");
        assert_eq!(moment_to_chrono_format("YYYY-MM-DD HH:mm:ss"), "%Y-%m-%d %H:%M:%S");
        assert_eq!(moment_to_chrono_format("D/M/YY"), "%d/%m/%y");
        assert_eq!(moment_to_chrono_format("[Q]YYYY 100%"), "Q%Y 100%%");
    }

    #[test]
    fn test_parse_date_with_format() {
        let d = parse_date("24.12.2021", Some("DD.MM.YYYY")).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2021, 12, 24).unwrap().and_hms_opt(0, 0, 0).unwrap());
        let dt = parse_date("2021-12-24 18:30", Some("YYYY-MM-DD HH:mm")).unwrap();
        assert_eq!(dt, NaiveDate::from_ymd_opt(2021, 12, 24).unwrap().and_hms_opt(18, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_date_with_partial_format() {
        let year = parse_date("2020", Some("YYYY")).unwrap();
        assert_eq!(year, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
        let month = parse_date("07.2021", Some("MM.YYYY")).unwrap();
        assert_eq!(month, NaiveDate::from_ymd_opt(2021, 7, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
        assert!(parse_date("13.2021", Some("MM.YYYY")).is_none());
        assert_eq!(snippet_date_compare("12.2020", "01.2021", Some("MM.YYYY")), Ordering::Less);
    }

    #[test]
    fn test_parse_date_iso_fallback() {
        assert!(parse_date("2021-12-24", Some("DD.MM.YYYY")).is_some());
        assert!(parse_date("2021-12-24T10:00:00Z", None).is_some());
        assert!(parse_date("not a date", None).is_none());
        assert!(parse_date("", None).is_none());
    }

    #[test]
    fn test_value_to_date_epoch_millis() {
        let d = value_to_date(&Value::from(0), None).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
        assert!(value_to_date(&Value::from(true), None).is_none());
    }

    #[test]
    fn test_snippet_date_compare_is_format_aware() {
        let fmt = Some("DD.MM.YYYY");
        // Lexically "02.01.2020" < "31.12.2019", by date it is later.
        assert_eq!(snippet_date_compare("02.01.2020", "31.12.2019", fmt), Ordering::Greater);
        assert_eq!(snippet_date_compare("31.12.2019", "02.01.2020", fmt), Ordering::Less);
        assert_eq!(snippet_date_compare("01.01.2020", "01.01.2020", fmt), Ordering::Equal);
    }

    #[test]
    fn test_snippet_date_compare_invalid_sorts_last() {
        let fmt = Some("DD.MM.YYYY");
        assert_eq!(snippet_date_compare("garbage", "01.01.2020", fmt), Ordering::Greater);
        assert_eq!(snippet_date_compare("01.01.2020", "garbage", fmt), Ordering::Less);
        assert_eq!(snippet_date_compare("garbage", "rubbish", fmt), Ordering::Equal);
    }
}
