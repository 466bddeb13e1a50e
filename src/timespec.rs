//! Time expressions accepted by `--from` / `--to`.
//!
//! An expression is either an absolute timestamp, the literal `now`, or a
//! signed offset from now such as `-7days` or `+2h`. Offsets without a sign
//! point into the past.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, Utc};

use crate::error::ReportError;

/// Naive layouts tried after RFC 3339, all read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    fn from_suffix(s: &str) -> Option<Self> {
        let unit = match s.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => TimeUnit::Seconds,
            "m" | "min" | "mins" | "minute" | "minutes" => TimeUnit::Minutes,
            "h" | "hr" | "hrs" | "hour" | "hours" => TimeUnit::Hours,
            "d" | "day" | "days" => TimeUnit::Days,
            "w" | "wk" | "wks" | "week" | "weeks" => TimeUnit::Weeks,
            _ => return None,
        };
        Some(unit)
    }

    pub fn seconds(self) -> i64 {
        match self {
            TimeUnit::Seconds => 1,
            TimeUnit::Minutes => 60,
            TimeUnit::Hours => 3_600,
            TimeUnit::Days => 86_400,
            TimeUnit::Weeks => 604_800,
        }
    }

    fn name(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
        }
    }
}

/// A parsed, not yet resolved, point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSpec {
    Absolute(DateTime<Utc>),
    Now,
    /// Signed offset from now; negative values lie in the past.
    Relative { offset: i64, unit: TimeUnit },
}

impl TimeSpec {
    /// Parses a user-supplied expression.
    ///
    /// # Errors
    /// Returns [`ReportError::InvalidTimeExpression`] when the input is neither
    /// a recognized timestamp, `now`, nor `<sign><integer><unit>`.
    pub fn parse(input: &str) -> Result<Self, ReportError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ReportError::invalid_time(input, "empty expression"));
        }
        if s.eq_ignore_ascii_case("now") {
            return Ok(TimeSpec::Now);
        }
        if let Some(ts) = parse_absolute(s) {
            return Ok(TimeSpec::Absolute(ts));
        }
        if let Some(epoch) = s.strip_prefix('@') {
            let secs: i64 = epoch
                .parse()
                .map_err(|_| ReportError::invalid_time(input, "expected epoch seconds after '@'"))?;
            let ts = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| ReportError::invalid_time(input, "epoch seconds out of range"))?;
            return Ok(TimeSpec::Absolute(ts));
        }
        parse_relative(input, s)
    }

    /// Resolves against `now`, the instant the invocation is evaluated at.
    ///
    /// # Errors
    /// Returns [`ReportError::InvalidTimeExpression`] if the offset leaves the
    /// representable time range.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ReportError> {
        match *self {
            TimeSpec::Absolute(ts) => Ok(ts),
            TimeSpec::Now => Ok(now),
            TimeSpec::Relative { offset, unit } => offset
                .checked_mul(unit.seconds())
                .and_then(TimeDelta::try_seconds)
                .and_then(|delta| now.checked_add_signed(delta))
                .ok_or_else(|| ReportError::invalid_time(&self.to_string(), "offset out of range")),
        }
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, TimeSpec::Absolute(_))
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, TimeSpec::Relative { .. })
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSpec::Absolute(ts) => write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            TimeSpec::Now => f.write_str("now"),
            TimeSpec::Relative { offset, unit } => write!(f, "{offset:+}{}", unit.name()),
        }
    }
}

/// Parses `input` and resolves it against `now` in one step.
///
/// # Errors
/// See [`TimeSpec::parse`] and [`TimeSpec::resolve`].
pub fn parse_time_expression(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ReportError> {
    TimeSpec::parse(input)?.resolve(now)
}

fn parse_absolute(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_relative(input: &str, s: &str) -> Result<TimeSpec, ReportError> {
    let (negative, rest) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (true, s),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return Err(ReportError::invalid_time(
            input,
            "expected a timestamp, 'now', or an offset like -7days",
        ));
    }
    let (digits, suffix) = rest.split_at(digits_end);
    let suffix = suffix.trim_start();
    if suffix.is_empty() {
        return Err(ReportError::invalid_time(input, "missing unit (e.g. days, hours, minutes)"));
    }
    let unit = TimeUnit::from_suffix(suffix)
        .ok_or_else(|| ReportError::invalid_time(input, format!("unknown unit '{suffix}'")))?;
    let magnitude: i64 = digits
        .parse()
        .map_err(|_| ReportError::invalid_time(input, "offset too large"))?;

    let offset = if negative { -magnitude } else { magnitude };
    Ok(TimeSpec::Relative { offset, unit })
}

/// A resolved `from`/`to` pair together with the raw user input.
#[derive(Debug, Clone)]
pub struct TimeRange {
    pub from_input: String,
    pub to_input: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Parses both ends and resolves them against the same `now`.
    ///
    /// Mixing an absolute timestamp with a relative offset is rejected; `now`
    /// pairs with either.
    ///
    /// # Errors
    /// [`ReportError::InvalidTimeExpression`] for unparsable or mixed input,
    /// [`ReportError::InvalidTimeRange`] when `from` resolves after `to`.
    pub fn resolve(from_input: &str, to_input: &str, now: DateTime<Utc>) -> Result<Self, ReportError> {
        let from_spec = TimeSpec::parse(from_input)?;
        let to_spec = TimeSpec::parse(to_input)?;

        if (from_spec.is_absolute() && to_spec.is_relative())
            || (from_spec.is_relative() && to_spec.is_absolute())
        {
            return Err(ReportError::invalid_time(
                &format!("{from_input} .. {to_input}"),
                "cannot mix an absolute timestamp with a relative offset",
            ));
        }

        let from = from_spec.resolve(now)?;
        let to = to_spec.resolve(now)?;
        if from > to {
            return Err(ReportError::InvalidTimeRange {
                from: from_input.to_string(),
                to: to_input.to_string(),
            });
        }

        Ok(TimeRange {
            from_input: from_input.to_string(),
            to_input: to_input.to_string(),
            from,
            to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn now_resolves_to_injected_clock() {
        assert_eq!(parse_time_expression("now", fixed_now()).unwrap(), fixed_now());
        assert_eq!(parse_time_expression("  NOW ", fixed_now()).unwrap(), fixed_now());
    }

    #[test]
    fn relative_offsets_resolve_exactly() {
        let now = fixed_now();
        let cases = [
            ("-7days", now - TimeDelta::days(7)),
            ("-40days", now - TimeDelta::days(40)),
            ("+2h", now + TimeDelta::hours(2)),
            ("-30minutes", now - TimeDelta::minutes(30)),
            ("-90s", now - TimeDelta::seconds(90)),
            ("-1weeks", now - TimeDelta::weeks(1)),
            ("-3 Hours", now - TimeDelta::hours(3)),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_time_expression(input, now).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn unsigned_offset_points_into_the_past() {
        let spec = TimeSpec::parse("7days").unwrap();
        assert_eq!(
            spec,
            TimeSpec::Relative {
                offset: -7,
                unit: TimeUnit::Days
            }
        );
        assert_eq!(spec.resolve(fixed_now()).unwrap(), fixed_now() - TimeDelta::days(7));
    }

    #[test]
    fn absolute_formats_are_recognized() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        for input in [
            "2024-03-01T08:30:00Z",
            "2024-03-01T09:30:00+01:00",
            "2024-03-01T08:30:00",
            "2024-03-01 08:30:00",
            "2024-03-01 08:30",
            "@1709281800",
        ] {
            assert_eq!(TimeSpec::parse(input).unwrap(), TimeSpec::Absolute(expected), "{input}");
        }
        assert_eq!(
            TimeSpec::parse("2024-03-01").unwrap(),
            TimeSpec::Absolute(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn absolute_timestamp_round_trips_through_display() {
        let spec = TimeSpec::parse("2023-11-05T23:59:59Z").unwrap();
        let again = TimeSpec::parse(&spec.to_string()).unwrap();
        assert_eq!(spec, again);
        assert_eq!(spec.resolve(fixed_now()).unwrap(), again.resolve(fixed_now()).unwrap());
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        for input in ["tomorrow", "", "   ", "-7", "7", "+", "-days", "7fortnights", "@abc", "2024-13-01"] {
            let err = TimeSpec::parse(input).unwrap_err();
            assert!(
                matches!(err, ReportError::InvalidTimeExpression { .. }),
                "{input:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn huge_offsets_fail_instead_of_panicking() {
        let err = parse_time_expression("-99999999999999weeks", fixed_now()).unwrap_err();
        assert!(matches!(err, ReportError::InvalidTimeExpression { .. }));
        let err = parse_time_expression("-99999999999999999999days", fixed_now()).unwrap_err();
        assert!(matches!(err, ReportError::InvalidTimeExpression { .. }));
    }

    #[test]
    fn range_keeps_raw_inputs_and_resolves_both_ends() {
        let range = TimeRange::resolve("-7days", "now", fixed_now()).unwrap();
        assert_eq!(range.from_input, "-7days");
        assert_eq!(range.to_input, "now");
        assert_eq!(range.from, fixed_now() - TimeDelta::days(7));
        assert_eq!(range.to, fixed_now());
    }

    #[test]
    fn range_rejects_mixed_modes() {
        let err = TimeRange::resolve("2024-01-01", "-1days", fixed_now()).unwrap_err();
        assert!(matches!(err, ReportError::InvalidTimeExpression { .. }));
        let err = TimeRange::resolve("-10days", "2024-06-14", fixed_now()).unwrap_err();
        assert!(matches!(err, ReportError::InvalidTimeExpression { .. }));
        // `now` pairs with either mode
        assert!(TimeRange::resolve("2024-01-01", "now", fixed_now()).is_ok());
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let err = TimeRange::resolve("-1days", "-7days", fixed_now()).unwrap_err();
        assert!(matches!(err, ReportError::InvalidTimeRange { .. }));
    }
}
