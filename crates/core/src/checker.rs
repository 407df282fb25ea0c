//! Per-field due-checking for cron segments.
//!
//! A segment is evaluated lazily against a reference time's calendar
//! components rather than being expanded into a value set: the search loop
//! re-checks segments against a moving candidate, so parsing stays cheap
//! and stateless.
//!
//! Supported syntax per segment: `*`/`?`, comma lists, `a-b` ranges,
//! `*/s`, `a/s` and `a-b/s` steps, month names (`JAN`-`DEC`), weekday
//! names (`SUN`-`SAT`, with `7` as an alias for Sunday), and the day
//! modifiers `L`, `<n>W`, `<n>L`, and `<n>#<m>`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};

use crate::error::CronError;
use crate::field::Field;
use crate::segment::segments;

// ── Checker capability ──────────────────────────────────────────────

/// Capability interface the search loop consumes.
///
/// Any implementation may be substituted, which keeps the search loop
/// testable with stub checkers reporting fixed due/not-due sequences.
pub trait Checker {
    /// Set the reference time subsequent checks are evaluated against.
    fn set_ref(&mut self, reference: NaiveDateTime);

    /// Whether the reference's component satisfies `segment` at `field`.
    fn check_due(&self, segment: &str, field: Field) -> Result<bool, CronError>;
}

/// Default [`Checker`] over the reference's calendar components.
///
/// Holds nothing across calls beyond the reference set immediately before
/// each check, so one instance may be reused for any number of checks.
#[derive(Debug, Clone)]
pub struct SegmentChecker {
    reference: NaiveDateTime,
}

impl SegmentChecker {
    pub fn new() -> Self {
        Self {
            reference: DateTime::<Utc>::UNIX_EPOCH.naive_utc(),
        }
    }
}

impl Default for SegmentChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker for SegmentChecker {
    fn set_ref(&mut self, reference: NaiveDateTime) {
        self.reference = reference;
    }

    fn check_due(&self, segment: &str, field: Field) -> Result<bool, CronError> {
        if segment == "*" || segment == "?" {
            return Ok(true);
        }
        for offset in segment.split(',') {
            if offset_due(offset, field, &self.reference)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

// ── Convenience checks ──────────────────────────────────────────────

/// Whether `expr` is due at `at`. Minute is the finest granularity;
/// seconds in the reference are ignored.
pub fn is_due<Tz: TimeZone>(expr: &str, at: &DateTime<Tz>) -> Result<bool, CronError> {
    let segs = segments(expr)?;
    let mut checker = SegmentChecker::new();
    expression_due(&mut checker, &segs, at)
}

/// Whether `expr` is due right now (UTC wall clock).
pub fn is_due_now(expr: &str) -> Result<bool, CronError> {
    is_due(expr, &Utc::now())
}

/// Whether `expr` tokenizes into 5 or 6 fields and every segment parses
/// cleanly. A valid expression may still never match (e.g. February 30th).
pub fn is_valid(expr: &str) -> bool {
    let segs = match segments(expr) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let mut checker = SegmentChecker::new();
    checker.set_ref(DateTime::<Utc>::UNIX_EPOCH.naive_utc());
    segs.iter().enumerate().all(|(pos, seg)| {
        Field::from_pos(pos).is_some_and(|field| checker.check_due(seg, field).is_ok())
    })
}

/// All-segments check against a single reference; fields are ANDed.
pub(crate) fn expression_due<Tz: TimeZone, C: Checker>(
    checker: &mut C,
    segs: &[String],
    at: &DateTime<Tz>,
) -> Result<bool, CronError> {
    checker.set_ref(at.naive_local());
    for (pos, seg) in segs.iter().enumerate() {
        let field = match Field::from_pos(pos) {
            Some(f) => f,
            None => break,
        };
        if !checker.check_due(seg, field)? {
            return Ok(false);
        }
    }
    Ok(true)
}

// ── Offset matching ─────────────────────────────────────────────────

const MONTH_NAMES: [(&str, u32); 12] = [
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

const DAY_NAMES: [(&str, u32); 7] = [
    ("sun", 0),
    ("mon", 1),
    ("tue", 2),
    ("wed", 3),
    ("thu", 4),
    ("fri", 5),
    ("sat", 6),
];

fn offset_due(offset: &str, field: Field, reference: &NaiveDateTime) -> Result<bool, CronError> {
    match field {
        Field::DayOfMonth => {
            if let Some(due) = day_of_month_modifier(offset, reference)? {
                return Ok(due);
            }
        }
        Field::DayOfWeek => {
            if let Some(due) = day_of_week_modifier(offset, reference)? {
                return Ok(due);
            }
        }
        _ => {}
    }
    pattern_due(&named_to_numeric(offset, field), field, field.component(reference))
}

/// Day-of-month modifiers: `L` (last day of month) and `<n>W` (nearest
/// weekday to day n within the month). `None` when `offset` is an
/// ordinary numeric pattern.
fn day_of_month_modifier(
    offset: &str,
    reference: &NaiveDateTime,
) -> Result<Option<bool>, CronError> {
    let upper = offset.to_ascii_uppercase();
    if upper == "L" {
        let last = last_day_of_month(reference.year(), reference.month());
        return Ok(Some(reference.day() == last));
    }
    if let Some(raw_day) = upper.strip_suffix('W') {
        let day: u32 = raw_day
            .parse()
            .map_err(|_| parse_err(offset, "invalid nearest-weekday value"))?;
        if !(1..=31).contains(&day) {
            return Err(parse_err(offset, "day out of range 1-31"));
        }
        let target = nearest_weekday(reference.year(), reference.month(), day)
            .ok_or_else(|| parse_err(offset, "no such calendar day"))?;
        return Ok(Some(reference.day() == target));
    }
    Ok(None)
}

/// Day-of-week modifiers: `<n>L` (last weekday n of the month) and
/// `<n>#<m>` (m-th weekday n of the month). `None` when `offset` is an
/// ordinary numeric pattern.
fn day_of_week_modifier(
    offset: &str,
    reference: &NaiveDateTime,
) -> Result<Option<bool>, CronError> {
    let upper = named_to_numeric(offset, Field::DayOfWeek).to_ascii_uppercase();
    if let Some(raw_dow) = upper.strip_suffix('L') {
        let dow = parse_weekday(offset, raw_dow)?;
        let last = last_day_of_month(reference.year(), reference.month());
        return Ok(Some(
            weekday_matches(reference, dow) && reference.day() + 7 > last,
        ));
    }
    if let Some((raw_dow, raw_nth)) = upper.split_once('#') {
        let dow = parse_weekday(offset, raw_dow)?;
        let nth: u32 = raw_nth
            .parse()
            .map_err(|_| parse_err(offset, "invalid nth-weekday ordinal"))?;
        if !(1..=5).contains(&nth) {
            return Err(parse_err(offset, "nth-weekday ordinal out of range 1-5"));
        }
        return Ok(Some(
            weekday_matches(reference, dow) && (reference.day() - 1) / 7 + 1 == nth,
        ));
    }
    Ok(None)
}

fn parse_weekday(offset: &str, raw: &str) -> Result<u32, CronError> {
    let dow: u32 = raw
        .parse()
        .map_err(|_| parse_err(offset, "invalid weekday value"))?;
    if dow > 7 {
        return Err(parse_err(offset, "weekday out of range 0-7"));
    }
    Ok(dow % 7)
}

fn weekday_matches(reference: &NaiveDateTime, dow: u32) -> bool {
    reference.weekday().num_days_from_sunday() == dow
}

/// Replace `JAN`-`DEC` / `SUN`-`SAT` tokens with their numeric values.
fn named_to_numeric(offset: &str, field: Field) -> String {
    let names: &[(&str, u32)] = match field {
        Field::Month => &MONTH_NAMES,
        Field::DayOfWeek => &DAY_NAMES,
        _ => return offset.to_string(),
    };
    let mut out = offset.to_ascii_lowercase();
    for (name, value) in names {
        if out.contains(name) {
            out = out.replace(name, &value.to_string());
        }
    }
    out
}

/// Exact / range / step matching for a single numeric offset.
fn pattern_due(pattern: &str, field: Field, value: u32) -> Result<bool, CronError> {
    let (min, max) = field.bounds();

    let (range, step) = match pattern.split_once('/') {
        Some((range, raw_step)) => {
            let step: u32 = raw_step
                .parse()
                .map_err(|_| parse_err(pattern, "invalid step"))?;
            if step == 0 {
                return Err(parse_err(pattern, "step cannot be 0"));
            }
            (range, Some(step))
        }
        None => (pattern, None),
    };

    let (lo, hi) = if range == "*" || range == "?" {
        (min, max)
    } else if let Some((a, b)) = range.split_once('-') {
        (parse_bound(pattern, field, a)?, parse_bound(pattern, field, b)?)
    } else {
        let bound = parse_bound(pattern, field, range)?;
        // A bare value with a step is an open-ended range, e.g. `5/15`.
        match step {
            Some(_) => (bound, max),
            None => (bound, bound),
        }
    };
    if lo > hi {
        return Err(parse_err(pattern, "range start after end"));
    }

    let step = step.unwrap_or(1);
    let hit = |v: u32| v >= lo && v <= hi && (v - lo) % step == 0;
    // Weekday 7 is an alias for Sunday.
    Ok(hit(value) || (field == Field::DayOfWeek && hit(value + 7)))
}

fn parse_bound(pattern: &str, field: Field, raw: &str) -> Result<u32, CronError> {
    let (min, max) = field.bounds();
    let value: u32 = raw
        .parse()
        .map_err(|_| parse_err(pattern, "invalid numeric value"))?;
    if value < min || value > max {
        return Err(parse_err(pattern, "value out of range"));
    }
    Ok(value)
}

fn parse_err(segment: &str, reason: &str) -> CronError {
    CronError::Parse(segment.to_string(), reason.to_string())
}

// ── Calendar helpers ────────────────────────────────────────────────

/// Last calendar day of the given month.
pub(crate) fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Nearest weekday (Mon-Fri) to day `day`, clamped within the month.
fn nearest_weekday(year: i32, month: u32, day: u32) -> Option<u32> {
    let last = last_day_of_month(year, month);
    let day = day.min(last);
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(match date.weekday() {
        Weekday::Sat => {
            if day > 1 {
                day - 1
            } else {
                day + 2
            }
        }
        Weekday::Sun => {
            if day < last {
                day + 1
            } else {
                day - 2
            }
        }
        _ => day,
    })
}
