//! Bounded next/previous-tick search.
//!
//! Starting from a reference truncated to minute resolution, the search
//! repeatedly asks each field, in fixed priority order (minute, hour,
//! day-of-month, month, day-of-week, year), whether the current candidate
//! satisfies it. The first unsatisfied field advances the candidate by one
//! of its natural units and the scan restarts from position 0, because
//! advancing a higher-priority field can invalidate lower-priority fields
//! that were already checked.
//!
//! Contradictory expressions (e.g. February 30th) never match; the per-field
//! and outer iteration budgets convert that infinite search into a bounded
//! failure. An explicit year field whose every value lies behind the search
//! direction is rejected up front without searching at all.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use tracing::{debug, warn};

use crate::checker::{expression_due, Checker, SegmentChecker};
use crate::error::CronError;
use crate::field::Field;
use crate::segment::segments;

/// How many times the full field scan may restart before the search fails.
const OUTER_BUDGET: u32 = 500;

// ── Public API ──────────────────────────────────────────────────────

/// Next run time of `expr` from now (UTC).
pub fn next_tick(expr: &str, incl: bool) -> Result<DateTime<Utc>, CronError> {
    next_tick_after(expr, Utc::now(), incl)
}

/// Next run time of `expr` after `start`.
///
/// With `incl`, a `start` that is itself due is returned unchanged (full
/// seconds precision preserved); otherwise the result is strictly after
/// `start`. The reference carries its own timezone/offset.
pub fn next_tick_after<Tz: TimeZone>(
    expr: &str,
    start: DateTime<Tz>,
    incl: bool,
) -> Result<DateTime<Tz>, CronError> {
    tick_search(expr, start, incl, false)
}

/// Previous run time of `expr` from now (UTC).
pub fn prev_tick(expr: &str, incl: bool) -> Result<DateTime<Utc>, CronError> {
    prev_tick_before(expr, Utc::now(), incl)
}

/// Previous run time of `expr` before `start`; the reverse counterpart of
/// [`next_tick_after`].
pub fn prev_tick_before<Tz: TimeZone>(
    expr: &str,
    start: DateTime<Tz>,
    incl: bool,
) -> Result<DateTime<Tz>, CronError> {
    tick_search(expr, start, incl, true)
}

// ── Search driver ───────────────────────────────────────────────────

fn tick_search<Tz: TimeZone>(
    expr: &str,
    start: DateTime<Tz>,
    incl: bool,
    reverse: bool,
) -> Result<DateTime<Tz>, CronError> {
    let segs = segments(expr)?;
    let mut checker = SegmentChecker::new();

    if expression_due(&mut checker, &segs, &start)? && incl {
        return Ok(start);
    }

    let candidate = truncate_minute(&start);
    if segs.len() > 5 && is_unreachable_year(&segs[5], &candidate, incl, reverse) {
        debug!(year = %segs[5], reverse, "year segment unreachable, aborting search");
        return Err(CronError::UnreachableYear(segs[5].clone()));
    }

    let (found, err) = search_loop(&mut checker, &segs, candidate, incl, reverse);
    match err {
        None => Ok(found),
        Some(e @ CronError::SearchExhausted(_)) => {
            // The bounded loop can report exhaustion even though its final
            // candidate already satisfies the expression; re-validate before
            // surfacing the failure. Other error kinds are never suppressed.
            if expression_due(&mut checker, &segs, &found).unwrap_or(false) {
                debug!(expr = %expr, "suppressing exhaustion: final candidate is due");
                Ok(found)
            } else {
                warn!(expr = %expr, error = %e, "tick search exhausted its budget");
                Err(e)
            }
        }
        Some(e) => Err(e),
    }
}

/// The bounded multi-field scan.
///
/// Returns the found candidate, or the best-effort last candidate paired
/// with the error that stopped the search.
fn search_loop<Tz: TimeZone, C: Checker>(
    checker: &mut C,
    segs: &[String],
    start: DateTime<Tz>,
    incl: bool,
    reverse: bool,
) -> (DateTime<Tz>, Option<CronError>) {
    let mut candidate = start.clone();
    let mut budget = OUTER_BUDGET;

    'scan: while budget > 0 {
        budget -= 1;

        for (pos, seg) in segs.iter().enumerate() {
            if seg == "*" || seg == "?" {
                continue;
            }
            let field = match Field::from_pos(pos) {
                Some(f) => f,
                None => continue,
            };
            let (next, advanced, err) = bump_until_due(checker, seg, field, candidate, reverse);
            candidate = next;
            if let Some(e) = err {
                return (candidate, Some(e));
            }
            if advanced {
                // A bumped field can invalidate fields already checked in
                // this pass; restart from position 0.
                continue 'scan;
            }
        }

        // Every concrete field is satisfied. An exclusive search landing
        // exactly on the start is the trivial self-match; force one minute
        // past the boundary and keep going.
        if !incl && candidate.timestamp() == start.timestamp() {
            let bumped = match Field::Minute.bump(candidate.clone(), reverse) {
                Some(t) => t,
                None => return (candidate, Some(CronError::SearchExhausted(OUTER_BUDGET))),
            };
            let (next, _, err) = bump_until_due(checker, &segs[0], Field::Minute, bumped, reverse);
            candidate = next;
            if let Some(e) = err {
                return (candidate, Some(e));
            }
            continue;
        }
        return (candidate, None);
    }

    (start, Some(CronError::SearchExhausted(OUTER_BUDGET)))
}

/// Probe a single field, bumping the candidate until the field is due or
/// the field's iteration budget runs out.
///
/// Wildcard segments are pre-filtered by the caller. `advanced` reports
/// whether any bump was consumed before the field became due.
fn bump_until_due<Tz: TimeZone, C: Checker>(
    checker: &mut C,
    segment: &str,
    field: Field,
    start: DateTime<Tz>,
    reverse: bool,
) -> (DateTime<Tz>, bool, Option<CronError>) {
    let budget = field.budget();
    let mut candidate = start;
    let mut left = budget;

    while left > 0 {
        checker.set_ref(candidate.naive_local());
        match checker.check_due(segment, field) {
            Ok(true) => return (candidate, left != budget, None),
            Ok(false) => {}
            Err(e) => return (candidate, left != budget, Some(e)),
        }
        candidate = match field.bump(candidate.clone(), reverse) {
            Some(t) => t,
            None => break,
        };
        left -= 1;
    }
    (candidate, false, Some(CronError::SearchExhausted(budget)))
}

// ── Year reachability pre-check ─────────────────────────────────────

/// Whether an explicit year segment provably lies behind the search
/// direction, making the whole search pointless.
///
/// This is a fast-fail only: step offsets (`*/n`, `0/n`) and unparseable
/// parts conservatively report reachable and leave the verdict to the
/// bounded search.
pub fn is_unreachable_year<Tz: TimeZone>(
    year_segment: &str,
    reference: &DateTime<Tz>,
    incl: bool,
    reverse: bool,
) -> bool {
    if year_segment == "*" || year_segment == "?" {
        return false;
    }

    let mut edge = reference.year();
    if !incl {
        edge += if reverse { -1 } else { 1 };
    }

    for offset in year_segment.split(',') {
        if offset.starts_with("*/") || offset.starts_with("0/") {
            return false;
        }
        let bounds = offset.split('/').next().unwrap_or(offset);
        for part in bounds.split('-') {
            match part.parse::<i32>() {
                Ok(value) if (!reverse && value >= edge) || (reverse && value < edge) => {
                    return false;
                }
                Ok(_) => {}
                Err(_) => return false,
            }
        }
    }
    true
}

/// Drop seconds and sub-second precision; search stepping is minute-based.
fn truncate_minute<Tz: TimeZone>(at: &DateTime<Tz>) -> DateTime<Tz> {
    at.clone()
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or_else(|| at.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    // Stub checker reporting a fixed verdict for every concrete segment.
    struct StubChecker {
        due: bool,
    }

    impl Checker for StubChecker {
        fn set_ref(&mut self, _reference: NaiveDateTime) {}

        fn check_due(&self, _segment: &str, _field: Field) -> Result<bool, CronError> {
            Ok(self.due)
        }
    }

    fn segs(expr: &str) -> Vec<String> {
        segments(expr).unwrap()
    }

    // ── search_loop with stub checkers ──────────────────────────────

    #[test]
    fn loop_returns_start_when_inclusive_and_all_due() {
        let mut stub = StubChecker { due: true };
        let start = dt(2021, 3, 10, 4, 5, 0);
        let (found, err) = search_loop(&mut stub, &segs("0 * * * *"), start, true, false);
        assert!(err.is_none());
        assert_eq!(found, start);
    }

    #[test]
    fn loop_steps_past_self_match_when_exclusive() {
        let mut stub = StubChecker { due: true };
        let start = dt(2021, 3, 10, 4, 5, 0);
        let (found, err) = search_loop(&mut stub, &segs("0 * * * *"), start, false, false);
        assert!(err.is_none());
        assert_eq!(found, dt(2021, 3, 10, 4, 6, 0));
    }

    #[test]
    fn loop_steps_backwards_in_reverse() {
        let mut stub = StubChecker { due: true };
        let start = dt(2021, 3, 10, 4, 5, 0);
        let (found, err) = search_loop(&mut stub, &segs("0 * * * *"), start, false, true);
        assert!(err.is_none());
        assert_eq!(found, dt(2021, 3, 10, 4, 4, 0));
    }

    #[test]
    fn loop_exhausts_probe_budget_when_nothing_is_due() {
        let mut stub = StubChecker { due: false };
        let start = dt(2021, 3, 10, 4, 5, 0);
        let (found, err) = search_loop(&mut stub, &segs("0 * * * *"), start, true, false);
        assert!(matches!(err, Some(CronError::SearchExhausted(_))));
        // Best-effort candidate moved by the minute field's full budget.
        assert_eq!(found, start + chrono::Duration::minutes(60));
    }

    // ── bump_until_due ──────────────────────────────────────────────

    #[test]
    fn probe_reports_no_advance_when_immediately_due() {
        let mut checker = SegmentChecker::new();
        let start = dt(2021, 3, 10, 4, 30, 0);
        let (found, advanced, err) =
            bump_until_due(&mut checker, "30", Field::Minute, start, false);
        assert!(err.is_none());
        assert!(!advanced);
        assert_eq!(found, start);
    }

    #[test]
    fn probe_advances_to_the_due_value() {
        let mut checker = SegmentChecker::new();
        let start = dt(2021, 3, 10, 4, 20, 0);
        let (found, advanced, err) =
            bump_until_due(&mut checker, "30", Field::Minute, start, false);
        assert!(err.is_none());
        assert!(advanced);
        assert_eq!(found, dt(2021, 3, 10, 4, 30, 0));
    }

    #[test]
    fn probe_propagates_checker_errors() {
        let mut checker = SegmentChecker::new();
        let start = dt(2021, 3, 10, 4, 20, 0);
        let (_, _, err) = bump_until_due(&mut checker, "61", Field::Minute, start, false);
        assert!(matches!(err, Some(CronError::Parse(_, _))));
    }

    // ── is_unreachable_year ─────────────────────────────────────────

    #[test]
    fn wildcard_year_is_always_reachable() {
        let reference = dt(2025, 6, 15, 0, 0, 0);
        assert!(!is_unreachable_year("*", &reference, false, false));
        assert!(!is_unreachable_year("?", &reference, true, true));
    }

    #[test]
    fn past_year_is_unreachable_forward() {
        let reference = dt(2025, 6, 15, 0, 0, 0);
        assert!(is_unreachable_year("2010", &reference, false, false));
        assert!(is_unreachable_year("1990-2000", &reference, false, false));
        assert!(is_unreachable_year("2010,2012", &reference, false, false));
    }

    #[test]
    fn future_year_is_reachable_forward() {
        let reference = dt(2025, 6, 15, 0, 0, 0);
        assert!(!is_unreachable_year("2030", &reference, false, false));
        assert!(!is_unreachable_year("2010-2030", &reference, false, false));
        assert!(!is_unreachable_year("2010,2030", &reference, false, false));
    }

    #[test]
    fn step_offsets_are_conservatively_reachable() {
        let reference = dt(2025, 6, 15, 0, 0, 0);
        assert!(!is_unreachable_year("*/2", &reference, false, false));
        assert!(!is_unreachable_year("0/5", &reference, false, false));
        assert!(!is_unreachable_year("2000/4", &reference, false, false));
    }

    #[test]
    fn unparseable_year_is_conservatively_reachable() {
        let reference = dt(2025, 6, 15, 0, 0, 0);
        assert!(!is_unreachable_year("20xx", &reference, false, false));
    }

    #[test]
    fn inclusive_search_keeps_the_reference_year_reachable() {
        let reference = dt(2025, 6, 15, 0, 0, 0);
        assert!(!is_unreachable_year("2025", &reference, true, false));
        assert!(!is_unreachable_year("2025", &reference, true, true));
    }

    #[test]
    fn future_year_is_unreachable_in_reverse() {
        let reference = dt(2025, 6, 15, 0, 0, 0);
        assert!(is_unreachable_year("2030", &reference, false, true));
        assert!(!is_unreachable_year("2020", &reference, false, true));
        assert!(!is_unreachable_year("2020-2030", &reference, false, true));
    }

    // ── truncate_minute ─────────────────────────────────────────────

    #[test]
    fn truncation_drops_seconds() {
        let at = dt(2021, 3, 10, 4, 5, 42);
        assert_eq!(truncate_minute(&at), dt(2021, 3, 10, 4, 5, 0));
    }
}
