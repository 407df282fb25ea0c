//! Batch due-checking over many expressions.

use chrono::{DateTime, TimeZone, Utc};

use crate::checker::is_due;
use crate::error::CronError;

/// Outcome for a single expression in a batch check.
#[derive(Debug)]
pub struct BatchResult {
    pub expr: String,
    pub due: bool,
    pub err: Option<CronError>,
}

/// Check every expression against `at`.
///
/// A malformed expression yields `due = false` with its error attached;
/// it never short-circuits the rest of the batch. Results keep input order.
pub fn batch_due<Tz: TimeZone>(exprs: &[&str], at: &DateTime<Tz>) -> Vec<BatchResult> {
    exprs
        .iter()
        .map(|expr| match is_due(expr, at) {
            Ok(due) => BatchResult {
                expr: (*expr).to_string(),
                due,
                err: None,
            },
            Err(err) => BatchResult {
                expr: (*expr).to_string(),
                due: false,
                err: Some(err),
            },
        })
        .collect()
}

/// Check every expression against now (UTC).
pub fn batch_due_now(exprs: &[&str]) -> Vec<BatchResult> {
    batch_due(exprs, &Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn mixed_batch_keeps_order_and_isolates_errors() {
        let at = Utc.with_ymd_and_hms(2021, 3, 10, 4, 5, 0).unwrap();
        let results = batch_due(&["* * * * *", "6 * * * *", "bad expr"], &at);

        assert_eq!(results.len(), 3);

        assert_eq!(results[0].expr, "* * * * *");
        assert!(results[0].due);
        assert!(results[0].err.is_none());

        assert!(!results[1].due);
        assert!(results[1].err.is_none());

        assert!(!results[2].due);
        assert!(results[2].err.is_some());
    }

    #[test]
    fn empty_batch_is_empty() {
        let at = Utc.with_ymd_and_hms(2021, 3, 10, 4, 5, 0).unwrap();
        assert!(batch_due(&[], &at).is_empty());
    }

    #[test]
    fn batch_due_now_runs_against_wall_clock() {
        let results = batch_due_now(&["* * * * *"]);
        assert!(results[0].due);
    }
}
