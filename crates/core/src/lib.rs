//! Cron expression tick computation.
//!
//! This crate provides:
//! - Next/previous tick search with bounded iteration and per-field bumps
//! - Inclusive/exclusive reference-time semantics at full seconds precision
//! - Unreachable-year pruning for 6-field expressions
//! - Segment tokenizer with `@`-macro expansion
//! - Per-field due checking (`*`, lists, ranges, steps, names, `L`/`W`/`#`)
//! - Batch due-checks over many expressions

pub mod batch;
pub mod checker;
pub mod error;
pub mod field;
pub mod search;
pub mod segment;

pub use batch::{batch_due, batch_due_now, BatchResult};
pub use checker::{is_due, is_due_now, is_valid, Checker, SegmentChecker};
pub use error::CronError;
pub use field::Field;
pub use search::{
    is_unreachable_year, next_tick, next_tick_after, prev_tick, prev_tick_before,
};
pub use segment::segments;
