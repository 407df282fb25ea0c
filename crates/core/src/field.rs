//! Positional fields of a cron expression.
//!
//! Each field owns its position mapping, probe iteration budget, numeric
//! bounds, reference-component extraction, and one-unit bump rule. The
//! budgets reflect each field's natural cardinality plus slack, not an
//! exact calendar bound.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDateTime, TimeZone, Timelike};

/// One of the six positional fields of a 5- or 6-segment expression.
///
/// Positions are fixed and meaningful:
/// `0=minute 1=hour 2=day-of-month 3=month 4=day-of-week 5=year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
    Year,
}

impl Field {
    /// Map a 0-based segment position to its field.
    pub fn from_pos(pos: usize) -> Option<Field> {
        match pos {
            0 => Some(Field::Minute),
            1 => Some(Field::Hour),
            2 => Some(Field::DayOfMonth),
            3 => Some(Field::Month),
            4 => Some(Field::DayOfWeek),
            5 => Some(Field::Year),
            _ => None,
        }
    }

    /// How many unit bumps a single-field probe may attempt.
    pub fn budget(self) -> u32 {
        match self {
            Field::Minute => 60,
            Field::Hour => 24,
            Field::DayOfMonth => 31,
            Field::Month => 12,
            Field::DayOfWeek => 366,
            Field::Year => 100,
        }
    }

    /// Inclusive numeric bounds for values in this field.
    ///
    /// Day-of-week accepts 0-7 with 7 as an alias for Sunday.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            Field::Minute => (0, 59),
            Field::Hour => (0, 23),
            Field::DayOfMonth => (1, 31),
            Field::Month => (1, 12),
            Field::DayOfWeek => (0, 7),
            Field::Year => (1, 9999),
        }
    }

    /// The reference's calendar component for this field.
    pub fn component(self, at: &NaiveDateTime) -> u32 {
        match self {
            Field::Minute => at.minute(),
            Field::Hour => at.hour(),
            Field::DayOfMonth => at.day(),
            Field::Month => at.month(),
            Field::DayOfWeek => at.weekday().num_days_from_sunday(),
            Field::Year => at.year().max(0) as u32,
        }
    }

    /// Advance (or retreat, when `reverse`) a candidate by exactly one
    /// natural unit of this field.
    ///
    /// Day, month and year bumps use calendar-aware arithmetic so month
    /// lengths and leap years are respected. `None` only on chrono range
    /// overflow.
    pub fn bump<Tz: TimeZone>(self, at: DateTime<Tz>, reverse: bool) -> Option<DateTime<Tz>> {
        match (self, reverse) {
            (Field::Minute, false) => at.checked_add_signed(Duration::minutes(1)),
            (Field::Minute, true) => at.checked_sub_signed(Duration::minutes(1)),
            (Field::Hour, false) => at.checked_add_signed(Duration::hours(1)),
            (Field::Hour, true) => at.checked_sub_signed(Duration::hours(1)),
            (Field::DayOfMonth | Field::DayOfWeek, false) => at.checked_add_days(Days::new(1)),
            (Field::DayOfMonth | Field::DayOfWeek, true) => at.checked_sub_days(Days::new(1)),
            (Field::Month, false) => at.checked_add_months(Months::new(1)),
            (Field::Month, true) => at.checked_sub_months(Months::new(1)),
            (Field::Year, false) => at.checked_add_months(Months::new(12)),
            (Field::Year, true) => at.checked_sub_months(Months::new(12)),
        }
    }
}
