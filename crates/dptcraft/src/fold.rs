//! Pure functions that fold several raw sub-fields into one computed value.
//!
//! Sub-fields are addressed by name (`year`, `month`, `day`, `hour`,
//! `minute`, `second`), so their wire order is free. Only plain arithmetic is
//! performed: no time zones, leap seconds or date validation on decode.

use crate::value::{Value, ValueKind};

const SECONDS_PER_DAY: i64 = 86_400;

/// Widest raw sub-field a fold accepts. Every fold stays within its output
/// type for inputs of this width.
pub const MAX_INPUT_BITS: usize = 16;

/// How a raw year sub-field maps to a calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearBase {
    /// `year = raw + base`.
    Offset(u16),
    /// Two-digit year: `raw >= 90` is `1900 + raw`, otherwise `2000 + raw`.
    Century1990,
}

impl YearBase {
    fn year(&self, raw: u64) -> i64 {
        match *self {
            YearBase::Offset(base) => base as i64 + raw as i64,
            YearBase::Century1990 if raw >= 90 => 1900 + raw as i64,
            YearBase::Century1990 => 2000 + raw as i64,
        }
    }

    fn raw(&self, year: i64) -> Option<u64> {
        match *self {
            YearBase::Offset(base) => u64::try_from(year - base as i64).ok(),
            YearBase::Century1990 => {
                (1990..=2089).contains(&year).then(|| (year % 100) as u64)
            }
        }
    }
}

/// A fold function selectable from catalog data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    /// `hour, minute, second` → seconds since midnight (`U32`).
    SecondsOfDay,
    /// `year, month, day` → days since 1970-01-01 (`I32`).
    EpochDays { year: YearBase },
    /// `year, month, day, hour, minute, second` → seconds since the Unix epoch (`I64`).
    EpochSeconds { year: YearBase },
}

impl Fold {
    /// Names of the sub-fields this fold consumes.
    pub fn inputs(&self) -> &'static [&'static str] {
        match self {
            Fold::SecondsOfDay => &["hour", "minute", "second"],
            Fold::EpochDays { .. } => &["year", "month", "day"],
            Fold::EpochSeconds { .. } => &["year", "month", "day", "hour", "minute", "second"],
        }
    }

    /// Kind of the folded value.
    pub fn output(&self) -> ValueKind {
        match self {
            Fold::SecondsOfDay => ValueKind::U32,
            Fold::EpochDays { .. } => ValueKind::I32,
            Fold::EpochSeconds { .. } => ValueKind::I64,
        }
    }

    /// Folds raw sub-field values, looked up by name through `part`.
    pub fn fold(&self, part: impl Fn(&str) -> u64) -> Value {
        let time_of_day =
            || part("hour") as i64 * 3600 + part("minute") as i64 * 60 + part("second") as i64;
        let days = |base: &YearBase| {
            days_from_civil(base.year(part("year")), part("month") as i64, part("day") as i64)
        };

        match self {
            Fold::SecondsOfDay => Value::U32(time_of_day() as u32),
            Fold::EpochDays { year } => Value::I32(days(year) as i32),
            Fold::EpochSeconds { year } => Value::I64(days(year) * SECONDS_PER_DAY + time_of_day()),
        }
    }

    /// Splits a folded value back into raw sub-field values.
    ///
    /// Returns `None` when `value` has the wrong kind or lies outside what the
    /// sub-fields can express.
    pub fn unfold(&self, value: &Value) -> Option<Vec<(&'static str, u64)>> {
        match (self, value) {
            (Fold::SecondsOfDay, Value::U32(secs)) => {
                let secs = *secs as i64;
                if secs >= SECONDS_PER_DAY {
                    return None;
                }
                Some(split_time(secs))
            }
            (Fold::EpochDays { year }, Value::I32(days)) => split_date(year, *days as i64),
            (Fold::EpochSeconds { year }, Value::I64(secs)) => {
                let mut parts =
                    split_date(year, secs.checked_div_euclid(SECONDS_PER_DAY)?)?;
                parts.extend(split_time(secs.rem_euclid(SECONDS_PER_DAY)));
                Some(parts)
            }
            _ => None,
        }
    }
}

fn split_time(secs: i64) -> Vec<(&'static str, u64)> {
    vec![
        ("hour", (secs / 3600) as u64),
        ("minute", (secs % 3600 / 60) as u64),
        ("second", (secs % 60) as u64),
    ]
}

fn split_date(base: &YearBase, days: i64) -> Option<Vec<(&'static str, u64)>> {
    let (year, month, day) = civil_from_days(days);
    Some(vec![
        ("year", base.raw(year)?),
        ("month", month as u64),
        ("day", day as u64),
    ])
}

/// Days since 1970-01-01 in the proleptic Gregorian calendar.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year - era * 400;
    let mp = (month + 9).rem_euclid(12);
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}
