use crate::error::{PriceEngineError, Result};
use chrono::{Datelike, Days, NaiveDate};
use std::f64::consts::PI;

/// Length of the cycle used by the day-of-year encoding.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// 1-based day of the year (1..=366).
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// Maps a day of the year onto the unit circle as `[sin, cos]`, so the last
/// day of one year sits next to the first day of the next.
pub fn cyclical_features(day_of_year: u32) -> [f64; 2] {
    let phase = 2.0 * PI * day_of_year as f64 / DAYS_PER_YEAR;
    [phase.sin(), phase.cos()]
}

pub fn date_features(date: NaiveDate) -> [f64; 2] {
    cyclical_features(day_of_year(date))
}

pub fn feature_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

/// `count` consecutive dates ending on `end`, oldest first.
pub fn trailing_days(end: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    (0..count)
        .rev()
        .map(|offset| {
            end.checked_sub_days(Days::new(offset as u64)).ok_or_else(|| {
                PriceEngineError::DateError(format!(
                    "{} minus {} days is out of range",
                    end, offset
                ))
            })
        })
        .collect()
}

/// The `count` dates strictly after `start`.
pub fn upcoming_days(start: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    (1..=count)
        .map(|offset| {
            start.checked_add_days(Days::new(offset as u64)).ok_or_else(|| {
                PriceEngineError::DateError(format!(
                    "{} plus {} days is out of range",
                    start, offset
                ))
            })
        })
        .collect()
}

/// Evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}
