//! Fixed-width year periods.
//!
//! Periods partition the observed year range without gaps or overlap; the
//! trailing period may be narrower than `period_size` but is never dropped.

use std::fmt;

use serde::Serialize;

/// A contiguous inclusive year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    pub start: i32,
    pub end: i32,
}

impl Period {
    /// Display label: `"1990"` for single-year periods, `"1990-1994"` otherwise.
    pub fn label(&self) -> String {
        if self.start == self.end {
            self.start.to_string()
        } else {
            format!("{}-{}", self.start, self.end)
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Partition `[year_min, year_max]` into periods of `period_size` years,
/// in increasing year order.
pub fn partition(year_min: i32, year_max: i32, period_size: u32) -> Vec<Period> {
    debug_assert!(period_size > 0);
    debug_assert!(year_min <= year_max);
    let step = period_size as i32;
    let mut periods = Vec::new();
    let mut start = year_min;
    while start <= year_max {
        periods.push(Period {
            start,
            end: (start + step - 1).min(year_max),
        });
        start += step;
    }
    periods
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_partial_period_is_kept() {
        let periods = partition(1990, 1994, 2);
        let labels: Vec<String> = periods.iter().map(Period::label).collect();
        assert_eq!(labels, vec!["1990-1991", "1992-1993", "1994"]);
    }

    #[test]
    fn width_one_gives_single_year_labels() {
        let periods = partition(1990, 1992, 1);
        let labels: Vec<String> = periods.iter().map(Period::label).collect();
        assert_eq!(labels, vec!["1990", "1991", "1992"]);
    }

    #[test]
    fn periods_are_gapless_and_disjoint() {
        let periods = partition(1950, 2003, 7);
        let mut next = 1950;
        for p in &periods {
            assert_eq!(p.start, next);
            assert!(p.end >= p.start);
            next = p.end + 1;
        }
        assert_eq!(next, 2004);
    }

    #[test]
    fn single_year_range() {
        assert_eq!(partition(1990, 1990, 5), vec![Period { start: 1990, end: 1990 }]);
    }
}
