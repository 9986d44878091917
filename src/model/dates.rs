use crate::ConfigError;
use chrono::{Days, NaiveDate};

/// Inclusive range of calendar days to harvest
///
/// A range whose start lies after its end is simply empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parses both bounds in strict `YYYY-MM-DD` form
    pub fn parse(start: &str, end: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of days in the range
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() as usize + 1
        }
    }

    /// Iterates the days of the range in ascending order
    pub fn days(&self) -> RangeDays {
        RangeDays {
            next: (!self.is_empty()).then_some(self.start),
            end: self.end,
        }
    }
}

/// Ascending iterator over the days of a [`DateRange`]
#[derive(Debug, Clone)]
pub struct RangeDays {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for RangeDays {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = if current < self.end {
            current.checked_add_days(Days::new(1))
        } else {
            None
        };
        Some(current)
    }
}

/// Parses a date in strict `YYYY-MM-DD` form
///
/// chrono alone accepts `2023-1-5`; the archive URLs need the zero-padded form,
/// so the shape is checked first.
pub fn parse_date(input: &str) -> Result<NaiveDate, ConfigError> {
    let bytes = input.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });

    if !well_formed {
        return Err(ConfigError::InvalidDate(input.to_string()));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidDate(input.to_string()))
}

/// One calendar day being crawled, with its listing page cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveDay {
    pub date: NaiveDate,
    pub page: u32,
    /// Listing pages already fetched for this day
    pub pages_fetched: u32,
}

impl ArchiveDay {
    pub fn new(date: NaiveDate, first_page: u32) -> Self {
        Self {
            date,
            page: first_page,
            pages_fetched: 0,
        }
    }

    /// The cursor for the following listing page
    ///
    /// `None` once the page number cannot grow any further.
    pub fn next_page(self) -> Option<Self> {
        Some(Self {
            page: self.page.checked_add(1)?,
            pages_fetched: self.pages_fetched.saturating_add(1),
            ..self
        })
    }
}
