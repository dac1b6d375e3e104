//! # Sale Numbers
//!
//! Human-readable, day-scoped sale identifiers: `SALE-YYYYMMDD-NNNN`.
//!
//! ```text
//! SALE-20240305-0007
//!      ────┬─── ─┬──
//!          │     └── 7th sale of the day, zero-padded to 4 digits
//!          └──────── local calendar date of the sale
//! ```
//!
//! The sequence itself comes from the per-day counter in the database; this
//! module only formats, parses, and computes the local-day window that the
//! counter is keyed on.

use std::fmt;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const PREFIX: &str = "SALE-";

/// A validated sale number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SaleNumber {
    date: NaiveDate,
    sequence: u32,
}

impl SaleNumber {
    /// Builds the number for the `sequence`-th sale of `date`.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use smartstock_core::SaleNumber;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    /// assert_eq!(SaleNumber::new(date, 7).to_string(), "SALE-20240305-0007");
    /// ```
    pub fn new(date: NaiveDate, sequence: u32) -> SaleNumber {
        SaleNumber { date, sequence }
    }

    /// Parses `SALE-YYYYMMDD-NNNN` (four or more sequence digits).
    pub fn parse(value: &str) -> Result<SaleNumber, ValidationError> {
        let invalid = || ValidationError::InvalidFormat {
            field: "saleNumber".to_string(),
            reason: "expected SALE-YYYYMMDD-NNNN".to_string(),
        };

        let rest = value.trim().strip_prefix(PREFIX).ok_or_else(invalid)?;
        let (date_part, seq_part) = rest.split_once('-').ok_or_else(invalid)?;

        if date_part.len() != 8 || !date_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if seq_part.len() < 4 || !seq_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let date = NaiveDate::parse_from_str(date_part, "%Y%m%d").map_err(|_| invalid())?;
        let sequence: u32 = seq_part.parse().map_err(|_| invalid())?;
        if sequence == 0 {
            return Err(invalid());
        }

        Ok(SaleNumber { date, sequence })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for SaleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}-{:04}", PREFIX, self.date.format("%Y%m%d"), self.sequence)
    }
}

impl TryFrom<String> for SaleNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SaleNumber::parse(&value)
    }
}

impl From<SaleNumber> for String {
    fn from(value: SaleNumber) -> Self {
        value.to_string()
    }
}

// =============================================================================
// Day Window
// =============================================================================

/// The half-open interval `[start, end)` covering one local calendar day,
/// expressed in UTC for storage queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Window for `date` in time zone `tz`.
    pub fn for_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DayWindow {
        let next = date.succ_opt().unwrap_or(date);
        DayWindow {
            date,
            start: local_midnight(date, tz),
            end: local_midnight(next, tz),
        }
    }

    /// Window of the local day containing `instant`.
    pub fn containing<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> DayWindow {
        let date = instant.with_timezone(tz).date_naive();
        DayWindow::for_date(date, tz)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// First instant of `date` in `tz`, in UTC.
fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Midnight skipped by a DST jump; the day starts an hour later.
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    }
}
