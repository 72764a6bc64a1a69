//! Recurrence normalization - turns a recurring budget item into a monthly figure.
//!
//! A [`RecurrenceDescriptor`] says how often an item recurs; [`occurrences_in_month`]
//! counts how many times it lands inside a given [`ReferenceMonth`], and
//! [`monthly_equivalent`] multiplies that count by the per-occurrence amount in cents.
//! Everything here is pure and deterministic.

use crate::errors::{Error, Result};
use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Latest first payment day allowed when the second payment day is "last".
pub const MAX_FIRST_DAY_BEFORE_LAST: u32 = 27;

/// How often a budget item recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    /// Every week on a fixed weekday
    Weekly,
    /// Every other week on a fixed weekday
    BiWeekly,
    /// Twice a month on two fixed days
    SemiMonthly,
    /// Once a month
    Monthly,
}

impl Frequency {
    /// Stored representation of the frequency.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::BiWeekly => "bi-weekly",
            Self::SemiMonthly => "semi-monthly",
            Self::Monthly => "monthly",
        }
    }

    const fn uses_weekday(self) -> bool {
        matches!(self, Self::Weekly | Self::BiWeekly)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "bi-weekly" | "biweekly" => Ok(Self::BiWeekly),
            "semi-monthly" | "semimonthly" => Ok(Self::SemiMonthly),
            "monthly" => Ok(Self::Monthly),
            other => Err(Error::recurrence(format!("unknown frequency '{other}'"))),
        }
    }
}

/// Lowercase full weekday name used for storage (e.g. `"monday"`).
#[must_use]
pub const fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Parses a stored weekday name; accepts full or abbreviated names in any case.
#[must_use]
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    raw.trim().parse::<Weekday>().ok()
}

/// A calendar month that totals are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReferenceMonth {
    first: NaiveDate,
}

impl ReferenceMonth {
    /// Builds a month from a year and a 1-based month number.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| Self { first })
            .ok_or_else(|| Error::validation(format!("invalid month {year}-{month:02}")))
    }

    /// The month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    /// The current month in local time.
    #[must_use]
    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    /// Calendar year
    #[must_use]
    pub fn year(self) -> i32 {
        self.first.year()
    }

    /// Month number, 1-12
    #[must_use]
    pub fn month(self) -> u32 {
        self.first.month()
    }

    /// Date of the 1st of the month.
    #[must_use]
    pub const fn first_day(self) -> NaiveDate {
        self.first
    }

    /// Number of the last calendar day (28-31).
    #[must_use]
    pub fn last_day(self) -> u32 {
        (29..=31)
            .rev()
            .find(|&day| NaiveDate::from_ymd_opt(self.year(), self.month(), day).is_some())
            .unwrap_or(28)
    }
}

impl fmt::Display for ReferenceMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for ReferenceMonth {
    type Err = Error;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::validation(format!("expected YYYY-MM, got '{s}'"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

/// Describes how often and when a budget item recurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceDescriptor {
    /// `None` for legacy rows without a recognised frequency
    #[serde(default)]
    pub frequency: Option<Frequency>,
    /// Weekday for weekly and bi-weekly items
    #[serde(default)]
    pub day_of_week: Option<Weekday>,
    /// First payment day (1-31)
    #[serde(default)]
    pub day_of_month: Option<u32>,
    /// First payment day is the last day of the month
    #[serde(default)]
    pub day_of_month_is_last: bool,
    /// Second payment day (1-31), semi-monthly only
    #[serde(default)]
    pub second_day_of_month: Option<u32>,
    /// Second payment day is the last day of the month
    #[serde(default)]
    pub second_day_of_month_is_last: bool,
    /// Date the recurrence becomes active
    pub start_date: NaiveDate,
}

impl RecurrenceDescriptor {
    const fn empty(frequency: Frequency, start_date: NaiveDate) -> Self {
        Self {
            frequency: Some(frequency),
            day_of_week: None,
            day_of_month: None,
            day_of_month_is_last: false,
            second_day_of_month: None,
            second_day_of_month_is_last: false,
            start_date,
        }
    }

    /// Every week on `day`.
    #[must_use]
    pub const fn weekly(day: Weekday, start_date: NaiveDate) -> Self {
        let mut r = Self::empty(Frequency::Weekly, start_date);
        r.day_of_week = Some(day);
        r
    }

    /// Every other week on `day`.
    #[must_use]
    pub const fn bi_weekly(day: Weekday, start_date: NaiveDate) -> Self {
        let mut r = Self::empty(Frequency::BiWeekly, start_date);
        r.day_of_week = Some(day);
        r
    }

    /// Once a month on `day`.
    #[must_use]
    pub const fn monthly(day: u32, start_date: NaiveDate) -> Self {
        let mut r = Self::empty(Frequency::Monthly, start_date);
        r.day_of_month = Some(day);
        r
    }

    /// Once a month on its last day.
    #[must_use]
    pub const fn monthly_on_last_day(start_date: NaiveDate) -> Self {
        let mut r = Self::empty(Frequency::Monthly, start_date);
        r.day_of_month_is_last = true;
        r
    }

    /// Twice a month on two fixed days.
    #[must_use]
    pub const fn semi_monthly(first: u32, second: u32, start_date: NaiveDate) -> Self {
        let mut r = Self::empty(Frequency::SemiMonthly, start_date);
        r.day_of_month = Some(first);
        r.second_day_of_month = Some(second);
        r
    }

    /// Twice a month on `first` and on the last day.
    #[must_use]
    pub const fn semi_monthly_with_last(first: u32, start_date: NaiveDate) -> Self {
        let mut r = Self::empty(Frequency::SemiMonthly, start_date);
        r.day_of_month = Some(first);
        r.second_day_of_month_is_last = true;
        r
    }

    /// Checks the descriptor before it is persisted. Nothing is auto-corrected.
    pub fn validate(&self) -> Result<()> {
        let frequency = self
            .frequency
            .ok_or_else(|| Error::recurrence("frequency is required"))?;

        if frequency.uses_weekday() {
            if self.day_of_week.is_none() {
                return Err(Error::recurrence(format!(
                    "{frequency} recurrence needs a day of week"
                )));
            }
            return Ok(());
        }

        if self.day_of_week.is_some() {
            return Err(Error::recurrence(format!(
                "{frequency} recurrence must not set a day of week"
            )));
        }

        let first = check_slot("first", self.day_of_month, self.day_of_month_is_last)?;
        if frequency == Frequency::Monthly {
            return Ok(());
        }

        let second = check_slot(
            "second",
            self.second_day_of_month,
            self.second_day_of_month_is_last,
        )?;
        match (first, second) {
            (PaymentDay::Last, _) => Err(Error::recurrence(
                "first payment day cannot be the last day of the month",
            )),
            (PaymentDay::Day(first), PaymentDay::Last) if first > MAX_FIRST_DAY_BEFORE_LAST => {
                Err(Error::recurrence(format!(
                    "first payment day must be {MAX_FIRST_DAY_BEFORE_LAST} or earlier when the second is the last day"
                )))
            }
            (PaymentDay::Day(first), PaymentDay::Day(second)) if second <= first => {
                Err(Error::recurrence(
                    "second payment day must come after the first",
                ))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PaymentDay {
    Day(u32),
    Last,
}

fn check_slot(slot: &str, day: Option<u32>, is_last: bool) -> Result<PaymentDay> {
    match (day, is_last) {
        (Some(_), true) => Err(Error::recurrence(format!(
            "{slot} payment day cannot be both a fixed day and the last day"
        ))),
        (None, false) => Err(Error::recurrence(format!("{slot} payment day is required"))),
        (None, true) => Ok(PaymentDay::Last),
        (Some(d), false) if (1..=31).contains(&d) => Ok(PaymentDay::Day(d)),
        (Some(d), false) => Err(Error::recurrence(format!(
            "{slot} payment day {d} is outside 1-31"
        ))),
    }
}

/// Counts how many times `recurrence` occurs within `month`.
///
/// Monthly items always count once, even when the configured day does not exist
/// in `month`; semi-monthly days past the end of the month are not counted.
#[must_use]
pub fn occurrences_in_month(recurrence: &RecurrenceDescriptor, month: ReferenceMonth) -> u32 {
    let last_day = month.last_day();
    match recurrence.frequency {
        Some(Frequency::Weekly) => weekday_occurrences(recurrence.day_of_week, month, 7),
        Some(Frequency::BiWeekly) => weekday_occurrences(recurrence.day_of_week, month, 14),
        Some(Frequency::SemiMonthly) => {
            let first = resolve_day(
                recurrence.day_of_month,
                recurrence.day_of_month_is_last,
                last_day,
            );
            let second = resolve_day(
                recurrence.second_day_of_month,
                recurrence.second_day_of_month_is_last,
                last_day,
            );
            let counts = |day: Option<u32>| u32::from(day.is_some_and(|d| d <= last_day));
            counts(first) + counts(second)
        }
        Some(Frequency::Monthly) => 1,
        None => {
            warn!(
                start_date = %recurrence.start_date,
                "Recurrence without a frequency, counting it as monthly"
            );
            1
        }
    }
}

/// Amount in cents that `recurrence` contributes to `month`, saturating at the `i64` bounds.
#[must_use]
pub fn monthly_equivalent(
    amount_cents: i64,
    recurrence: &RecurrenceDescriptor,
    month: ReferenceMonth,
) -> i64 {
    amount_cents.saturating_mul(i64::from(occurrences_in_month(recurrence, month)))
}

const fn resolve_day(day: Option<u32>, is_last: bool, last_day: u32) -> Option<u32> {
    if is_last { Some(last_day) } else { day }
}

fn weekday_occurrences(day_of_week: Option<Weekday>, month: ReferenceMonth, step: u32) -> u32 {
    let first_weekday = month.first_day().weekday();
    // Legacy rows without a weekday recur on the weekday of the 1st.
    let target = day_of_week.unwrap_or(first_weekday);
    let offset =
        (7 + target.num_days_from_monday() - first_weekday.num_days_from_monday()) % 7;

    let last_day = month.last_day();
    let mut day = 1 + offset;
    let mut count = 0;
    while day <= last_day {
        count += 1;
        day += step;
    }
    count
}
