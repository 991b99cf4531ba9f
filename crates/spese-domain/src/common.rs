//! Shared traits, enums, and calendar arithmetic for ledger primitives.

use std::fmt;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Exposes a stable identifier for entities stored in the document.
pub trait Identifiable {
    fn id(&self) -> &str;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Supplies a common contract for retrieving numeric amounts.
pub trait Amounted {
    fn amount(&self) -> f64;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Generates a fresh identifier for new accounts, transactions and templates.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Direction of a money movement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "expense" | "uscita" => Ok(TransactionKind::Expense),
            "income" | "entrata" => Ok(TransactionKind::Income),
            other => Err(format!("unknown transaction type `{other}`")),
        }
    }
}

/// Enumerates the cadences a recurring template can follow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Frequency {
    /// Moves `from` forward by `interval` units of this frequency.
    ///
    /// Month and year steps keep the day-of-month and overflow into the next
    /// month when the target month is shorter (31 Jan + 1 month = 3 Mar).
    /// Returns `None` when the result leaves chrono's representable range.
    pub fn advance(self, from: DateTime<Utc>, interval: u32) -> Option<DateTime<Utc>> {
        let every = i64::from(interval);
        match self {
            Frequency::Daily => from.checked_add_signed(Duration::days(every)),
            Frequency::Weekly => from.checked_add_signed(Duration::days(7 * every)),
            Frequency::Monthly => add_months_overflowing(from, every),
            Frequency::Yearly => add_months_overflowing(from, 12 * every),
        }
    }

    pub fn label(self, interval: u32) -> String {
        match (interval, self) {
            (1, Frequency::Daily) => "Daily".into(),
            (1, Frequency::Weekly) => "Weekly".into(),
            (1, Frequency::Monthly) => "Monthly".into(),
            (1, Frequency::Yearly) => "Yearly".into(),
            (n, freq) => format!("Every {} {}", n, freq.unit_plural()),
        }
    }

    fn unit_plural(self) -> &'static str {
        match self {
            Frequency::Daily => "days",
            Frequency::Weekly => "weeks",
            Frequency::Monthly => "months",
            Frequency::Yearly => "years",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(format!("unknown frequency `{other}`")),
        }
    }
}

fn add_months_overflowing(from: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let date = from.date_naive();
    let month_index = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let year = i32::try_from(month_index.div_euclid(12)).ok()?;
    let month = u32::try_from(month_index.rem_euclid(12)).ok()? + 1;
    let shifted = NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_days(Days::new(u64::from(date.day() - 1)))?;
    Some(Utc.from_utc_datetime(&shifted.and_time(from.time())))
}

/// Returns `(year, month)` of an instant, month being 1-based.
pub fn year_month(timestamp: DateTime<Utc>) -> (i32, u32) {
    (timestamp.year(), timestamp.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
    }

    #[test]
    fn monthly_advance_overflows_short_months() {
        let next = Frequency::Monthly.advance(at(2023, 1, 31), 1).unwrap();
        assert_eq!(next, at(2023, 3, 3));
    }

    #[test]
    fn yearly_advance_from_leap_day_lands_on_first_of_march() {
        let next = Frequency::Yearly.advance(at(2024, 2, 29), 1).unwrap();
        assert_eq!(next, at(2025, 3, 1));
    }

    #[test]
    fn monthly_advance_crosses_year_boundary() {
        let next = Frequency::Monthly.advance(at(2024, 11, 15), 3).unwrap();
        assert_eq!(next, at(2025, 2, 15));
    }

    #[test]
    fn weekly_and_daily_advance_by_whole_days() {
        assert_eq!(
            Frequency::Weekly.advance(at(2024, 1, 1), 2).unwrap(),
            at(2024, 1, 15)
        );
        assert_eq!(
            Frequency::Daily.advance(at(2024, 2, 28), 1).unwrap(),
            at(2024, 2, 29)
        );
    }

    #[test]
    fn frequency_serializes_lowercase() {
        let json = serde_json::to_string(&Frequency::Weekly).unwrap();
        assert_eq!(json, "\"weekly\"");
        assert_eq!("Yearly".parse::<Frequency>().unwrap(), Frequency::Yearly);
    }

    #[test]
    fn transaction_kind_parses_english_and_italian() {
        assert_eq!("Income".parse::<TransactionKind>(), Ok(TransactionKind::Income));
        assert_eq!("uscita".parse::<TransactionKind>(), Ok(TransactionKind::Expense));
        assert!("transfer".parse::<TransactionKind>().is_err());
    }
}
