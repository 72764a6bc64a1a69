//! Budget types - the three buckets a category can belong to.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether money comes in, goes out, or is set aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetType {
    /// Paychecks, side income
    Income,
    /// Bills and spending
    Expense,
    /// Money set aside
    Savings,
}

impl BudgetType {
    /// All types in display order.
    pub const ALL: [Self; 3] = [Self::Income, Self::Expense, Self::Savings];

    /// Stored representation of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Savings => "savings",
        }
    }

    /// Heading used in summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expenses",
            Self::Savings => "Savings",
        }
    }
}

impl fmt::Display for BudgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" | "expenses" => Ok(Self::Expense),
            "savings" => Ok(Self::Savings),
            other => Err(Error::validation(format!("unknown budget type '{other}'"))),
        }
    }
}
