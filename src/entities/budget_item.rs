//! Budget item entity - A recurring amount attached to a category.
//!
//! The recurrence is stored flattened across several columns; use
//! [`Model::recurrence`] to read it back as a typed descriptor.
//! `amount` is kept in integer cents.

use crate::core::recurrence::{Frequency, RecurrenceDescriptor, parse_weekday};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Category this item belongs to
    pub category_id: i64,
    /// Owner of the parent category, duplicated for scoped queries
    pub owner_id: String,
    /// `"income"`, `"expense"` or `"savings"`, always equal to the category's type
    pub budget_type: String,
    /// Display name (e.g., "Rent", "Paycheck")
    pub name: String,
    /// Amount per occurrence in cents
    pub amount: i64,
    /// `"weekly"`, `"bi-weekly"`, `"semi-monthly"` or `"monthly"`
    pub frequency: Option<String>,
    /// Lowercase weekday name for weekly and bi-weekly items
    pub day_of_week: Option<String>,
    /// First payment day (1-31) for monthly and semi-monthly items
    pub day_of_month: Option<i32>,
    /// First payment day is the last day of the month
    pub day_of_month_is_last: bool,
    /// Second payment day (1-31), semi-monthly only
    pub second_day_of_month: Option<i32>,
    /// Second payment day is the last day of the month
    pub second_day_of_month_is_last: bool,
    /// Date the recurrence becomes active
    pub start_date: Date,
    /// Position among siblings in the same category
    pub sort_order: f64,
    /// Archive flag - archived items are excluded from totals
    pub is_archived: bool,
    /// When the item was archived, cleared on restore
    pub archived_at: Option<DateTimeUtc>,
    /// When the item was created
    pub created_at: DateTimeUtc,
    /// When the item was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Rebuilds the typed recurrence descriptor from the stored columns.
    ///
    /// Unknown frequency or weekday strings become `None`, which the normalizer
    /// treats with its legacy fallbacks instead of failing.
    #[must_use]
    pub fn recurrence(&self) -> RecurrenceDescriptor {
        let frequency = self.frequency.as_deref().and_then(|raw| {
            let parsed = raw.parse::<Frequency>().ok();
            if parsed.is_none() {
                tracing::warn!(item_id = self.id, raw, "Unknown stored frequency");
            }
            parsed
        });

        RecurrenceDescriptor {
            frequency,
            day_of_week: self.day_of_week.as_deref().and_then(parse_weekday),
            day_of_month: self.day_of_month.and_then(|d| u32::try_from(d).ok()),
            day_of_month_is_last: self.day_of_month_is_last,
            second_day_of_month: self.second_day_of_month.and_then(|d| u32::try_from(d).ok()),
            second_day_of_month_is_last: self.second_day_of_month_is_last,
            start_date: self.start_date,
        }
    }
}

/// Defines relationships between `BudgetItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one category
    #[sea_orm(
        belongs_to = "super::budget_category::Entity",
        from = "Column::CategoryId",
        to = "super::budget_category::Column::Id"
    )]
    BudgetCategory,
}

impl Related<super::budget_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
