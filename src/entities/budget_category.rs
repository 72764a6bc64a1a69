//! Budget category entity - Groups budget items under an income, expense or savings type.
//!
//! Categories are ordered within `(owner_id, budget_type)` by a fractional `sort_order`.
//! They are never physically deleted; archiving hides them and their items.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget category database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque, already-verified identity of the owner
    pub owner_id: String,
    /// `"income"`, `"expense"` or `"savings"`
    pub budget_type: String,
    /// Display name (e.g., "Housing", "Salary")
    pub name: String,
    /// Emoji shown next to the name
    pub emoji: String,
    /// Position among siblings of the same owner and type
    pub sort_order: f64,
    /// Archive flag - archived categories are hidden but preserved
    pub is_archived: bool,
    /// When the category was archived, cleared on restore
    pub archived_at: Option<DateTimeUtc>,
    /// When the category was created
    pub created_at: DateTimeUtc,
    /// When the category was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `BudgetCategory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category has many budget items
    #[sea_orm(has_many = "super::budget_item::Entity")]
    BudgetItems,
}

impl Related<super::budget_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
