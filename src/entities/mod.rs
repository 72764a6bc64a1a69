//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod budget_category;
pub mod budget_item;

pub use budget_category::{
    Column as BudgetCategoryColumn, Entity as BudgetCategory, Model as BudgetCategoryModel,
};
pub use budget_item::{Column as BudgetItemColumn, Entity as BudgetItem, Model as BudgetItemModel};
