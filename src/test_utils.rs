//! Shared test utilities for the budget planner.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test categories and items with sensible defaults.

use crate::{
    core::{
        BudgetType, RecurrenceDescriptor,
        category::{self, NewCategory},
        item::{self, CategoryRef, NewBudgetItem},
    },
    entities,
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::DatabaseConnection;

/// Owner used by most tests.
pub const OWNER: &str = "owner-1";

/// A second owner for isolation tests.
pub const OTHER_OWNER: &str = "owner-2";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Sends tracing output to the test harness; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Monthly on the 1st, starting 2025-01-01.
pub fn monthly_on_first() -> RecurrenceDescriptor {
    RecurrenceDescriptor::monthly(1, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default())
}

/// Creates a test category for [`OWNER`] with the default emoji and position.
pub async fn create_test_category(
    db: &DatabaseConnection,
    budget_type: BudgetType,
    name: &str,
) -> Result<entities::budget_category::Model> {
    category::create_category(db, OWNER, NewCategory::new(budget_type, name)).await
}

/// Creates a test item for [`OWNER`] with sensible defaults.
///
/// # Defaults
/// * recurrence: monthly on the 1st, starting 2025-01-01
/// * `sort_order`: after the last sibling
pub async fn create_test_item(
    db: &DatabaseConnection,
    category_id: i64,
    name: &str,
    amount: i64,
) -> Result<entities::budget_item::Model> {
    create_custom_item(db, category_id, name, amount, monthly_on_first()).await
}

/// Creates a test item with a custom recurrence.
/// The item takes the budget type of its category.
pub async fn create_custom_item(
    db: &DatabaseConnection,
    category_id: i64,
    name: &str,
    amount: i64,
    recurrence: RecurrenceDescriptor,
) -> Result<entities::budget_item::Model> {
    let category = category::get_category(db, OWNER, category_id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    item::create_item(
        db,
        OWNER,
        NewBudgetItem {
            category: CategoryRef::Existing { id: category_id },
            budget_type: category.budget_type.parse()?,
            name: name.to_string(),
            amount,
            recurrence,
            sort_order: None,
        },
    )
    .await
}

/// An active expense category owned by [`OWNER`], built in memory for `MockDatabase` rows.
pub fn category_model(id: i64, sort_order: f64) -> entities::budget_category::Model {
    let now = Utc::now();
    entities::budget_category::Model {
        id,
        owner_id: OWNER.to_string(),
        budget_type: BudgetType::Expense.as_str().to_string(),
        name: format!("Category {id}"),
        emoji: category::DEFAULT_EMOJI.to_string(),
        sort_order,
        is_archived: false,
        archived_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// An active monthly item owned by [`OWNER`], built in memory for `MockDatabase` rows.
pub fn item_model(id: i64, category_id: i64, sort_order: f64) -> entities::budget_item::Model {
    let now = Utc::now();
    let recurrence = monthly_on_first();
    entities::budget_item::Model {
        id,
        category_id,
        owner_id: OWNER.to_string(),
        budget_type: BudgetType::Expense.as_str().to_string(),
        name: format!("Item {id}"),
        amount: 1_000,
        frequency: recurrence.frequency.map(|f| f.as_str().to_string()),
        day_of_week: None,
        day_of_month: Some(1),
        day_of_month_is_last: false,
        second_day_of_month: None,
        second_day_of_month_is_last: false,
        start_date: recurrence.start_date,
        sort_order,
        is_archived: false,
        archived_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// True when the mock connection logged a `COMMIT`.
pub fn committed(db: DatabaseConnection) -> bool {
    db.into_transaction_log()
        .iter()
        .flat_map(sea_orm::Transaction::statements)
        .any(|statement| statement.sql == "COMMIT")
}
