//! Budget item business logic.
//!
//! Items hang off a category and share its owner and budget type. Creating an item can
//! create its category in the same transaction via [`CategoryRef::New`]. Items are never
//! deleted, only archived, and are ordered within their category by fractional keys.

use crate::{
    core::{
        BudgetType,
        category::{self, NewCategory},
        recurrence::{RecurrenceDescriptor, weekday_name},
        reorder::{OrderColumns, apply_plan},
        sort_order::{self, ReorderPlan, SortKey},
    },
    entities::{BudgetItem, budget_category, budget_item},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Largest accepted amount per occurrence, in cents ($10 billion).
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Which category a new item goes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRef {
    /// A category that already exists
    Existing {
        /// Its id
        id: i64,
    },
    /// A category to create alongside the item
    New {
        /// Name of the new category
        name: String,
        /// Optional emoji for the new category
        emoji: Option<String>,
    },
}

/// Input for creating a budget item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudgetItem {
    /// Target category
    pub category: CategoryRef,
    /// Must match the category's type
    pub budget_type: BudgetType,
    /// Display name
    pub name: String,
    /// Amount per occurrence in cents
    pub amount: i64,
    /// How often the amount recurs
    pub recurrence: RecurrenceDescriptor,
    /// Explicit position; defaults to after the last sibling
    pub sort_order: Option<f64>,
}

/// The columns of an item that may be changed after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    /// New display name
    pub name: Option<String>,
    /// New amount per occurrence in cents
    pub amount: Option<i64>,
    /// New recurrence, validated before it is stored
    pub recurrence: Option<RecurrenceDescriptor>,
    /// New position; prefer [`reorder_item`] for drag-and-drop moves
    pub sort_order: Option<f64>,
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Item name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

const fn validate_amount(amount: i64) -> Result<i64> {
    if amount < 0 || amount > MAX_AMOUNT_CENTS {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}

/// Copies a descriptor into the flattened recurrence columns.
fn set_recurrence(active: &mut budget_item::ActiveModel, recurrence: &RecurrenceDescriptor) {
    let day = |d: Option<u32>| d.and_then(|d| i32::try_from(d).ok());

    active.frequency = Set(recurrence.frequency.map(|f| f.as_str().to_string()));
    active.day_of_week = Set(recurrence.day_of_week.map(|d| weekday_name(d).to_string()));
    active.day_of_month = Set(day(recurrence.day_of_month));
    active.day_of_month_is_last = Set(recurrence.day_of_month_is_last);
    active.second_day_of_month = Set(day(recurrence.second_day_of_month));
    active.second_day_of_month_is_last = Set(recurrence.second_day_of_month_is_last);
    active.start_date = Set(recurrence.start_date);
}

/// Finds an item owned by `owner_id`, archived or not.
pub async fn get_item<C>(db: &C, owner_id: &str, item_id: i64) -> Result<Option<budget_item::Model>>
where
    C: ConnectionTrait,
{
    BudgetItem::find_by_id(item_id)
        .filter(budget_item::Column::OwnerId.eq(owner_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_item<C>(db: &C, owner_id: &str, item_id: i64) -> Result<budget_item::Model>
where
    C: ConnectionTrait,
{
    get_item(db, owner_id, item_id)
        .await?
        .ok_or(Error::ItemNotFound { id: item_id })
}

/// Lists the active items of one category ordered by `(sort_order, id)`.
pub async fn list_items<C>(
    db: &C,
    owner_id: &str,
    category_id: i64,
) -> Result<Vec<budget_item::Model>>
where
    C: ConnectionTrait,
{
    BudgetItem::find()
        .filter(budget_item::Column::OwnerId.eq(owner_id))
        .filter(budget_item::Column::CategoryId.eq(category_id))
        .filter(budget_item::Column::IsArchived.eq(false))
        .order_by_asc(budget_item::Column::SortOrder)
        .order_by_asc(budget_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists every active item of an owner, across all categories.
pub async fn list_owner_items<C>(db: &C, owner_id: &str) -> Result<Vec<budget_item::Model>>
where
    C: ConnectionTrait,
{
    BudgetItem::find()
        .filter(budget_item::Column::OwnerId.eq(owner_id))
        .filter(budget_item::Column::IsArchived.eq(false))
        .order_by_asc(budget_item::Column::SortOrder)
        .order_by_asc(budget_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn next_sort_order<C>(db: &C, owner_id: &str, category_id: i64) -> Result<f64>
where
    C: ConnectionTrait,
{
    let last = BudgetItem::find()
        .filter(budget_item::Column::OwnerId.eq(owner_id))
        .filter(budget_item::Column::CategoryId.eq(category_id))
        .order_by_desc(budget_item::Column::SortOrder)
        .one(db)
        .await?;
    Ok(last.map_or(0.0, |i| i.sort_order + 1.0))
}

/// Resolves a [`CategoryRef`] to an active category of the item's type.
async fn resolve_category<C>(
    db: &C,
    owner_id: &str,
    category: CategoryRef,
    budget_type: BudgetType,
) -> Result<budget_category::Model>
where
    C: ConnectionTrait,
{
    match category {
        CategoryRef::Existing { id } => {
            let category = category::require_category(db, owner_id, id).await?;
            if category.is_archived {
                return Err(Error::CategoryNotFound { id });
            }
            if category.budget_type != budget_type.as_str() {
                return Err(Error::validation(format!(
                    "category {id} holds {} items, not {budget_type}",
                    category.budget_type
                )));
            }
            Ok(category)
        }
        CategoryRef::New { name, emoji } => {
            let new = NewCategory {
                emoji,
                ..NewCategory::new(budget_type, name)
            };
            category::create_category(db, owner_id, new).await
        }
    }
}

/// Validates input that does not need the database.
pub(crate) fn validate_new_item(new: &NewBudgetItem) -> Result<()> {
    validate_name(&new.name)?;
    validate_amount(new.amount)?;
    new.recurrence.validate()
}

/// Inserts an item on an existing connection or transaction.
///
/// Callers that pass [`CategoryRef::New`] should hold a transaction so the category
/// and the item are created together.
pub(crate) async fn insert_item<C>(
    db: &C,
    owner_id: &str,
    new: NewBudgetItem,
) -> Result<budget_item::Model>
where
    C: ConnectionTrait,
{
    validate_new_item(&new)?;
    let name = validate_name(&new.name)?;

    let category = resolve_category(db, owner_id, new.category, new.budget_type).await?;
    let sort_order = match new.sort_order {
        Some(order) => order,
        None => next_sort_order(db, owner_id, category.id).await?,
    };

    let now = Utc::now();
    let mut item = budget_item::ActiveModel {
        category_id: Set(category.id),
        owner_id: Set(owner_id.to_string()),
        budget_type: Set(category.budget_type),
        name: Set(name),
        amount: Set(new.amount),
        sort_order: Set(sort_order),
        is_archived: Set(false),
        archived_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    set_recurrence(&mut item, &new.recurrence);

    let result = item.insert(db).await?;
    debug!(
        item_id = result.id,
        category_id = result.category_id,
        sort_order,
        "Created budget item"
    );
    Ok(result)
}

/// Creates an item, first creating its category when [`CategoryRef::New`] is given.
///
/// Validation runs before any query; both inserts share one transaction.
pub async fn create_item(
    db: &DatabaseConnection,
    owner_id: &str,
    new: NewBudgetItem,
) -> Result<budget_item::Model> {
    const OPERATION: &str = "create_item";

    validate_new_item(&new)?;

    let txn = db.begin().await?;
    let item = insert_item(&txn, owner_id, new)
        .await
        .map_err(|e| e.in_transaction(OPERATION))?;
    txn.commit().await.map_err(|source| Error::Transaction {
        operation: OPERATION,
        source,
    })?;
    Ok(item)
}

/// Applies the fields set in `update` and leaves the rest untouched.
pub async fn update_item(
    db: &DatabaseConnection,
    owner_id: &str,
    item_id: i64,
    update: ItemUpdate,
) -> Result<budget_item::Model> {
    let name = update.name.as_deref().map(validate_name).transpose()?;
    let amount = update.amount.map(validate_amount).transpose()?;
    if let Some(recurrence) = &update.recurrence {
        recurrence.validate()?;
    }

    let item = require_item(db, owner_id, item_id).await?;
    let mut active: budget_item::ActiveModel = item.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(amount) = amount {
        active.amount = Set(amount);
    }
    if let Some(recurrence) = &update.recurrence {
        set_recurrence(&mut active, recurrence);
    }
    if let Some(sort_order) = update.sort_order {
        active.sort_order = Set(sort_order);
    }
    active.updated_at = Set(Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Archives a single item. Archiving twice keeps the first timestamp.
pub async fn archive_item(
    db: &DatabaseConnection,
    owner_id: &str,
    item_id: i64,
) -> Result<budget_item::Model> {
    let item = require_item(db, owner_id, item_id).await?;
    if item.is_archived {
        return Ok(item);
    }

    let now = Utc::now();
    let mut active: budget_item::ActiveModel = item.into();
    active.is_archived = Set(true);
    active.archived_at = Set(Some(now));
    active.updated_at = Set(now);
    let item = active.update(db).await?;

    info!(item_id, "Archived budget item");
    Ok(item)
}

/// Restores an archived item and clears its `archived_at`.
pub async fn unarchive_item(
    db: &DatabaseConnection,
    owner_id: &str,
    item_id: i64,
) -> Result<budget_item::Model> {
    let item = require_item(db, owner_id, item_id).await?;
    if !item.is_archived {
        return Ok(item);
    }

    let mut active: budget_item::ActiveModel = item.into();
    active.is_archived = Set(false);
    active.archived_at = Set(None);
    active.updated_at = Set(Utc::now());
    let item = active.update(db).await?;

    info!(item_id, "Unarchived budget item");
    Ok(item)
}

async fn check_neighbour<C>(
    db: &C,
    moved: &budget_item::Model,
    neighbour_id: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let Some(id) = neighbour_id else {
        return Ok(());
    };
    match BudgetItem::find_by_id(id).one(db).await? {
        Some(n) if n.owner_id != moved.owner_id || n.category_id != moved.category_id => {
            Err(Error::OutOfScope { id })
        }
        _ => Ok(()),
    }
}

/// Moves an item between two neighbours within its category.
///
/// Same contract as [`category::reorder_category`], with the category as sibling scope.
#[instrument(skip(db))]
pub async fn reorder_item(
    db: &DatabaseConnection,
    owner_id: &str,
    item_id: i64,
    previous_id: Option<i64>,
    next_id: Option<i64>,
) -> Result<ReorderPlan> {
    const OPERATION: &str = "reorder_item";

    let txn = db.begin().await?;
    let moved = require_item(&txn, owner_id, item_id).await?;
    if moved.is_archived {
        return Err(Error::ItemNotFound { id: item_id });
    }
    check_neighbour(&txn, &moved, previous_id).await?;
    check_neighbour(&txn, &moved, next_id).await?;

    let siblings: Vec<SortKey> = list_items(&txn, owner_id, moved.category_id)
        .await?
        .iter()
        .map(|i| SortKey::new(i.id, i.sort_order))
        .collect();

    let plan = sort_order::reorder(item_id, previous_id, next_id, &siblings);
    let columns = OrderColumns::<BudgetItem> {
        id: budget_item::Column::Id,
        sort_order: budget_item::Column::SortOrder,
        updated_at: budget_item::Column::UpdatedAt,
    };
    apply_plan(&txn, &columns, &plan)
        .await
        .map_err(|e| e.in_transaction(OPERATION))?;

    txn.commit().await.map_err(|source| Error::Transaction {
        operation: OPERATION,
        source,
    })?;

    info!(
        item_id,
        rebalanced = matches!(plan, ReorderPlan::FullRebalance { .. }),
        rows = plan.len(),
        "Reordered budget item"
    );
    Ok(plan)
}
