//! Budget category business logic.
//!
//! Every operation is scoped to an owner id supplied by the identity provider;
//! categories belonging to someone else behave as if they did not exist.
//! Categories are archived rather than deleted, and archiving cascades to items.

use crate::{
    core::{
        BudgetType,
        reorder::{OrderColumns, apply_plan},
        sort_order::{self, ReorderPlan, SortKey},
    },
    entities::{BudgetCategory, BudgetItem, budget_category, budget_item},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

/// Emoji used when a category is created without one.
pub const DEFAULT_EMOJI: &str = "💰";

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// Income, expense or savings
    pub budget_type: BudgetType,
    /// Display name, trimmed before storing
    pub name: String,
    /// Falls back to [`DEFAULT_EMOJI`]
    pub emoji: Option<String>,
    /// Explicit position; defaults to after the last sibling
    pub sort_order: Option<f64>,
}

impl NewCategory {
    /// A category with default emoji and position.
    #[must_use]
    pub fn new(budget_type: BudgetType, name: impl Into<String>) -> Self {
        Self {
            budget_type,
            name: name.into(),
            emoji: None,
            sort_order: None,
        }
    }
}

/// The columns of a category that may be changed after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryUpdate {
    /// New display name
    pub name: Option<String>,
    /// New emoji
    pub emoji: Option<String>,
    /// New position; prefer [`reorder_category`] for drag-and-drop moves
    pub sort_order: Option<f64>,
}

/// Outcome of archiving a category.
#[derive(Debug, Clone)]
pub struct ArchivedCategory {
    /// The category after archiving
    pub category: budget_category::Model,
    /// How many previously active items were archived with it
    pub items_archived: u64,
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Category name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// Finds a category owned by `owner_id`, archived or not.
pub async fn get_category<C>(
    db: &C,
    owner_id: &str,
    category_id: i64,
) -> Result<Option<budget_category::Model>>
where
    C: ConnectionTrait,
{
    BudgetCategory::find_by_id(category_id)
        .filter(budget_category::Column::OwnerId.eq(owner_id))
        .one(db)
        .await
        .map_err(Into::into)
}

pub(crate) async fn require_category<C>(
    db: &C,
    owner_id: &str,
    category_id: i64,
) -> Result<budget_category::Model>
where
    C: ConnectionTrait,
{
    get_category(db, owner_id, category_id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })
}

/// Lists active categories ordered by `(sort_order, id)`, optionally for one type.
pub async fn list_categories<C>(
    db: &C,
    owner_id: &str,
    budget_type: Option<BudgetType>,
) -> Result<Vec<budget_category::Model>>
where
    C: ConnectionTrait,
{
    let mut query = BudgetCategory::find()
        .filter(budget_category::Column::OwnerId.eq(owner_id))
        .filter(budget_category::Column::IsArchived.eq(false));
    if let Some(budget_type) = budget_type {
        query = query.filter(budget_category::Column::BudgetType.eq(budget_type.as_str()));
    }

    query
        .order_by_asc(budget_category::Column::SortOrder)
        .order_by_asc(budget_category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Key for a new category: one past the highest sibling key, or 0 for the first.
async fn next_sort_order<C>(db: &C, owner_id: &str, budget_type: BudgetType) -> Result<f64>
where
    C: ConnectionTrait,
{
    let last = BudgetCategory::find()
        .filter(budget_category::Column::OwnerId.eq(owner_id))
        .filter(budget_category::Column::BudgetType.eq(budget_type.as_str()))
        .order_by_desc(budget_category::Column::SortOrder)
        .one(db)
        .await?;
    Ok(last.map_or(0.0, |c| c.sort_order + 1.0))
}

/// Creates a category after validating its name.
pub async fn create_category<C>(
    db: &C,
    owner_id: &str,
    new: NewCategory,
) -> Result<budget_category::Model>
where
    C: ConnectionTrait,
{
    let name = validate_name(&new.name)?;
    let sort_order = match new.sort_order {
        Some(order) => order,
        None => next_sort_order(db, owner_id, new.budget_type).await?,
    };
    let emoji = new
        .emoji
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EMOJI.to_string());

    let now = Utc::now();
    let category = budget_category::ActiveModel {
        owner_id: Set(owner_id.to_string()),
        budget_type: Set(new.budget_type.as_str().to_string()),
        name: Set(name),
        emoji: Set(emoji),
        sort_order: Set(sort_order),
        is_archived: Set(false),
        archived_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = category.insert(db).await?;
    debug!(category_id = result.id, sort_order, "Created category");
    Ok(result)
}

/// Applies the fields set in `update` and leaves the rest untouched.
pub async fn update_category(
    db: &DatabaseConnection,
    owner_id: &str,
    category_id: i64,
    update: CategoryUpdate,
) -> Result<budget_category::Model> {
    let name = update.name.as_deref().map(validate_name).transpose()?;
    let category = require_category(db, owner_id, category_id).await?;

    let mut active: budget_category::ActiveModel = category.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(emoji) = update.emoji {
        active.emoji = Set(emoji);
    }
    if let Some(sort_order) = update.sort_order {
        active.sort_order = Set(sort_order);
    }
    active.updated_at = Set(Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Archives a category and, in the same transaction, all of its active items.
///
/// Items that were already archived keep their original `archived_at`.
#[instrument(skip(db))]
pub async fn archive_category(
    db: &DatabaseConnection,
    owner_id: &str,
    category_id: i64,
) -> Result<ArchivedCategory> {
    const OPERATION: &str = "archive_category";

    let txn = db.begin().await?;
    let category = require_category(&txn, owner_id, category_id).await?;
    if category.is_archived {
        debug!(category_id, "Category already archived");
        return Ok(ArchivedCategory {
            category,
            items_archived: 0,
        });
    }

    let now = Utc::now();
    let archived = async {
        let mut active: budget_category::ActiveModel = category.into();
        active.is_archived = Set(true);
        active.archived_at = Set(Some(now));
        active.updated_at = Set(now);
        let category = active.update(&txn).await?;

        let items = BudgetItem::update_many()
            .col_expr(budget_item::Column::IsArchived, Expr::value(true))
            .col_expr(budget_item::Column::ArchivedAt, Expr::value(Some(now)))
            .col_expr(budget_item::Column::UpdatedAt, Expr::value(now))
            .filter(budget_item::Column::CategoryId.eq(category_id))
            .filter(budget_item::Column::IsArchived.eq(false))
            .exec(&txn)
            .await?;

        Ok::<_, Error>(ArchivedCategory {
            category,
            items_archived: items.rows_affected,
        })
    }
    .await
    .map_err(|e| e.in_transaction(OPERATION))?;

    txn.commit().await.map_err(|source| Error::Transaction {
        operation: OPERATION,
        source,
    })?;

    info!(
        category_id,
        items_archived = archived.items_archived,
        "Archived category"
    );
    Ok(archived)
}

/// Restores an archived category. Its items stay archived.
pub async fn unarchive_category(
    db: &DatabaseConnection,
    owner_id: &str,
    category_id: i64,
) -> Result<budget_category::Model> {
    let category = require_category(db, owner_id, category_id).await?;
    if !category.is_archived {
        return Ok(category);
    }

    let mut active: budget_category::ActiveModel = category.into();
    active.is_archived = Set(false);
    active.archived_at = Set(None);
    active.updated_at = Set(Utc::now());
    let category = active.update(db).await?;

    info!(category_id, "Unarchived category");
    Ok(category)
}

/// Rejects a neighbour that exists but lives outside the moved category's scope.
///
/// Neighbours that do not exist at all are left to the engine as list boundaries.
async fn check_neighbour<C>(
    db: &C,
    moved: &budget_category::Model,
    neighbour_id: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let Some(id) = neighbour_id else {
        return Ok(());
    };
    match BudgetCategory::find_by_id(id).one(db).await? {
        Some(n) if n.owner_id != moved.owner_id || n.budget_type != moved.budget_type => {
            Err(Error::OutOfScope { id })
        }
        _ => Ok(()),
    }
}

/// Moves a category between two neighbours within its `(owner, type)` list.
///
/// Scope checks run before anything is written. The resulting plan, either a single
/// key update or a full rebalance, is applied in one transaction and returned so the
/// caller can refresh its view of the list.
#[instrument(skip(db))]
pub async fn reorder_category(
    db: &DatabaseConnection,
    owner_id: &str,
    category_id: i64,
    previous_id: Option<i64>,
    next_id: Option<i64>,
) -> Result<ReorderPlan> {
    const OPERATION: &str = "reorder_category";

    let txn = db.begin().await?;
    let moved = require_category(&txn, owner_id, category_id).await?;
    if moved.is_archived {
        return Err(Error::CategoryNotFound { id: category_id });
    }
    check_neighbour(&txn, &moved, previous_id).await?;
    check_neighbour(&txn, &moved, next_id).await?;

    let siblings: Vec<SortKey> = BudgetCategory::find()
        .filter(budget_category::Column::OwnerId.eq(owner_id))
        .filter(budget_category::Column::BudgetType.eq(moved.budget_type.as_str()))
        .filter(budget_category::Column::IsArchived.eq(false))
        .all(&txn)
        .await?
        .iter()
        .map(|c| SortKey::new(c.id, c.sort_order))
        .collect();

    let plan = sort_order::reorder(category_id, previous_id, next_id, &siblings);
    let columns = OrderColumns::<BudgetCategory> {
        id: budget_category::Column::Id,
        sort_order: budget_category::Column::SortOrder,
        updated_at: budget_category::Column::UpdatedAt,
    };
    apply_plan(&txn, &columns, &plan)
        .await
        .map_err(|e| e.in_transaction(OPERATION))?;

    txn.commit().await.map_err(|source| Error::Transaction {
        operation: OPERATION,
        source,
    })?;

    info!(
        category_id,
        rebalanced = matches!(plan, ReorderPlan::FullRebalance { .. }),
        rows = plan.len(),
        "Reordered category"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use crate::errors::ErrorKind;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    async fn orders(db: &DatabaseConnection, budget_type: BudgetType) -> Result<Vec<(i64, f64)>> {
        Ok(list_categories(db, OWNER, Some(budget_type))
            .await?
            .into_iter()
            .map(|c| (c.id, c.sort_order))
            .collect())
    }

    #[tokio::test]
    async fn test_create_category_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_category(&db, OWNER, NewCategory::new(BudgetType::Expense, "   ")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_category_appends_after_siblings() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create_test_category(&db, BudgetType::Expense, "Housing").await?;
        let second = create_test_category(&db, BudgetType::Expense, "Food").await?;
        let other_type = create_test_category(&db, BudgetType::Income, "Salary").await?;

        assert_eq!(first.sort_order, 0.0);
        assert_eq!(second.sort_order, 1.0);
        assert_eq!(other_type.sort_order, 0.0);
        assert_eq!(first.emoji, DEFAULT_EMOJI);
        assert_eq!(first.budget_type, "expense");

        let explicit = create_category(
            &db,
            OWNER,
            NewCategory {
                sort_order: Some(10.0),
                emoji: Some("🚗".to_string()),
                ..NewCategory::new(BudgetType::Expense, "  Car  ")
            },
        )
        .await?;
        assert_eq!(explicit.sort_order, 10.0);
        assert_eq!(explicit.name, "Car");
        assert_eq!(explicit.emoji, "🚗");

        let after_explicit = create_test_category(&db, BudgetType::Expense, "Fun").await?;
        assert_eq!(after_explicit.sort_order, 11.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_categories_are_scoped_to_owner() -> Result<()> {
        let db = setup_test_db().await?;

        let mine = create_test_category(&db, BudgetType::Expense, "Housing").await?;
        let theirs = create_category(
            &db,
            OTHER_OWNER,
            NewCategory::new(BudgetType::Expense, "Housing"),
        )
        .await?;

        assert!(get_category(&db, OWNER, mine.id).await?.is_some());
        assert!(get_category(&db, OWNER, theirs.id).await?.is_none());
        assert_eq!(list_categories(&db, OWNER, None).await?.len(), 1);

        let result = update_category(&db, OWNER, theirs.id, CategoryUpdate::default()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::CategoryNotFound { id } if id == theirs.id
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_category_changes_only_given_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, BudgetType::Savings, "Rainy day").await?;

        let updated = update_category(
            &db,
            OWNER,
            category.id,
            CategoryUpdate {
                emoji: Some("🌧️".to_string()),
                ..CategoryUpdate::default()
            },
        )
        .await?;
        assert_eq!(updated.name, "Rainy day");
        assert_eq!(updated.emoji, "🌧️");
        assert_eq!(updated.sort_order, category.sort_order);

        let result = update_category(
            &db,
            OWNER,
            category.id,
            CategoryUpdate {
                name: Some(String::new()),
                ..CategoryUpdate::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_archive_category_cascades_to_active_items_only() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, BudgetType::Expense, "Housing").await?;
        let rent = create_test_item(&db, category.id, "Rent", 150_000).await?;
        let water = create_test_item(&db, category.id, "Water", 4_000).await?;
        let old = create_test_item(&db, category.id, "Old lease", 120_000).await?;
        crate::core::item::archive_item(&db, OWNER, old.id).await?;
        let old_archived_at = BudgetItem::find_by_id(old.id)
            .one(&db)
            .await?
            .unwrap()
            .archived_at;
        assert!(old_archived_at.is_some());

        let archived = archive_category(&db, OWNER, category.id).await?;
        assert!(archived.category.is_archived);
        assert!(archived.category.archived_at.is_some());
        assert_eq!(archived.items_archived, 2);

        for id in [rent.id, water.id] {
            let item = BudgetItem::find_by_id(id).one(&db).await?.unwrap();
            assert!(item.is_archived);
            assert!(item.archived_at.is_some());
        }
        let old = BudgetItem::find_by_id(old.id).one(&db).await?.unwrap();
        assert_eq!(old.archived_at, old_archived_at);

        assert!(list_categories(&db, OWNER, None).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_unarchive_category_leaves_items_archived() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, BudgetType::Expense, "Housing").await?;
        let rent = create_test_item(&db, category.id, "Rent", 150_000).await?;

        archive_category(&db, OWNER, category.id).await?;
        let restored = unarchive_category(&db, OWNER, category.id).await?;
        assert!(!restored.is_archived);
        assert!(restored.archived_at.is_none());

        let rent = BudgetItem::find_by_id(rent.id).one(&db).await?.unwrap();
        assert!(rent.is_archived);

        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_category_fast_path_touches_one_row() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_category(&db, BudgetType::Expense, "A").await?;
        let b = create_test_category(&db, BudgetType::Expense, "B").await?;
        let c = create_test_category(&db, BudgetType::Expense, "C").await?;

        // Keys are 0, 1, 2. Move C between A and B.
        let plan = reorder_category(&db, OWNER, c.id, Some(a.id), Some(b.id)).await?;
        assert_eq!(
            plan,
            ReorderPlan::SingleUpdate {
                id: c.id,
                sort_order: 0.5
            }
        );

        assert_eq!(
            orders(&db, BudgetType::Expense).await?,
            vec![(a.id, 0.0), (c.id, 0.5), (b.id, 1.0)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_category_heals_degenerate_keys() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_category(&db, BudgetType::Expense, "A").await?;
        let b = create_test_category(&db, BudgetType::Expense, "B").await?;
        let c = create_test_category(&db, BudgetType::Expense, "C").await?;
        let untouched = create_test_category(&db, BudgetType::Income, "Salary").await?;

        // A sits at 0 and has no previous neighbour: both keys resolve to 0.
        let plan = reorder_category(&db, OWNER, c.id, None, Some(a.id)).await?;
        assert!(matches!(plan, ReorderPlan::FullRebalance { .. }));
        assert_eq!(plan.len(), 3);

        assert_eq!(
            orders(&db, BudgetType::Expense).await?,
            vec![(c.id, 1.0), (a.id, 2.0), (b.id, 3.0)]
        );
        assert_eq!(
            orders(&db, BudgetType::Income).await?,
            vec![(untouched.id, 0.0)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_category_rejects_out_of_scope_records() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_category(&db, BudgetType::Expense, "A").await?;
        let b = create_test_category(&db, BudgetType::Expense, "B").await?;
        let income = create_test_category(&db, BudgetType::Income, "Salary").await?;
        let foreign = create_category(
            &db,
            OTHER_OWNER,
            NewCategory::new(BudgetType::Expense, "Theirs"),
        )
        .await?;

        let err = reorder_category(&db, OWNER, a.id, Some(income.id), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OutOfScope { id } if id == income.id));

        let err = reorder_category(&db, OWNER, a.id, None, Some(foreign.id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OutOfScope { .. }));

        let err = reorder_category(&db, OWNER, foreign.id, Some(a.id), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CategoryNotFound { .. }));

        // Nothing was written.
        assert_eq!(
            orders(&db, BudgetType::Expense).await?,
            vec![(a.id, 0.0), (b.id, 1.0)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_category_missing_neighbour_is_boundary() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_category(&db, BudgetType::Expense, "A").await?;
        let b = create_test_category(&db, BudgetType::Expense, "B").await?;

        // Previous does not exist -> 0; next missing -> 1000.
        let plan = reorder_category(&db, OWNER, a.id, Some(9_999), None).await?;
        assert_eq!(
            plan,
            ReorderPlan::SingleUpdate {
                id: a.id,
                sort_order: 500.0
            }
        );
        assert_eq!(
            orders(&db, BudgetType::Expense).await?,
            vec![(b.id, 1.0), (a.id, 500.0)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_reorder_category_failed_rebalance_rolls_back() -> Result<()> {
        // Keys 0, 0, 1: moving 3 before 1 heals, writing 3 then failing on 1.
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![category_model(3, 1.0)]])
            .append_query_results([vec![category_model(1, 0.0)]])
            .append_query_results([vec![
                category_model(1, 0.0),
                category_model(2, 0.0),
                category_model(3, 1.0),
            ]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_exec_errors([DbErr::Custom("disk full".to_string())])
            .into_connection();

        let err = reorder_category(&db, OWNER, 3, None, Some(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transaction);
        assert!(matches!(
            err,
            Error::Transaction {
                operation: "reorder_category",
                ..
            }
        ));
        assert!(!committed(db));

        Ok(())
    }
}
