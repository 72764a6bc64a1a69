//! Writes a [`ReorderPlan`] to whichever ordered table it was computed for.
//!
//! Callers run this inside a transaction so a rebalance lands completely or not at all.

use crate::{
    core::sort_order::{ReorderPlan, SortKey},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, sea_query::Expr};
use tracing::debug;

/// Columns an ordered entity exposes to the reorder writer.
pub(crate) struct OrderColumns<E: EntityTrait> {
    pub(crate) id: E::Column,
    pub(crate) sort_order: E::Column,
    pub(crate) updated_at: E::Column,
}

/// Persists every key in `plan`, returning the number of rows touched.
pub(crate) async fn apply_plan<E, C>(
    db: &C,
    columns: &OrderColumns<E>,
    plan: &ReorderPlan,
) -> Result<u64>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let writes = match plan {
        ReorderPlan::SingleUpdate { id, sort_order } => vec![SortKey::new(*id, *sort_order)],
        ReorderPlan::FullRebalance { assignments } => assignments.clone(),
    };

    let now = Utc::now();
    let mut rows = 0;
    for key in writes {
        let result = E::update_many()
            .col_expr(columns.sort_order, Expr::value(key.sort_order))
            .col_expr(columns.updated_at, Expr::value(now))
            .filter(columns.id.eq(key.id))
            .exec(db)
            .await?;
        rows += result.rows_affected;
    }

    debug!(rows, "Applied reorder plan");
    Ok(rows)
}
