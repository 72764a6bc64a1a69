//! Seeding categories and items from config.toml.

use crate::{
    config::budget::AppConfig,
    core::{
        category::{self, NewCategory},
        item::{self, CategoryRef, NewBudgetItem},
    },
    entities::{BudgetCategory, budget_category},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// What a seeding run created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Categories inserted
    pub categories_created: usize,
    /// Categories left alone because they already existed
    pub categories_skipped: usize,
    /// Items inserted
    pub items_created: usize,
}

/// Creates the configured categories and items that do not exist yet.
///
/// A category exists when the owner already has one with the same type and name,
/// archived or not; its configured items are then skipped as well. Everything is
/// written in one transaction.
#[instrument(skip(db, config), fields(owner_id = %config.owner_id))]
pub async fn seed_from_config(db: &DatabaseConnection, config: &AppConfig) -> Result<SeedReport> {
    const OPERATION: &str = "seed_from_config";

    info!(
        "Starting to seed budget. Found {} categories in config.",
        config.categories.len()
    );
    let owner_id = config.owner_id.as_str();
    let mut report = SeedReport::default();

    let txn = db.begin().await?;
    for seed in &config.categories {
        let existing = BudgetCategory::find()
            .filter(budget_category::Column::OwnerId.eq(owner_id))
            .filter(budget_category::Column::BudgetType.eq(seed.budget_type.as_str()))
            .filter(budget_category::Column::Name.eq(seed.name.trim()))
            .one(&txn)
            .await?;

        if let Some(existing) = existing {
            debug!(
                category_id = existing.id,
                archived = existing.is_archived,
                "Category '{}' already exists. Skipping.",
                seed.name
            );
            report.categories_skipped += 1;
            continue;
        }

        let new = NewCategory {
            emoji: seed.emoji.clone(),
            ..NewCategory::new(seed.budget_type, seed.name.clone())
        };
        let created = category::create_category(&txn, owner_id, new)
            .await
            .map_err(|e| e.in_transaction(OPERATION))?;
        report.categories_created += 1;
        info!("Inserting NEW {} category '{}'", seed.budget_type, created.name);

        for item_seed in &seed.items {
            let new = NewBudgetItem {
                category: CategoryRef::Existing { id: created.id },
                budget_type: seed.budget_type,
                name: item_seed.name.clone(),
                amount: item_seed.amount_cents,
                recurrence: item_seed.recurrence.clone(),
                sort_order: None,
            };
            item::insert_item(&txn, owner_id, new)
                .await
                .map_err(|e| e.in_transaction(OPERATION))?;
            report.items_created += 1;
        }
    }

    txn.commit().await.map_err(|source| Error::Transaction {
        operation: OPERATION,
        source,
    })?;
    info!(
        categories_created = report.categories_created,
        categories_skipped = report.categories_skipped,
        items_created = report.items_created,
        "Finished seeding budget."
    );
    Ok(report)
}
