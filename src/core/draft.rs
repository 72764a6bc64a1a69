//! Unsaved budget items held by an editing session.
//!
//! Each session owns its own [`DraftIdGenerator`], so draft ids never leak between
//! sessions and never collide with stored ids, which are always positive.

use crate::{
    core::item::{self, CategoryRef, NewBudgetItem},
    entities::budget_item,
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Hands out temporary ids `-1, -2, ...` for records that are not saved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftIdGenerator {
    next: i64,
}

impl Default for DraftIdGenerator {
    fn default() -> Self {
        Self { next: -1 }
    }
}

impl DraftIdGenerator {
    /// Starts a fresh sequence at `-1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unused draft id.
    pub const fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next -= 1;
        id
    }

    /// True for ids handed out by a generator rather than the store.
    #[must_use]
    pub const fn is_draft_id(id: i64) -> bool {
        id < 0
    }
}

/// Items being edited before the user saves them.
#[derive(Debug, Default)]
pub struct DraftSession {
    ids: DraftIdGenerator,
    drafts: Vec<(i64, NewBudgetItem)>,
}

impl DraftSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a draft, returning its temporary id.
    pub fn add(&mut self, draft: NewBudgetItem) -> Result<i64> {
        item::validate_new_item(&draft)?;
        let id = self.ids.next_id();
        self.drafts.push((id, draft));
        debug!(draft_id = id, "Added draft item");
        Ok(id)
    }

    /// Replaces the draft stored under `draft_id`.
    pub fn update(&mut self, draft_id: i64, draft: NewBudgetItem) -> Result<()> {
        item::validate_new_item(&draft)?;
        let slot = self
            .drafts
            .iter_mut()
            .find(|(id, _)| *id == draft_id)
            .ok_or(Error::ItemNotFound { id: draft_id })?;
        slot.1 = draft;
        Ok(())
    }

    /// Drops a draft, returning it if it existed.
    pub fn remove(&mut self, draft_id: i64) -> Option<NewBudgetItem> {
        let index = self.drafts.iter().position(|(id, _)| *id == draft_id)?;
        Some(self.drafts.remove(index).1)
    }

    /// Looks up a draft by its temporary id.
    #[must_use]
    pub fn get(&self, draft_id: i64) -> Option<&NewBudgetItem> {
        self.drafts
            .iter()
            .find(|(id, _)| *id == draft_id)
            .map(|(_, draft)| draft)
    }

    /// Drafts in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &NewBudgetItem)> {
        self.drafts.iter().map(|(id, draft)| (*id, draft))
    }

    /// Number of pending drafts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Saves every draft in one transaction.
    ///
    /// Drafts naming the same new category (same type and name) share the category
    /// created for the first of them. On success the session is emptied and each saved
    /// item is returned with the draft id it replaces; on failure nothing is written and
    /// the drafts stay in the session.
    #[instrument(skip(self, db), fields(drafts = self.drafts.len()))]
    pub async fn commit(
        &mut self,
        db: &DatabaseConnection,
        owner_id: &str,
    ) -> Result<Vec<(i64, budget_item::Model)>> {
        const OPERATION: &str = "commit_drafts";

        let txn = db.begin().await?;
        let mut created_categories: HashMap<(String, String), i64> = HashMap::new();
        let mut saved = Vec::with_capacity(self.drafts.len());

        for (draft_id, draft) in &self.drafts {
            let mut draft = draft.clone();
            let new_category_key = match &draft.category {
                CategoryRef::New { name, .. } => {
                    let key = (draft.budget_type.as_str().to_string(), name.trim().to_string());
                    if let Some(&id) = created_categories.get(&key) {
                        draft.category = CategoryRef::Existing { id };
                        None
                    } else {
                        Some(key)
                    }
                }
                CategoryRef::Existing { .. } => None,
            };

            let model = item::insert_item(&txn, owner_id, draft)
                .await
                .map_err(|e| e.in_transaction(OPERATION))?;
            if let Some(key) = new_category_key {
                created_categories.insert(key, model.category_id);
            }
            saved.push((*draft_id, model));
        }

        txn.commit().await.map_err(|source| Error::Transaction {
            operation: OPERATION,
            source,
        })?;

        self.drafts.clear();
        info!(items = saved.len(), "Committed draft items");
        Ok(saved)
    }
}
