//! Core business logic - framework-agnostic budgeting operations.

/// Income, expense and savings buckets
pub mod budget_type;
/// Budget category operations: create, update, archive, reorder
pub mod category;
/// Draft items held by an editing session before they are saved
pub mod draft;
/// Budget item operations: create, update, archive, reorder
pub mod item;
/// Recurrence normalization into monthly occurrence counts
pub mod recurrence;
/// Persists reorder plans against a sibling set
pub mod reorder;
/// Seeding categories and items from configuration
pub mod seed;
/// Fractional sort-order engine
pub mod sort_order;
/// Monthly totals per category, per type, and net
pub mod summary;

pub use budget_type::BudgetType;
pub use recurrence::{Frequency, RecurrenceDescriptor, ReferenceMonth};
