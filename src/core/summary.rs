//! Monthly totals business logic.
//!
//! Normalizes every active item to the amount it contributes to one calendar month,
//! then rolls those amounts up per category, per budget type, and into a net figure.
//! All amounts are integer cents; formatting to dollars happens only at the edge.

use crate::{
    core::{BudgetType, ReferenceMonth, category, item, recurrence::monthly_equivalent},
    entities::{budget_category, budget_item},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::fmt::Write;
use tracing::{debug, warn};

/// Sums the monthly equivalents of all non-archived `items` for `month`.
///
/// Totals saturate at the `i64` bounds.
#[must_use]
pub fn compute_monthly_total(items: &[budget_item::Model], month: ReferenceMonth) -> i64 {
    items
        .iter()
        .filter(|item| !item.is_archived)
        .map(|item| monthly_equivalent(item.amount, &item.recurrence(), month))
        .fold(0, i64::saturating_add)
}

/// Monthly total of one category.
#[derive(Debug, Clone)]
pub struct CategoryTotal {
    /// The category
    pub category: budget_category::Model,
    /// Its parsed budget type
    pub budget_type: BudgetType,
    /// Number of active items counted
    pub item_count: usize,
    /// Sum of the items' monthly equivalents in cents
    pub monthly_total: i64,
}

/// Everything an owner plans for one month.
#[derive(Debug, Clone)]
pub struct MonthlySummary {
    /// Month the totals were computed for
    pub month: ReferenceMonth,
    /// Total income in cents
    pub income: i64,
    /// Total expenses in cents
    pub expenses: i64,
    /// Total savings in cents
    pub savings: i64,
    /// `income - expenses - savings`
    pub net: i64,
    /// Active categories in display order
    pub categories: Vec<CategoryTotal>,
}

impl MonthlySummary {
    /// Total for a single budget type.
    #[must_use]
    pub const fn total_for(&self, budget_type: BudgetType) -> i64 {
        match budget_type {
            BudgetType::Income => self.income,
            BudgetType::Expense => self.expenses,
            BudgetType::Savings => self.savings,
        }
    }
}

/// Net left over after expenses and savings are taken out of income.
#[must_use]
pub const fn net_amount(income: i64, expenses: i64, savings: i64) -> i64 {
    income.saturating_sub(expenses).saturating_sub(savings)
}

/// Builds the monthly summary for an owner's active categories and items.
pub async fn build_monthly_summary(
    db: &DatabaseConnection,
    owner_id: &str,
    month: ReferenceMonth,
) -> Result<MonthlySummary> {
    let categories = category::list_categories(db, owner_id, None).await?;

    let mut items_by_category: HashMap<i64, Vec<budget_item::Model>> = HashMap::new();
    for item in item::list_owner_items(db, owner_id).await? {
        items_by_category
            .entry(item.category_id)
            .or_default()
            .push(item);
    }

    let mut totals: Vec<CategoryTotal> = Vec::with_capacity(categories.len());
    for category in categories {
        let Ok(budget_type) = category.budget_type.parse::<BudgetType>() else {
            warn!(
                category_id = category.id,
                budget_type = %category.budget_type,
                "Skipping category with unknown budget type"
            );
            continue;
        };
        let items = items_by_category.remove(&category.id).unwrap_or_default();
        totals.push(CategoryTotal {
            item_count: items.len(),
            monthly_total: compute_monthly_total(&items, month),
            budget_type,
            category,
        });
    }

    let type_total = |budget_type: BudgetType| -> i64 {
        totals
            .iter()
            .filter(|t| t.budget_type == budget_type)
            .map(|t| t.monthly_total)
            .fold(0, i64::saturating_add)
    };
    let income = type_total(BudgetType::Income);
    let expenses = type_total(BudgetType::Expense);
    let savings = type_total(BudgetType::Savings);
    let net = net_amount(income, expenses, savings);

    debug!(%month, income, expenses, savings, net, "Built monthly summary");

    Ok(MonthlySummary {
        month,
        income,
        expenses,
        savings,
        net,
        categories: totals,
    })
}

/// Formats cents as dollars with thousands separators, e.g. `-123456` as `-$1,234.56`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = (abs / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{:02}", abs % 100)
}

/// Renders a summary as plain text, one section per budget type.
#[must_use]
pub fn format_monthly_summary(summary: &MonthlySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Budget for {}", summary.month);

    for budget_type in BudgetType::ALL {
        let _ = writeln!(
            out,
            "\n{}: {}",
            budget_type.label(),
            format_cents(summary.total_for(budget_type))
        );
        for total in summary
            .categories
            .iter()
            .filter(|t| t.budget_type == budget_type)
        {
            let noun = if total.item_count == 1 { "item" } else { "items" };
            let _ = writeln!(
                out,
                "  {} {} ({} {noun}): {}",
                total.category.emoji,
                total.category.name,
                total.item_count,
                format_cents(total.monthly_total)
            );
        }
    }

    let _ = writeln!(out, "\nNet: {}", format_cents(summary.net));
    out
}
