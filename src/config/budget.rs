//! Budget configuration loading from config.toml
//!
//! The file names the owner the CLI acts for and, optionally, categories and items
//! used to seed an empty database. Categories that already exist are left alone.

use crate::{
    core::{BudgetType, RecurrenceDescriptor},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Owner every operation is scoped to
    pub owner_id: String,
    /// Categories to seed
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

/// A category to seed, with its items
#[derive(Debug, Deserialize, Clone)]
pub struct CategorySeed {
    /// Name of the category
    pub name: String,
    /// Income, expense or savings
    #[serde(rename = "type")]
    pub budget_type: BudgetType,
    /// Optional emoji; the default is used when missing
    pub emoji: Option<String>,
    /// Items to create inside the category
    #[serde(default)]
    pub items: Vec<ItemSeed>,
}

/// A budget item to seed
#[derive(Debug, Deserialize, Clone)]
pub struct ItemSeed {
    /// Name of the item
    pub name: String,
    /// Amount per occurrence in cents
    pub amount_cents: i64,
    /// How often the amount recurs
    pub recurrence: RecurrenceDescriptor,
}

/// Loads the budget configuration from a TOML file
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read, the TOML syntax is invalid,
/// or required fields are missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses the budget configuration from TOML text
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.owner_id.trim().is_empty() {
        return Err(Error::Config {
            message: "owner_id cannot be empty".to_string(),
        });
    }
    Ok(config)
}
