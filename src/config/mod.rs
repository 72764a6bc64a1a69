/// Budget configuration loading from config.toml
pub mod budget;

/// Database configuration and connection management
pub mod database;
