use budget_planner::{
    config::{budget, database},
    core::{ReferenceMonth, seed, summary},
    errors::Result,
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the budget configuration
    let config_path = env::var("BUDGET_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let app_config = budget::load_config(&config_path)
        .inspect_err(|e| error!("Failed to load {}: {}", config_path, e))?;
    info!(owner_id = %app_config.owner_id, "Loaded budget configuration.");

    // 4. Connect and make sure the tables exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed categories and items that are not in the database yet
    seed::seed_from_config(&db, &app_config)
        .await
        .inspect_err(|e| error!("Failed to seed budget: {}", e))?;

    // 6. Report on the requested month
    let month = match env::var("REPORT_MONTH") {
        Ok(raw) => raw.parse::<ReferenceMonth>()?,
        Err(env::VarError::NotPresent) => ReferenceMonth::current(),
        Err(e) => return Err(e.into()),
    };
    let report = summary::build_monthly_summary(&db, &app_config.owner_id, month).await?;
    print!("{}", summary::format_monthly_summary(&report));

    Ok(())
}
