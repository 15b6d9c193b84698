use anyhow::Result;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use pizza_shop::{
    app,
    app_state::AppState,
    bootstrap::{self, bootstrap},
    config, db,
};

/// Migrations embedded into the binary so the image needs no SQL files.
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::create_pool(&config.database).await?;
    let app = app(AppState::new(
        db_pool,
        config.tax_rate.clone(),
        config.upload_dir.clone(),
    ));

    tracing::info!("Bootstrapping...");
    bootstrap("PizzaShop", app, &config.server).await?;
    Ok(())
}
