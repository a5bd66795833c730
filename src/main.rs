use anyhow::Result;
use tracing::info;

use propintake::api::app_api_loop;
use propintake::db::Database;
use propintake::environment::Settings;
use propintake::logging::configure_logging;

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();

    info!(
        "Starting propintake {} (built {}, commit {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        option_env!("GIT_HASH").unwrap_or("unknown")
    );

    let settings = Settings::from_env()?;
    let db = Database::new(&settings.database_path).await?;
    let importer = settings.importer(db);

    app_api_loop(importer, settings.port).await
}
