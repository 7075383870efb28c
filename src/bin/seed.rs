use taskdeck::config::{prepare_sqlite_file, Config};
use taskdeck::domain::repository::TaskRepository;
use taskdeck::infrastructure::sqlite_repo::SqliteTaskRepository;
use taskdeck::seed;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    prepare_sqlite_file(&config.database_url)?;
    let repo = SqliteTaskRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let mut rng = rand::thread_rng();
    seed::run(&repo, &mut rng, config.seed_count).await?;
    Ok(())
}
