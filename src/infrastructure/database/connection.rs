use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;
use tracing::info;

use crate::shared::config::DatabaseConfig;
use crate::shared::error::{AppError, Result};

pub type DbPool = Pool<Sqlite>;

pub struct Database;

impl Database {
    /// Connect to the local capture database and bring the schema up to
    /// date. Creates the parent directory for file-backed databases.
    pub async fn initialize(config: &DatabaseConfig) -> Result<DbPool> {
        if let Some(path) = file_path_of(&config.url) {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        info!("Capture database connected: {}", config.url);

        Self::run_migrations(&pool).await?;

        Ok(pool)
    }

    pub async fn run_migrations(pool: &DbPool) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(AppError::from)?;
        info!("Capture database migrations completed");
        Ok(())
    }
}

fn file_path_of(url: &str) -> Option<&str> {
    let path = url.strip_prefix("sqlite://")?;
    if path.starts_with(":memory:") {
        return None;
    }
    Some(path.split('?').next().unwrap_or(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialize_creates_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("capture").join("test.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path.display()),
            max_connections: 1,
        };

        let pool = Database::initialize(&config).await.unwrap();
        assert!(db_path.exists());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM outbox_records")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        pool.close().await;
    }

    #[test]
    fn test_file_path_of_strips_scheme_and_query() {
        assert_eq!(
            file_path_of("sqlite:///tmp/a/b.db?mode=rwc"),
            Some("/tmp/a/b.db")
        );
        assert_eq!(file_path_of("sqlite://:memory:"), None);
        assert_eq!(file_path_of("postgres://x"), None);
    }
}
