use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

use crate::constants::EXPECTED_DB_VERSION;
use crate::queries::{ddl, metadata};

/// Open a file-based database pool for production use
/// Enables WAL mode and foreign keys, creates the file when missing
pub async fn open_database(
    db_path: &Path,
) -> Result<SqlitePool, Box<dyn std::error::Error + Send + Sync>> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}

/// Create all tables and indexes, and stamp the schema version
/// Safe to call on an already-initialized database
pub async fn init_database_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(&ddl::create_metadata_table())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_meetings_table())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_meetings_host_index())
        .execute(pool)
        .await?;

    let sql = metadata::upsert("version", EXPECTED_DB_VERSION);
    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}

/// Verify the database schema version matches what this build expects
pub async fn check_database_version(
    pool: &SqlitePool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let sql = metadata::select_by_key("version");
    let row = sqlx::query(&sql)
        .fetch_optional(pool)
        .await?
        .ok_or("Database is missing version in metadata")?;
    let version: String = row.try_get(0)?;

    if version != EXPECTED_DB_VERSION {
        return Err(format!(
            "Unsupported database version: '{}'. This application only supports version '{}'",
            version, EXPECTED_DB_VERSION
        )
        .into());
    }

    Ok(())
}

/// Create an in-memory database pool for testing
/// Capped at a single connection so every query sees the same database
pub async fn create_test_connection_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_database_schema(&pool).await?;
    Ok(pool)
}

/// Create a file-backed database pool in a temporary directory for testing
/// The returned guard keeps the directory alive for the test's duration
pub async fn create_test_connection_in_temporary_file(
) -> Result<(SqlitePool, tempfile::TempDir), Box<dyn std::error::Error + Send + Sync>> {
    let dir = tempfile::tempdir()?;
    let pool = open_database(&dir.path().join("meetings.sqlite")).await?;
    init_database_schema(&pool).await?;
    Ok((pool, dir))
}
