use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Run database migrations, creating the pastes table if it does not exist.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let pastes_table = config.pastes_table();

    let create_pastes = format!(
        "CREATE TABLE IF NOT EXISTS {pastes_table} (
            id TEXT PRIMARY KEY,
            content_hash TEXT NOT NULL,
            expire_at TIMESTAMPTZ NOT NULL,
            remaining_reads INTEGER NULL CHECK (remaining_reads >= 0)
        )"
    );

    // The reaper groups by content hash.
    let create_hash_idx = format!(
        "CREATE INDEX IF NOT EXISTS {}pastes_content_hash_idx ON {pastes_table} (content_hash)",
        config.table_prefix
    );

    sqlx::query(&create_pastes).execute(pool).await?;
    sqlx::query(&create_hash_idx).execute(pool).await?;

    Ok(())
}
