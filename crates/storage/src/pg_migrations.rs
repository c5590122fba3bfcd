//! PostgreSQL schema migrations for simtrack storage.

use sqlx::PgPool;

use crate::error::StorageError;

/// Run all PostgreSQL migrations.
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS service_history (
            id TEXT PRIMARY KEY,
            item_id TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            country_id TEXT NOT NULL,
            fetched_at TEXT,
            is_returned BOOLEAN NOT NULL DEFAULT FALSE,
            returned_at TEXT,
            remark TEXT,
            remark_at TEXT,
            last_message TEXT,
            last_delivery_code BIGINT,
            evaluated BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StorageError::Migration(format!("service_history: {e}")))?;

    // At most one in-flight record per phone number; evaluated rows are
    // historical and may repeat.
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_history_pending_phone \
         ON service_history (phone_number) WHERE NOT evaluated",
    )
    .execute(pool)
    .await
    .map_err(|e| StorageError::Migration(format!("idx_history_pending_phone: {e}")))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_history_evaluated ON service_history (evaluated)",
    )
    .execute(pool)
    .await
    .map_err(|e| StorageError::Migration(format!("idx_history_evaluated: {e}")))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_history_created ON service_history (created_at DESC)",
    )
    .execute(pool)
    .await
    .map_err(|e| StorageError::Migration(format!("idx_history_created: {e}")))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS device_registry (
            id TEXT PRIMARY KEY,
            port TEXT NOT NULL,
            iccid TEXT NOT NULL,
            imei TEXT NOT NULL,
            imsi TEXT NOT NULL,
            sn TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT '0',
            batch_id TEXT,
            active BOOLEAN NOT NULL DEFAULT TRUE,
            st_status TEXT,
            slot_active TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StorageError::Migration(format!("device_registry: {e}")))?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_registry_sn ON device_registry (sn)")
        .execute(pool)
        .await
        .map_err(|e| StorageError::Migration(format!("idx_registry_sn: {e}")))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_registry_active ON device_registry (active)")
        .execute(pool)
        .await
        .map_err(|e| StorageError::Migration(format!("idx_registry_active: {e}")))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_registry_batch ON device_registry (batch_id)")
        .execute(pool)
        .await
        .map_err(|e| StorageError::Migration(format!("idx_registry_batch: {e}")))?;

    tracing::info!("PostgreSQL migrations completed");
    Ok(())
}
