//! PostgreSQL storage backend using sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use simtrack_core::{
    DeliveryOutcome, DeviceReport, HistoryRecord, HistoryUpdate, RegistryFilter, RegistryRecord,
    ReturnReceipt, UpsertOutcome,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::StorageError;
use crate::traits::{HistoryStore, Page, RegistryStore};

use super::pg_migrations::run_pg_migrations;

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new().max_connections(8).connect(database_url).await?;
        run_pg_migrations(&pool).await?;
        tracing::info!("PgStore initialized");
        Ok(Self { pool })
    }
}

fn row_to_history(row: &sqlx::postgres::PgRow) -> Result<HistoryRecord, StorageError> {
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
    Ok(HistoryRecord {
        id: row.try_get("id")?,
        item_id: row.try_get("item_id")?,
        phone_number: row.try_get("phone_number")?,
        country_id: row.try_get("country_id")?,
        fetched_at: row.try_get("fetched_at")?,
        is_returned: row.try_get("is_returned")?,
        returned_at: row.try_get("returned_at")?,
        remark: row.try_get("remark")?,
        remark_at: row.try_get("remark_at")?,
        last_message: row.try_get("last_message")?,
        last_delivery_code: row.try_get("last_delivery_code")?,
        evaluated: row.try_get("evaluated")?,
        created_at,
        updated_at,
    })
}

fn row_to_device(row: &sqlx::postgres::PgRow) -> Result<RegistryRecord, StorageError> {
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
    Ok(RegistryRecord {
        id: row.try_get("id")?,
        port: row.try_get("port")?,
        iccid: row.try_get("iccid")?,
        imei: row.try_get("imei")?,
        imsi: row.try_get("imsi")?,
        sn: row.try_get("sn")?,
        status: row.try_get("status")?,
        batch_id: row.try_get("batch_id")?,
        active: row.try_get("active")?,
        st_status: row.try_get("st_status")?,
        slot_active: row.try_get("slot_active")?,
        created_at,
        updated_at,
    })
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn insert_history(&self, record: &HistoryRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO service_history
                (id, item_id, phone_number, country_id, fetched_at, is_returned,
                 returned_at, remark, remark_at, last_message, last_delivery_code,
                 evaluated, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(&record.id)
        .bind(&record.item_id)
        .bind(&record.phone_number)
        .bind(&record.country_id)
        .bind(&record.fetched_at)
        .bind(record.is_returned)
        .bind(&record.returned_at)
        .bind(&record.remark)
        .bind(&record.remark_at)
        .bind(&record.last_message)
        .bind(record.last_delivery_code)
        .bind(record.evaluated)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_history(&self, id: &str) -> Result<Option<HistoryRecord>, StorageError> {
        let row = sqlx::query("SELECT * FROM service_history WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_history).transpose()
    }

    async fn find_history_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<HistoryRecord>, StorageError> {
        let row = sqlx::query(
            "SELECT * FROM service_history WHERE phone_number = $1 AND NOT evaluated",
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_history).transpose()
    }

    async fn list_history(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Page<HistoryRecord>, StorageError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM service_history")
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query(
            "SELECT * FROM service_history ORDER BY created_at DESC OFFSET $1 LIMIT $2",
        )
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        let items = rows.iter().map(row_to_history).collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total: total.max(0) as u64, offset, limit })
    }

    async fn list_unevaluated(&self, limit: u64) -> Result<Vec<HistoryRecord>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM service_history WHERE NOT evaluated ORDER BY created_at ASC LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_history).collect()
    }

    async fn active_working_set(
        &self,
        sn_prefix: &str,
        limit: u64,
    ) -> Result<Vec<HistoryRecord>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT h.* FROM service_history h
            JOIN device_registry d ON d.sn = $1 || h.phone_number
            WHERE NOT h.evaluated AND d.active
            ORDER BY h.created_at ASC
            LIMIT $2
            "#,
        )
        .bind(sn_prefix)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_history).collect()
    }

    async fn record_return(&self, id: &str, receipt: &ReturnReceipt) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE service_history
            SET is_returned = $2, returned_at = $3, remark = $4, remark_at = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(receipt.is_returned)
        .bind(&receipt.returned_at)
        .bind(&receipt.remark)
        .bind(&receipt.remark_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "history", id: id.to_owned() });
        }
        Ok(())
    }

    async fn record_delivery(
        &self,
        id: &str,
        outcome: &DeliveryOutcome,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE service_history
            SET last_message = $2, last_delivery_code = $3, evaluated = TRUE,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&outcome.message)
        .bind(outcome.code)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "history", id: id.to_owned() });
        }
        Ok(())
    }

    async fn update_history(
        &self,
        id: &str,
        update: &HistoryUpdate,
    ) -> Result<Option<HistoryRecord>, StorageError> {
        // COALESCE keeps unset fields; evaluated is ORed so it never reverts.
        let row = sqlx::query(
            r#"
            UPDATE service_history
            SET is_returned        = COALESCE($2, is_returned),
                returned_at        = COALESCE($3, returned_at),
                remark             = COALESCE($4, remark),
                remark_at          = COALESCE($5, remark_at),
                last_message       = COALESCE($6, last_message),
                last_delivery_code = COALESCE($7, last_delivery_code),
                evaluated          = evaluated OR COALESCE($8, FALSE),
                updated_at         = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.is_returned)
        .bind(&update.returned_at)
        .bind(&update.remark)
        .bind(&update.remark_at)
        .bind(&update.last_message)
        .bind(update.last_delivery_code)
        .bind(update.evaluated)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_history).transpose()
    }

    async fn delete_history(&self, id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM service_history WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RegistryStore for PgStore {
    async fn upsert_device(&self, report: &DeviceReport) -> Result<UpsertOutcome, StorageError> {
        // Row lock on the sn keeps concurrent reports for the same slot from
        // racing insert-vs-update.
        let mut tx = self.pool.begin().await?;
        let existing = sqlx::query("SELECT id FROM device_registry WHERE sn = $1 FOR UPDATE")
            .bind(&report.sn)
            .fetch_optional(&mut *tx)
            .await?;

        let inserted = existing.is_none();
        let row = if let Some(existing) = existing {
            let id: String = existing.try_get("id")?;
            sqlx::query(
                r#"
                UPDATE device_registry
                SET st_status = $2, active = $3, slot_active = $4, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(&id)
            .bind(&report.st)
            .bind(report.active)
            .bind(&report.slot_active)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query(
                r#"
                INSERT INTO device_registry
                    (id, port, iccid, imei, imsi, sn, status, batch_id, active,
                     st_status, slot_active, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, '0', NULL, $7, $8, $9, NOW(), NOW())
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&report.port)
            .bind(&report.iccid)
            .bind(&report.imei)
            .bind(&report.imsi)
            .bind(&report.sn)
            .bind(report.active)
            .bind(&report.st)
            .bind(&report.slot_active)
            .fetch_one(&mut *tx)
            .await?
        };
        let record = row_to_device(&row)?;
        tx.commit().await?;

        Ok(if inserted { UpsertOutcome::Inserted(record) } else { UpsertOutcome::Updated(record) })
    }

    async fn get_device(&self, id: &str) -> Result<Option<RegistryRecord>, StorageError> {
        let row = sqlx::query("SELECT * FROM device_registry WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_device).transpose()
    }

    async fn find_device_by_sn(&self, sn: &str) -> Result<Option<RegistryRecord>, StorageError> {
        let row = sqlx::query("SELECT * FROM device_registry WHERE sn = $1")
            .bind(sn)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_device).transpose()
    }

    async fn list_devices(
        &self,
        filter: &RegistryFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Page<RegistryRecord>, StorageError> {
        let sn_pattern = filter.sn.as_deref().map(|s| format!("%{}%", escape_like(s)));
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM device_registry
            WHERE ($1::TEXT IS NULL OR sn LIKE $1)
              AND ($2::TEXT IS NULL OR batch_id = $2)
              AND ($3::TEXT IS NULL OR status = $3)
              AND ($4::BOOLEAN IS NULL OR active = $4)
            "#,
        )
        .bind(&sn_pattern)
        .bind(&filter.batch_id)
        .bind(&filter.status)
        .bind(filter.active)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM device_registry
            WHERE ($1::TEXT IS NULL OR sn LIKE $1)
              AND ($2::TEXT IS NULL OR batch_id = $2)
              AND ($3::TEXT IS NULL OR status = $3)
              AND ($4::BOOLEAN IS NULL OR active = $4)
            ORDER BY created_at DESC
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(&sn_pattern)
        .bind(&filter.batch_id)
        .bind(&filter.status)
        .bind(filter.active)
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        let items = rows.iter().map(row_to_device).collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total: total.max(0) as u64, offset, limit })
    }

    async fn registry_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RegistryRecord>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM device_registry ORDER BY created_at ASC, id ASC OFFSET $1 LIMIT $2",
        )
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_device).collect()
    }

    async fn assign_batch(
        &self,
        id: &str,
        batch_id: &str,
        status: &str,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE device_registry SET batch_id = $2, status = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(batch_id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "device", id: id.to_owned() });
        }
        Ok(())
    }

    async fn retire_all(&self) -> Result<u64, StorageError> {
        let result =
            sqlx::query("UPDATE device_registry SET active = FALSE, updated_at = NOW() WHERE active")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn delete_device(&self, id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM device_registry WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
