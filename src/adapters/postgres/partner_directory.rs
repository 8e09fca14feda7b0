//! PostgreSQL adapter for PartnerDirectory.
//!
//! Delivery bookkeeping uses single-statement counter updates so concurrent
//! dispatch cycles for the same partner never lose a failure count; the
//! suspension check happens inside the same statement.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{PartnerId, Timestamp};
use crate::domain::partner::{EventType, Partner, PartnerStatus};
use crate::ports::{DirectoryError, PartnerDirectory};

/// PostgreSQL implementation of PartnerDirectory.
pub struct PgPartnerDirectory {
    pool: PgPool,
    suspension_threshold: u32,
}

impl PgPartnerDirectory {
    pub fn new(pool: PgPool, suspension_threshold: u32) -> Self {
        Self {
            pool,
            suspension_threshold,
        }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Partner, DirectoryError> {
        let id: Uuid = row.get("id");
        let events: serde_json::Value = row.get("events");
        let events: Vec<EventType> = serde_json::from_value(events)
            .map_err(|e| DirectoryError::Database(format!("bad events column: {e}")))?;
        let status: String = row.get("status");
        let secret: String = row.get("secret");
        let total: i64 = row.get("total_webhooks_sent");
        let failures: i32 = row.get("consecutive_failures");

        Ok(Partner::from_parts(
            PartnerId::from_uuid(id),
            row.get("name"),
            row.get("webhook_url"),
            events,
            SecretString::new(secret),
            status_from_db(&status)?,
            row.get("description"),
            row.get("contact_email"),
            total.max(0) as u64,
            failures.max(0) as u32,
            row.get::<Option<chrono::DateTime<chrono::Utc>>, _>("last_webhook_at")
                .map(Timestamp::from_datetime),
            Timestamp::from_datetime(row.get("created_at")),
            Timestamp::from_datetime(row.get("updated_at")),
        ))
    }
}

#[async_trait]
impl PartnerDirectory for PgPartnerDirectory {
    async fn partners_for_event(
        &self,
        event: EventType,
    ) -> Result<Vec<Partner>, DirectoryError> {
        let event_json = serde_json::json!([event.as_str()]);
        let rows = sqlx::query(
            r#"
            SELECT * FROM partners
            WHERE status = 'active'
              AND (events @> '["*"]'::jsonb OR events @> $1)
            "#,
        )
        .bind(event_json)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn list(&self) -> Result<Vec<Partner>, DirectoryError> {
        let rows = sqlx::query("SELECT * FROM partners ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(Self::from_row).collect()
    }

    async fn find_by_id(&self, id: &PartnerId) -> Result<Option<Partner>, DirectoryError> {
        let row = sqlx::query("SELECT * FROM partners WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(Self::from_row).transpose()
    }

    async fn create(&self, partner: &Partner) -> Result<(), DirectoryError> {
        let events = serde_json::to_value(&partner.events)
            .map_err(|e| DirectoryError::Database(format!("events serialization: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO partners (
                id, name, webhook_url, events, secret, status,
                description, contact_email,
                total_webhooks_sent, consecutive_failures, last_webhook_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(partner.id.as_uuid())
        .bind(&partner.name)
        .bind(&partner.webhook_url)
        .bind(events)
        .bind(partner.secret().expose_secret())
        .bind(partner.status.as_str())
        .bind(&partner.description)
        .bind(&partner.contact_email)
        .bind(partner.total_webhooks_sent as i64)
        .bind(partner.consecutive_failures as i32)
        .bind(
            partner
                .last_webhook_at
                .as_ref()
                .map(|ts| *ts.as_datetime()),
        )
        .bind(partner.created_at.as_datetime())
        .bind(partner.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update(&self, partner: &Partner) -> Result<(), DirectoryError> {
        let events = serde_json::to_value(&partner.events)
            .map_err(|e| DirectoryError::Database(format!("events serialization: {e}")))?;

        let result = sqlx::query(
            r#"
            UPDATE partners SET
                name = $2,
                webhook_url = $3,
                events = $4,
                secret = $5,
                status = $6,
                description = $7,
                contact_email = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(partner.id.as_uuid())
        .bind(&partner.name)
        .bind(&partner.webhook_url)
        .bind(events)
        .bind(partner.secret().expose_secret())
        .bind(partner.status.as_str())
        .bind(&partner.description)
        .bind(&partner.contact_email)
        .bind(partner.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::NotFound(partner.id));
        }
        Ok(())
    }

    async fn record_delivery_success(&self, id: &PartnerId) -> Result<(), DirectoryError> {
        let result = sqlx::query(
            r#"
            UPDATE partners SET
                total_webhooks_sent = total_webhooks_sent + 1,
                consecutive_failures = 0,
                last_webhook_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::NotFound(*id));
        }
        Ok(())
    }

    async fn record_delivery_failure(
        &self,
        id: &PartnerId,
    ) -> Result<PartnerStatus, DirectoryError> {
        // Counter increment and suspension decision in one statement.
        let row = sqlx::query(
            r#"
            UPDATE partners SET
                consecutive_failures = consecutive_failures + 1,
                status = CASE
                    WHEN consecutive_failures + 1 >= $2 THEN 'suspended'
                    ELSE status
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING status
            "#,
        )
        .bind(id.as_uuid())
        .bind(self.suspension_threshold as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let row = row.ok_or(DirectoryError::NotFound(*id))?;
        let status: String = row.get("status");
        status_from_db(&status)
    }
}

fn status_from_db(label: &str) -> Result<PartnerStatus, DirectoryError> {
    match label {
        "active" => Ok(PartnerStatus::Active),
        "inactive" => Ok(PartnerStatus::Inactive),
        "suspended" => Ok(PartnerStatus::Suspended),
        other => Err(DirectoryError::Database(format!(
            "unknown partner status '{other}' in row"
        ))),
    }
}

fn map_sqlx_error(err: sqlx::Error) -> DirectoryError {
    DirectoryError::Database(err.to_string())
}
