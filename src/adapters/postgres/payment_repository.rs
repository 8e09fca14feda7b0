//! PostgreSQL adapter for PaymentRepository.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{
    PaymentId, ReservationId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::payment::{Currency, Payment, PaymentStatus, PaymentType};
use crate::ports::{PaymentListFilter, PaymentRepository, RepositoryError};

/// Name of the unique constraint backing idempotency keys.
const IDEMPOTENCY_KEY_CONSTRAINT: &str = "payments_idempotency_key_key";

/// PostgreSQL implementation of PaymentRepository.
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Payment, RepositoryError> {
        let id: Uuid = row.get("id");
        let amount: Decimal = row.get("amount");
        let currency: String = row.get("currency");
        let status: String = row.get("payment_status");
        let payment_type: String = row.get("payment_type");
        let metadata: serde_json::Value = row.get("metadata");

        let currency = Currency::parse(&currency).ok_or_else(|| {
            RepositoryError::Database(format!("unknown currency '{currency}' in row"))
        })?;

        let metadata = serde_json::from_value(metadata)
            .map_err(|e| RepositoryError::Database(format!("bad metadata column: {e}")))?;

        Ok(Payment {
            id: PaymentId::from_uuid(id),
            amount,
            currency,
            status: status_from_db(&status)?,
            payment_type: payment_type_from_db(&payment_type)?,
            reservation_id: row
                .get::<Option<Uuid>, _>("reservation_id")
                .map(ReservationId::from_uuid),
            subscription_id: row
                .get::<Option<Uuid>, _>("subscription_id")
                .map(SubscriptionId::from_uuid),
            user_id: row.get::<Option<Uuid>, _>("user_id").map(UserId::from_uuid),
            provider: row.get("provider"),
            provider_payment_id: row.get("provider_payment_id"),
            checkout_url: row.get("checkout_url"),
            payer_email: row.get("payer_email"),
            payer_name: row.get("payer_name"),
            description: row.get("description"),
            metadata,
            idempotency_key: row.get("idempotency_key"),
            failure_reason: row.get("failure_reason"),
            created_at: Timestamp::from_datetime(row.get("created_at")),
            updated_at: Timestamp::from_datetime(row.get("updated_at")),
        })
    }

    async fn fetch_many(
        &self,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> Result<Vec<Payment>, RepositoryError> {
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(Self::from_row).collect()
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), RepositoryError> {
        let metadata = serde_json::to_value(&payment.metadata)
            .map_err(|e| RepositoryError::Database(format!("metadata serialization: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, amount, currency, payment_status, payment_type,
                reservation_id, subscription_id, user_id,
                provider, provider_payment_id, checkout_url,
                payer_email, payer_name, description, metadata,
                idempotency_key, failure_reason, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.amount)
        .bind(payment.currency.code())
        .bind(status_to_db(payment.status))
        .bind(payment.payment_type.as_str())
        .bind(payment.reservation_id.as_ref().map(|id| *id.as_uuid()))
        .bind(payment.subscription_id.as_ref().map(|id| *id.as_uuid()))
        .bind(payment.user_id.as_ref().map(|id| *id.as_uuid()))
        .bind(&payment.provider)
        .bind(&payment.provider_payment_id)
        .bind(&payment.checkout_url)
        .bind(&payment.payer_email)
        .bind(&payment.payer_name)
        .bind(&payment.description)
        .bind(metadata)
        .bind(&payment.idempotency_key)
        .bind(&payment.failure_reason)
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_create_error(e, payment))?;

        Ok(())
    }

    async fn get_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM payments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(Self::from_row).transpose()
    }

    async fn get_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM payments WHERE idempotency_key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(Self::from_row).transpose()
    }

    async fn get_by_reservation_id(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Vec<Payment>, RepositoryError> {
        self.fetch_many(
            sqlx::query(
                "SELECT * FROM payments WHERE reservation_id = $1 ORDER BY created_at DESC",
            )
            .bind(reservation_id.as_uuid()),
        )
        .await
    }

    async fn get_by_subscription_id(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<Payment>, RepositoryError> {
        self.fetch_many(
            sqlx::query(
                "SELECT * FROM payments WHERE subscription_id = $1 ORDER BY created_at DESC",
            )
            .bind(subscription_id.as_uuid()),
        )
        .await
    }

    async fn get_by_user_id(&self, user_id: &UserId) -> Result<Vec<Payment>, RepositoryError> {
        self.fetch_many(
            sqlx::query("SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC")
                .bind(user_id.as_uuid()),
        )
        .await
    }

    async fn update(&self, payment: &Payment) -> Result<(), RepositoryError> {
        let metadata = serde_json::to_value(&payment.metadata)
            .map_err(|e| RepositoryError::Database(format!("metadata serialization: {e}")))?;

        let result = sqlx::query(
            r#"
            UPDATE payments SET
                payment_status = $2,
                provider = $3,
                provider_payment_id = $4,
                checkout_url = $5,
                payer_email = $6,
                payer_name = $7,
                description = $8,
                metadata = $9,
                failure_reason = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(status_to_db(payment.status))
        .bind(&payment.provider)
        .bind(&payment.provider_payment_id)
        .bind(&payment.checkout_url)
        .bind(&payment.payer_email)
        .bind(&payment.payer_name)
        .bind(&payment.description)
        .bind(metadata)
        .bind(&payment.failure_reason)
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Database(format!(
                "payment {} does not exist",
                payment.id
            )));
        }
        Ok(())
    }

    async fn update_status(
        &self,
        id: &PaymentId,
        status: PaymentStatus,
        failure_reason: Option<&str>,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query(
            r#"
            UPDATE payments SET
                payment_status = $2,
                failure_reason = COALESCE($3, failure_reason),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(status_to_db(status))
        .bind(failure_reason)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        row.as_ref().map(Self::from_row).transpose()
    }

    async fn delete(&self, id: &PaymentId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: PaymentListFilter) -> Result<Vec<Payment>, RepositoryError> {
        match filter.status {
            Some(status) => {
                self.fetch_many(
                    sqlx::query(
                        r#"
                        SELECT * FROM payments
                        WHERE payment_status = $1
                        ORDER BY created_at DESC
                        LIMIT $2 OFFSET $3
                        "#,
                    )
                    .bind(status_to_db(status))
                    .bind(filter.limit)
                    .bind(filter.offset),
                )
                .await
            }
            None => {
                self.fetch_many(
                    sqlx::query(
                        "SELECT * FROM payments ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                    )
                    .bind(filter.limit)
                    .bind(filter.offset),
                )
                .await
            }
        }
    }
}

/// The payments table predates this service and stores upper-case labels
/// (with COMPLETED/CANCELLED spellings); mapping happens only here.
fn status_to_db(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "PENDING",
        PaymentStatus::Processing => "PROCESSING",
        PaymentStatus::Succeeded => "COMPLETED",
        PaymentStatus::Failed => "FAILED",
        PaymentStatus::Canceled => "CANCELLED",
        PaymentStatus::Refunded => "REFUNDED",
    }
}

fn status_from_db(label: &str) -> Result<PaymentStatus, RepositoryError> {
    match label {
        "PENDING" => Ok(PaymentStatus::Pending),
        "PROCESSING" => Ok(PaymentStatus::Processing),
        "COMPLETED" => Ok(PaymentStatus::Succeeded),
        "FAILED" => Ok(PaymentStatus::Failed),
        "CANCELLED" => Ok(PaymentStatus::Canceled),
        "REFUNDED" => Ok(PaymentStatus::Refunded),
        other => Err(RepositoryError::Database(format!(
            "unknown payment status '{other}' in row"
        ))),
    }
}

fn payment_type_from_db(label: &str) -> Result<PaymentType, RepositoryError> {
    match label {
        "reservation" => Ok(PaymentType::Reservation),
        "subscription" => Ok(PaymentType::Subscription),
        other => Err(RepositoryError::Database(format!(
            "unknown payment type '{other}' in row"
        ))),
    }
}

fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(err.to_string())
}

fn map_create_error(err: sqlx::Error, payment: &Payment) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(IDEMPOTENCY_KEY_CONSTRAINT) {
            return RepositoryError::DuplicateIdempotencyKey(
                payment.idempotency_key.clone().unwrap_or_default(),
            );
        }
    }
    map_sqlx_error(err)
}
