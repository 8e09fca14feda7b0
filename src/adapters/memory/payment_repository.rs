//! In-memory payment repository.
//!
//! Mirrors the Postgres adapter's semantics, including the unique
//! idempotency-key constraint. Used in tests and development; each instance
//! is an injected dependency, never process-global state.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{PaymentId, ReservationId, SubscriptionId, UserId};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::ports::{PaymentListFilter, PaymentRepository, RepositoryError};

/// Payment store backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: Mutex<HashMap<PaymentId, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_newest_first(mut payments: Vec<Payment>) -> Vec<Payment> {
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        payments
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), RepositoryError> {
        let mut payments = self.payments.lock().unwrap();
        if let Some(key) = &payment.idempotency_key {
            let duplicate = payments
                .values()
                .any(|existing| existing.idempotency_key.as_deref() == Some(key));
            if duplicate {
                return Err(RepositoryError::DuplicateIdempotencyKey(key.clone()));
            }
        }
        payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        Ok(self.payments.lock().unwrap().get(id).cloned())
    }

    async fn get_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .values()
            .find(|p| p.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn get_by_reservation_id(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Vec<Payment>, RepositoryError> {
        let matching = self
            .payments
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.reservation_id.as_ref() == Some(reservation_id))
            .cloned()
            .collect();
        Ok(Self::sorted_newest_first(matching))
    }

    async fn get_by_subscription_id(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<Payment>, RepositoryError> {
        let matching = self
            .payments
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.subscription_id.as_ref() == Some(subscription_id))
            .cloned()
            .collect();
        Ok(Self::sorted_newest_first(matching))
    }

    async fn get_by_user_id(&self, user_id: &UserId) -> Result<Vec<Payment>, RepositoryError> {
        let matching = self
            .payments
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.user_id.as_ref() == Some(user_id))
            .cloned()
            .collect();
        Ok(Self::sorted_newest_first(matching))
    }

    async fn update(&self, payment: &Payment) -> Result<(), RepositoryError> {
        let mut payments = self.payments.lock().unwrap();
        match payments.get_mut(&payment.id) {
            Some(existing) => {
                *existing = payment.clone();
                Ok(())
            }
            None => Err(RepositoryError::Database(format!(
                "payment {} does not exist",
                payment.id
            ))),
        }
    }

    async fn update_status(
        &self,
        id: &PaymentId,
        status: PaymentStatus,
        failure_reason: Option<&str>,
    ) -> Result<Option<Payment>, RepositoryError> {
        let mut payments = self.payments.lock().unwrap();
        Ok(payments.get_mut(id).map(|payment| {
            payment.status = status;
            if let Some(reason) = failure_reason {
                payment.failure_reason = Some(reason.to_string());
            }
            payment.clone()
        }))
    }

    async fn delete(&self, id: &PaymentId) -> Result<bool, RepositoryError> {
        Ok(self.payments.lock().unwrap().remove(id).is_some())
    }

    async fn list(&self, filter: PaymentListFilter) -> Result<Vec<Payment>, RepositoryError> {
        let all: Vec<Payment> = self
            .payments
            .lock()
            .unwrap()
            .values()
            .filter(|p| filter.status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        let sorted = Self::sorted_newest_first(all);
        Ok(sorted
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }
}
