//! In-memory partner directory.
//!
//! The single mutex makes the bookkeeping calls atomic per partner: two
//! concurrent dispatch cycles can never interleave inside
//! `record_delivery_failure`, so no failure count is ever lost.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::PartnerId;
use crate::domain::partner::{EventType, Partner, PartnerStatus};
use crate::ports::{DirectoryError, PartnerDirectory};

/// Partner store backed by a mutex-guarded map.
pub struct InMemoryPartnerDirectory {
    partners: Mutex<HashMap<PartnerId, Partner>>,
    suspension_threshold: u32,
}

impl InMemoryPartnerDirectory {
    /// Creates an empty directory with the given suspension threshold.
    pub fn new(suspension_threshold: u32) -> Self {
        Self {
            partners: Mutex::new(HashMap::new()),
            suspension_threshold,
        }
    }
}

#[async_trait]
impl PartnerDirectory for InMemoryPartnerDirectory {
    async fn partners_for_event(
        &self,
        event: EventType,
    ) -> Result<Vec<Partner>, DirectoryError> {
        Ok(self
            .partners
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.is_deliverable() && p.is_subscribed_to(event))
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<Partner>, DirectoryError> {
        Ok(self.partners.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_id(&self, id: &PartnerId) -> Result<Option<Partner>, DirectoryError> {
        Ok(self.partners.lock().unwrap().get(id).cloned())
    }

    async fn create(&self, partner: &Partner) -> Result<(), DirectoryError> {
        self.partners
            .lock()
            .unwrap()
            .insert(partner.id, partner.clone());
        Ok(())
    }

    async fn update(&self, partner: &Partner) -> Result<(), DirectoryError> {
        let mut partners = self.partners.lock().unwrap();
        if !partners.contains_key(&partner.id) {
            return Err(DirectoryError::NotFound(partner.id));
        }
        partners.insert(partner.id, partner.clone());
        Ok(())
    }

    async fn record_delivery_success(&self, id: &PartnerId) -> Result<(), DirectoryError> {
        let mut partners = self.partners.lock().unwrap();
        let partner = partners.get_mut(id).ok_or(DirectoryError::NotFound(*id))?;
        partner.record_webhook_success();
        Ok(())
    }

    async fn record_delivery_failure(
        &self,
        id: &PartnerId,
    ) -> Result<PartnerStatus, DirectoryError> {
        let mut partners = self.partners.lock().unwrap();
        let partner = partners.get_mut(id).ok_or(DirectoryError::NotFound(*id))?;
        Ok(partner.record_webhook_failure(self.suspension_threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partner(events: Vec<EventType>) -> Partner {
        Partner::create("Test Partner", "https://p.test/hooks", events, None, None).unwrap()
    }

    #[tokio::test]
    async fn resolves_only_active_subscribed_partners() {
        let directory = InMemoryPartnerDirectory::new(10);

        let subscribed = partner(vec![EventType::PaymentSucceeded]);
        let wildcard = partner(vec![EventType::All]);
        let other_event = partner(vec![EventType::PaymentFailed]);
        let mut inactive = partner(vec![EventType::PaymentSucceeded]);
        inactive.deactivate();

        for p in [&subscribed, &wildcard, &other_event, &inactive] {
            directory.create(p).await.unwrap();
        }

        let resolved = directory
            .partners_for_event(EventType::PaymentSucceeded)
            .await
            .unwrap();
        let ids: Vec<PartnerId> = resolved.iter().map(|p| p.id).collect();

        assert_eq!(resolved.len(), 2);
        assert!(ids.contains(&subscribed.id));
        assert!(ids.contains(&wildcard.id));
    }

    #[tokio::test]
    async fn failure_bookkeeping_suspends_at_threshold() {
        let directory = InMemoryPartnerDirectory::new(3);
        let p = partner(vec![EventType::All]);
        directory.create(&p).await.unwrap();

        assert_eq!(
            directory.record_delivery_failure(&p.id).await.unwrap(),
            PartnerStatus::Active
        );
        assert_eq!(
            directory.record_delivery_failure(&p.id).await.unwrap(),
            PartnerStatus::Active
        );
        assert_eq!(
            directory.record_delivery_failure(&p.id).await.unwrap(),
            PartnerStatus::Suspended
        );

        // Suspended partners drop out of resolution.
        let resolved = directory
            .partners_for_event(EventType::PaymentCreated)
            .await
            .unwrap();
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn success_resets_the_streak() {
        let directory = InMemoryPartnerDirectory::new(3);
        let p = partner(vec![EventType::All]);
        directory.create(&p).await.unwrap();

        directory.record_delivery_failure(&p.id).await.unwrap();
        directory.record_delivery_failure(&p.id).await.unwrap();
        directory.record_delivery_success(&p.id).await.unwrap();

        let stored = directory.find_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.consecutive_failures, 0);
        assert_eq!(stored.total_webhooks_sent, 1);
        assert_eq!(stored.status, PartnerStatus::Active);
    }

    #[tokio::test]
    async fn bookkeeping_on_missing_partner_errors() {
        let directory = InMemoryPartnerDirectory::new(10);
        let id = PartnerId::new();
        assert!(matches!(
            directory.record_delivery_success(&id).await,
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_failures_are_all_counted() {
        use std::sync::Arc;

        let directory = Arc::new(InMemoryPartnerDirectory::new(100));
        let p = partner(vec![EventType::All]);
        directory.create(&p).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let directory = directory.clone();
            let id = p.id;
            handles.push(tokio::spawn(async move {
                directory.record_delivery_failure(&id).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = directory.find_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.consecutive_failures, 20);
    }
}
