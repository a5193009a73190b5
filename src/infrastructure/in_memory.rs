use crate::domain::auth::AuthSession;
use crate::domain::mutation::Entity;
use crate::domain::ports::{CollectionStore, SessionStore};
use crate::domain::transaction::PendingTransaction;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct SessionSlots {
    pending: Option<PendingTransaction>,
    auth: Option<AuthSession>,
}

/// A non-durable session store.
///
/// `Clone` shares the underlying slots, so a handle kept by a test observes
/// writes made through the engine. Does not survive a process restart; the
/// RocksDB store is the durable counterpart.
#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    slots: Arc<RwLock<SessionSlots>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn pending_transaction(&self) -> Result<Option<PendingTransaction>> {
        Ok(self.slots.read().await.pending.clone())
    }

    async fn set_pending_transaction(&self, tx: PendingTransaction) -> Result<()> {
        self.slots.write().await.pending = Some(tx);
        Ok(())
    }

    async fn clear_pending_transaction(&self) -> Result<()> {
        self.slots.write().await.pending = None;
        Ok(())
    }

    async fn auth_session(&self) -> Result<Option<AuthSession>> {
        Ok(self.slots.read().await.auth.clone())
    }

    async fn set_auth_session(&self, auth: AuthSession) -> Result<()> {
        self.slots.write().await.auth = Some(auth);
        Ok(())
    }

    async fn clear_auth_session(&self) -> Result<()> {
        self.slots.write().await.auth = None;
        Ok(())
    }
}

/// In-memory collection backing store recording every persisted snapshot.
#[derive(Clone)]
pub struct InMemoryCollectionStore<E: Entity> {
    snapshots: Arc<RwLock<Vec<Vec<E>>>>,
}

impl<E: Entity> Default for InMemoryCollectionStore<E> {
    fn default() -> Self {
        Self {
            snapshots: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<E: Entity> InMemoryCollectionStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently persisted collection state, if any.
    pub async fn last_persisted(&self) -> Option<Vec<E>> {
        self.snapshots.read().await.last().cloned()
    }

    pub async fn persist_count(&self) -> usize {
        self.snapshots.read().await.len()
    }
}

#[async_trait]
impl<E: Entity> CollectionStore<E> for InMemoryCollectionStore<E> {
    async fn persist(&self, items: &[E]) -> Result<()> {
        self.snapshots.write().await.push(items.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{Amount, PaymentMethod, ReturnContext};
    use crate::domain::workflow::WorkflowKind;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn pending(id: &str) -> PendingTransaction {
        PendingTransaction {
            transaction_id: id.to_string(),
            subject_id: "m-1".into(),
            target_id: "evt-1".into(),
            amount: Amount::new(dec!(1000)).unwrap(),
            currency: "XPF".into(),
            method: PaymentMethod::Gateway,
            workflow: WorkflowKind::EventRegistration,
            created_at: Utc::now(),
            context: ReturnContext::default(),
        }
    }

    #[tokio::test]
    async fn test_pending_slot_set_get_clear() {
        let store = InMemorySessionStore::new();
        assert!(store.pending_transaction().await.unwrap().is_none());

        store.set_pending_transaction(pending("tx-1")).await.unwrap();
        let got = store.pending_transaction().await.unwrap().unwrap();
        assert_eq!(got.transaction_id, "tx-1");

        store.clear_pending_transaction().await.unwrap();
        assert!(store.pending_transaction().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_single_slot_overwrites() {
        let store = InMemorySessionStore::new();
        store.set_pending_transaction(pending("tx-1")).await.unwrap();
        store.set_pending_transaction(pending("tx-2")).await.unwrap();

        let got = store.pending_transaction().await.unwrap().unwrap();
        assert_eq!(got.transaction_id, "tx-2");
    }

    #[tokio::test]
    async fn test_clone_shares_slots() {
        let store = InMemorySessionStore::new();
        let handle = store.clone();
        store
            .set_auth_session(AuthSession::new("token", "m-9"))
            .await
            .unwrap();

        let auth = handle.auth_session().await.unwrap().unwrap();
        assert_eq!(auth.subject_id, "m-9");

        store.clear_auth_session().await.unwrap();
        assert!(handle.auth_session().await.unwrap().is_none());
    }
}
