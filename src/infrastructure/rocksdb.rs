use crate::domain::auth::AuthSession;
use crate::domain::ports::SessionStore;
use crate::domain::transaction::PendingTransaction;
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column family holding the session slots.
pub const CF_SESSION: &str = "session";
/// Key of the single pending-transaction slot.
pub const KEY_PENDING: &[u8] = b"pendingPayment";
/// Key of the auth-session slot.
pub const KEY_AUTH: &[u8] = b"authSession";

/// A durable session store backed by RocksDB.
///
/// This is what carries the pending transaction across the full-page
/// navigation to the gateway and back: each CLI run opens the same database
/// and finds whatever the previous run left in the slots.
///
/// Thread-safe; `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbSessionStore {
    db: Arc<DB>,
}

impl RocksDbSessionStore {
    /// Opens or creates the database at `path`, ensuring the session column
    /// family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_session = ColumnFamilyDescriptor::new(CF_SESSION, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_session])
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn read_slot<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        let cf = self
            .db
            .cf_handle(CF_SESSION)
            .ok_or_else(|| EngineError::Storage("session column family not found".to_string()))?;
        match self
            .db
            .get_cf(&cf, key)
            .map_err(|e| EngineError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_slot<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        let cf = self
            .db
            .cf_handle(CF_SESSION)
            .ok_or_else(|| EngineError::Storage("session column family not found".to_string()))?;
        let bytes = serde_json::to_vec(value)?;
        self.db
            .put_cf(&cf, key, bytes)
            .map_err(|e| EngineError::Storage(e.to_string()))
    }

    fn clear_slot(&self, key: &[u8]) -> Result<()> {
        let cf = self
            .db
            .cf_handle(CF_SESSION)
            .ok_or_else(|| EngineError::Storage("session column family not found".to_string()))?;
        self.db
            .delete_cf(&cf, key)
            .map_err(|e| EngineError::Storage(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for RocksDbSessionStore {
    async fn pending_transaction(&self) -> Result<Option<PendingTransaction>> {
        self.read_slot(KEY_PENDING)
    }

    async fn set_pending_transaction(&self, tx: PendingTransaction) -> Result<()> {
        self.write_slot(KEY_PENDING, &tx)
    }

    async fn clear_pending_transaction(&self) -> Result<()> {
        self.clear_slot(KEY_PENDING)
    }

    async fn auth_session(&self) -> Result<Option<AuthSession>> {
        self.read_slot(KEY_AUTH)
    }

    async fn set_auth_session(&self, auth: AuthSession) -> Result<()> {
        self.write_slot(KEY_AUTH, &auth)
    }

    async fn clear_auth_session(&self) -> Result<()> {
        self.clear_slot(KEY_AUTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{Amount, PaymentMethod, ReturnContext};
    use crate::domain::workflow::WorkflowKind;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn pending() -> PendingTransaction {
        PendingTransaction {
            transaction_id: "tx-rocks".into(),
            subject_id: "m-1".into(),
            target_id: "evt-1".into(),
            amount: Amount::new(dec!(5000)).unwrap(),
            currency: "XPF".into(),
            method: PaymentMethod::Gateway,
            workflow: WorkflowKind::EventRegistration,
            created_at: Utc.with_ymd_and_hms(2026, 8, 30, 10, 0, 0).unwrap(),
            context: ReturnContext {
                event_title: Some("Congrès annuel".into()),
                event_date: None,
                event_location: None,
            },
        }
    }

    #[tokio::test]
    async fn test_pending_slot_round_trip() {
        let dir = tempdir().unwrap();
        let store = RocksDbSessionStore::open(dir.path()).unwrap();

        assert!(store.pending_transaction().await.unwrap().is_none());
        store.set_pending_transaction(pending()).await.unwrap();
        let got = store.pending_transaction().await.unwrap().unwrap();
        assert_eq!(got, pending());

        store.clear_pending_transaction().await.unwrap();
        assert!(store.pending_transaction().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_slots_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session_db");

        {
            let store = RocksDbSessionStore::open(&path).unwrap();
            store.set_pending_transaction(pending()).await.unwrap();
            store
                .set_auth_session(AuthSession::new("token", "m-1"))
                .await
                .unwrap();
        }

        let store = RocksDbSessionStore::open(&path).unwrap();
        assert_eq!(store.pending_transaction().await.unwrap(), Some(pending()));
        assert!(store.auth_session().await.unwrap().is_some());
    }
}
