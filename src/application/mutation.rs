use crate::domain::mutation::{Entity, MutationIntent, MutationKind, Notice};
use crate::domain::ports::{CollectionStoreBox, RemoteMutatorBox};
use crate::error::{EngineError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Success notices clear themselves after this long; error notices persist.
pub const SUCCESS_NOTICE_TTL_SECONDS: i64 = 3;

pub const MSG_SAVED: &str = "Enregistré";

#[derive(Debug, PartialEq, Clone)]
pub enum MutationOutcome {
    /// Remote call succeeded; the collection was persisted to the backing
    /// store.
    Applied,
    /// Remote call failed; the collection was restored to its pre-mutation
    /// snapshot.
    RolledBack { message: String },
}

/// Optimistic mutation coordinator used by the list-management screens.
///
/// Applies a change to the in-memory collection immediately, issues the
/// remote call, and rolls the collection back on failure. One intent per
/// entity may be in flight at a time; a second `apply` on the same entity
/// while the first is pending is rejected with
/// [`EngineError::MutationInFlight`].
pub struct MutationCoordinator<E: Entity> {
    items: RwLock<Vec<E>>,
    in_flight: Mutex<HashSet<String>>,
    notice: Mutex<Option<Notice>>,
    remote: RemoteMutatorBox<E>,
    backing: CollectionStoreBox<E>,
}

struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().expect("in-flight lock poisoned").remove(&self.id);
    }
}

impl<E: Entity> MutationCoordinator<E> {
    pub fn new(items: Vec<E>, remote: RemoteMutatorBox<E>, backing: CollectionStoreBox<E>) -> Self {
        Self {
            items: RwLock::new(items),
            in_flight: Mutex::new(HashSet::new()),
            notice: Mutex::new(None),
            remote,
            backing,
        }
    }

    /// Applies one optimistic mutation.
    ///
    /// `proposed` carries the new value for Create/Update/ToggleStatus, its
    /// id matching `entity_id`, and must be `None` for Delete. A remote
    /// failure is not an error: the
    /// rollback is the recovery, reported as [`MutationOutcome::RolledBack`].
    pub async fn apply(
        &self,
        kind: MutationKind,
        entity_id: &str,
        proposed: Option<E>,
    ) -> Result<MutationOutcome> {
        let _guard = self.claim(entity_id)?;

        let proposed = validated(kind, entity_id, proposed)?;
        let intent = self.apply_locally(kind, entity_id, proposed).await?;

        let remote_result = match (&intent.kind, &intent.proposed) {
            (MutationKind::Create, Some(item)) => self.remote.create(item).await,
            (MutationKind::Update, Some(item)) => self.remote.update(item).await,
            (MutationKind::ToggleStatus, Some(item)) => self.remote.toggle_status(item).await,
            (MutationKind::Delete, _) => self.remote.delete(entity_id).await,
            // `validated` rejected these shapes before the local apply
            _ => Err(EngineError::Validation(
                "mutation without a proposed value".to_string(),
            )),
        };

        match remote_result {
            Ok(()) => {
                let items = self.items.read().await;
                self.backing.persist(&items).await?;
                info!(entity_id, kind = ?intent.kind, "mutation applied");
                self.post_notice(Notice::success(
                    MSG_SAVED,
                    Utc::now(),
                    Duration::seconds(SUCCESS_NOTICE_TTL_SECONDS),
                ));
                Ok(MutationOutcome::Applied)
            }
            Err(err) => {
                self.rollback(&intent).await;
                let message = match err {
                    EngineError::RemoteCommit(message) => message,
                    other => other.to_string(),
                };
                warn!(entity_id, kind = ?intent.kind, %message, "mutation rolled back");
                self.post_notice(Notice::error(message.clone(), Utc::now()));
                Ok(MutationOutcome::RolledBack { message })
            }
        }
    }

    pub async fn items(&self) -> Vec<E> {
        self.items.read().await.clone()
    }

    /// Currently visible notice, success expiry applied.
    pub fn notice(&self) -> Option<Notice> {
        self.notice_as_of(Utc::now())
    }

    pub fn notice_as_of(&self, now: DateTime<Utc>) -> Option<Notice> {
        let notice = self.notice.lock().expect("notice lock poisoned");
        notice.clone().filter(|n| n.is_visible_at(now))
    }

    fn claim(&self, entity_id: &str) -> Result<InFlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        if !in_flight.insert(entity_id.to_string()) {
            return Err(EngineError::MutationInFlight(entity_id.to_string()));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            id: entity_id.to_string(),
        })
    }

    async fn apply_locally(
        &self,
        kind: MutationKind,
        entity_id: &str,
        proposed: Option<E>,
    ) -> Result<MutationIntent<E>> {
        let mut items = self.items.write().await;
        let position = items.iter().position(|item| item.id() == entity_id);

        match kind {
            MutationKind::Create => {
                let proposed =
                    proposed.ok_or_else(|| EngineError::Validation("Create needs a value".into()))?;
                if position.is_some() {
                    return Err(EngineError::Validation(format!(
                        "entity {entity_id} already exists"
                    )));
                }
                items.push(proposed.clone());
                Ok(MutationIntent {
                    entity_id: entity_id.to_string(),
                    kind,
                    previous: None,
                    proposed: Some(proposed),
                })
            }
            MutationKind::Update | MutationKind::ToggleStatus => {
                let proposed =
                    proposed.ok_or_else(|| EngineError::Validation("Update needs a value".into()))?;
                let index = position.ok_or_else(|| {
                    EngineError::Validation(format!("unknown entity {entity_id}"))
                })?;
                let previous = items[index].clone();
                items[index] = proposed.clone();
                Ok(MutationIntent {
                    entity_id: entity_id.to_string(),
                    kind,
                    previous: Some((index, previous)),
                    proposed: Some(proposed),
                })
            }
            MutationKind::Delete => {
                let index = position.ok_or_else(|| {
                    EngineError::Validation(format!("unknown entity {entity_id}"))
                })?;
                let previous = items.remove(index);
                Ok(MutationIntent {
                    entity_id: entity_id.to_string(),
                    kind,
                    previous: Some((index, previous)),
                    proposed: None,
                })
            }
        }
    }

    /// Restores the collection to its pre-mutation snapshot: a created item
    /// is removed, an updated one reverted in place, a deleted one
    /// re-inserted at its old position.
    async fn rollback(&self, intent: &MutationIntent<E>) {
        let mut items = self.items.write().await;
        match (&intent.kind, &intent.previous) {
            (MutationKind::Create, None) => {
                items.retain(|item| item.id() != intent.entity_id);
            }
            (MutationKind::Delete, Some((index, previous))) => {
                let index = (*index).min(items.len());
                items.insert(index, previous.clone());
            }
            (_, Some((_, previous))) => {
                if let Some(current) = items
                    .iter_mut()
                    .find(|item| item.id() == intent.entity_id)
                {
                    *current = previous.clone();
                }
            }
            (_, None) => {}
        }
    }

    fn post_notice(&self, notice: Notice) {
        *self.notice.lock().expect("notice lock poisoned") = Some(notice);
    }
}

/// Rejects kind/value mismatches before anything is touched: Delete takes no
/// proposed value, every other kind needs one whose id matches `entity_id`.
/// A proposed value carrying a foreign id would make the rollback lookup
/// miss the item it has to restore.
fn validated<E: Entity>(
    kind: MutationKind,
    entity_id: &str,
    proposed: Option<E>,
) -> Result<Option<E>> {
    match (kind, proposed) {
        (MutationKind::Delete, None) => Ok(None),
        (MutationKind::Delete, Some(_)) => Err(EngineError::Validation(
            "Delete takes no proposed value".to_string(),
        )),
        (kind, None) => Err(EngineError::Validation(format!(
            "{kind:?} needs a proposed value"
        ))),
        (_, Some(item)) => {
            if item.id() == entity_id {
                Ok(Some(item))
            } else {
                Err(EngineError::Validation(format!(
                    "proposed value has id {} for entity {entity_id}",
                    item.id()
                )))
            }
        }
    }
}
