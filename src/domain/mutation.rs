use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An item managed by a list-management screen.
pub trait Entity: Clone + PartialEq + Send + Sync + 'static {
    fn id(&self) -> &str;
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    ToggleStatus,
}

/// Ephemeral record of one optimistic change: what was there before, what
/// was proposed. Discarded on remote success, applied in reverse on failure.
/// Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationIntent<E: Entity> {
    pub entity_id: String,
    pub kind: MutationKind,
    /// Pre-mutation snapshot and its position in the collection, `None` for
    /// Create.
    pub previous: Option<(usize, E)>,
    pub proposed: Option<E>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NoticeKind {
    Success,
    Error,
}

/// User-visible status message. Success notices expire after a fixed TTL;
/// error notices stay until replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    posted_at: DateTime<Utc>,
    ttl: Option<Duration>,
}

impl Notice {
    pub fn success(message: impl Into<String>, posted_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            posted_at,
            ttl: Some(ttl),
        }
    }

    pub fn error(message: impl Into<String>, posted_at: DateTime<Utc>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            posted_at,
            ttl: None,
        }
    }

    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => now < self.posted_at + ttl,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_notice_expires_after_ttl() {
        let posted = Utc::now();
        let notice = Notice::success("Enregistré", posted, Duration::seconds(3));

        assert!(notice.is_visible_at(posted));
        assert!(notice.is_visible_at(posted + Duration::seconds(2)));
        assert!(!notice.is_visible_at(posted + Duration::seconds(3)));
    }

    #[test]
    fn test_error_notice_never_expires() {
        let posted = Utc::now();
        let notice = Notice::error("Échec de la suppression", posted);
        assert!(notice.is_visible_at(posted + Duration::days(7)));
        assert_eq!(notice.kind, NoticeKind::Error);
    }
}
