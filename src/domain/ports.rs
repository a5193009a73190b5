use super::auth::AuthSession;
use super::mutation::Entity;
use super::transaction::{Amount, Confirmation, PaymentMethod, PaymentStatus, PendingTransaction, Receipt};
use super::workflow::FormState;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Durable key/value storage surviving full-page navigation and refresh.
///
/// Holds at most one pending transaction and one auth session; absence means
/// "none". This is the only state shared across the app → gateway → app
/// boundary. Single writer per browser context; concurrent tabs are not
/// guarded against.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn pending_transaction(&self) -> Result<Option<PendingTransaction>>;
    async fn set_pending_transaction(&self, tx: PendingTransaction) -> Result<()>;
    async fn clear_pending_transaction(&self) -> Result<()>;

    async fn auth_session(&self) -> Result<Option<AuthSession>>;
    async fn set_auth_session(&self, auth: AuthSession) -> Result<()>;
    async fn clear_auth_session(&self) -> Result<()>;
}

/// Payload for `commit_registration` / `commit_enrollment`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommitPayload {
    pub subject_id: String,
    pub target_id: String,
    pub amount: Amount,
    pub currency: String,
    pub method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Reused transaction id; lets the server deduplicate retries.
    pub idempotency_key: String,
    /// Opaque bot-check token, forwarded unchanged. Absent on deferred
    /// commits issued after the gateway round trip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_check_token: Option<String>,
    #[serde(default)]
    pub fields: FormState,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub subject_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ProfileResponse {
    Profile(Profile),
    Unauthenticated,
}

/// Content/identity API of the site backend.
#[async_trait]
pub trait MembershipApi: Send + Sync {
    async fn current_profile(&self, token: &str) -> Result<ProfileResponse>;
    async fn commit_registration(&self, payload: CommitPayload) -> Result<CommitResponse>;
    async fn commit_enrollment(&self, payload: CommitPayload) -> Result<CommitResponse>;
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InitiationRequest {
    pub amount: Decimal,
    pub currency: String,
    pub transaction_id: String,
    pub return_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InitiationResponse {
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// External payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Requests the redirect target for a deferred payment. Navigating to it
    /// eventually returns control to `return_url`.
    async fn initiate_payment(&self, request: InitiationRequest) -> Result<InitiationResponse>;
    /// Fetches the confirmation payload after re-entry. Called exactly once
    /// per page load; callers treat a transport error as an ambiguous
    /// outcome, never retry.
    async fn fetch_confirmation(&self) -> Result<Confirmation>;
}

/// Full-page navigation out of the application.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;
}

/// Remote side of an optimistic mutation.
#[async_trait]
pub trait RemoteMutator<E: Entity>: Send + Sync {
    async fn create(&self, item: &E) -> Result<()>;
    async fn update(&self, item: &E) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<()>;
    async fn toggle_status(&self, item: &E) -> Result<()>;
}

/// Durable backing store a screen's collection is persisted to after a
/// successful remote mutation.
#[async_trait]
pub trait CollectionStore<E: Entity>: Send + Sync {
    async fn persist(&self, items: &[E]) -> Result<()>;
}

pub type SessionStoreBox = Box<dyn SessionStore>;
pub type MembershipApiBox = Box<dyn MembershipApi>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type NavigatorBox = Box<dyn Navigator>;
pub type RemoteMutatorBox<E> = Box<dyn RemoteMutator<E>>;
pub type CollectionStoreBox<E> = Box<dyn CollectionStore<E>>;
