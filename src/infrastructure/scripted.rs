//! Scripted collaborator doubles.
//!
//! The CLI driver and the integration tests both need api/gateway/navigator
//! implementations whose behavior is fixed up front and whose calls can be
//! inspected afterwards. `Clone` shares the recording state, so a handle
//! kept before boxing observes everything the engine did.

use crate::domain::mutation::{Entity, MutationKind};
use crate::domain::ports::{
    CommitPayload, CommitResponse, InitiationRequest, InitiationResponse, MembershipApi,
    Navigator, PaymentGateway, Profile, ProfileResponse, RemoteMutator,
};
use crate::domain::transaction::Confirmation;
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct ScriptedMembershipApi {
    response: CommitResponse,
    profile: Option<Profile>,
    registration_calls: Arc<Mutex<Vec<CommitPayload>>>,
    enrollment_calls: Arc<Mutex<Vec<CommitPayload>>>,
}

impl ScriptedMembershipApi {
    pub fn succeeding() -> Self {
        Self::with_response(CommitResponse {
            success: true,
            message: None,
            receipt: None,
        })
    }

    pub fn failing(message: &str) -> Self {
        Self::with_response(CommitResponse {
            success: false,
            message: Some(message.to_string()),
            receipt: None,
        })
    }

    pub fn with_response(response: CommitResponse) -> Self {
        Self {
            response,
            profile: None,
            registration_calls: Arc::new(Mutex::new(Vec::new())),
            enrollment_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn registration_calls(&self) -> Vec<CommitPayload> {
        self.registration_calls.lock().unwrap().clone()
    }

    pub fn enrollment_calls(&self) -> Vec<CommitPayload> {
        self.enrollment_calls.lock().unwrap().clone()
    }

    pub fn total_commits(&self) -> usize {
        self.registration_calls().len() + self.enrollment_calls().len()
    }
}

#[async_trait]
impl MembershipApi for ScriptedMembershipApi {
    async fn current_profile(&self, _token: &str) -> Result<ProfileResponse> {
        Ok(match &self.profile {
            Some(profile) => ProfileResponse::Profile(profile.clone()),
            None => ProfileResponse::Unauthenticated,
        })
    }

    async fn commit_registration(&self, payload: CommitPayload) -> Result<CommitResponse> {
        self.registration_calls.lock().unwrap().push(payload);
        Ok(self.response.clone())
    }

    async fn commit_enrollment(&self, payload: CommitPayload) -> Result<CommitResponse> {
        self.enrollment_calls.lock().unwrap().push(payload);
        Ok(self.response.clone())
    }
}

enum GatewayScript {
    Redirect(String),
    InitiationError(String),
}

#[derive(Clone)]
pub struct ScriptedGateway {
    script: Arc<GatewayScript>,
    confirmation: Option<Confirmation>,
    confirmation_unreachable: bool,
    initiations: Arc<Mutex<Vec<InitiationRequest>>>,
}

impl ScriptedGateway {
    pub fn with_redirect(url: &str) -> Self {
        Self {
            script: Arc::new(GatewayScript::Redirect(url.to_string())),
            confirmation: None,
            confirmation_unreachable: false,
            initiations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn initiation_failing(message: &str) -> Self {
        Self {
            script: Arc::new(GatewayScript::InitiationError(message.to_string())),
            confirmation: None,
            confirmation_unreachable: false,
            initiations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_confirmation(mut self, confirmation: Confirmation) -> Self {
        self.confirmation = Some(confirmation);
        self
    }

    pub fn confirmation_unreachable(mut self) -> Self {
        self.confirmation_unreachable = true;
        self
    }

    pub fn initiations(&self) -> Vec<InitiationRequest> {
        self.initiations.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn initiate_payment(&self, request: InitiationRequest) -> Result<InitiationResponse> {
        self.initiations.lock().unwrap().push(request);
        Ok(match self.script.as_ref() {
            GatewayScript::Redirect(url) => InitiationResponse {
                redirect_url: Some(url.clone()),
                error: None,
            },
            GatewayScript::InitiationError(message) => InitiationResponse {
                redirect_url: None,
                error: Some(message.clone()),
            },
        })
    }

    async fn fetch_confirmation(&self) -> Result<Confirmation> {
        if self.confirmation_unreachable {
            return Err(EngineError::Io(std::io::Error::other(
                "confirmation endpoint unreachable",
            )));
        }
        self.confirmation.clone().ok_or_else(|| {
            EngineError::Io(std::io::Error::other("no confirmation payload available"))
        })
    }
}

/// Records every navigation the engine issues instead of leaving the
/// process.
#[derive(Default, Clone)]
pub struct RecordingNavigator {
    visited: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Remote mutator whose failures are chosen per mutation kind.
#[derive(Clone)]
pub struct ScriptedMutator {
    failing_kinds: Arc<HashSet<MutationKind>>,
    message: String,
    calls: Arc<Mutex<Vec<(MutationKind, String)>>>,
}

impl ScriptedMutator {
    pub fn succeeding() -> Self {
        Self::failing_on(&[], "")
    }

    pub fn failing_on(kinds: &[MutationKind], message: &str) -> Self {
        Self {
            failing_kinds: Arc::new(kinds.iter().copied().collect()),
            message: message.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<(MutationKind, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, kind: MutationKind, entity_id: &str) -> Result<()> {
        self.calls.lock().unwrap().push((kind, entity_id.to_string()));
        if self.failing_kinds.contains(&kind) {
            Err(EngineError::RemoteCommit(self.message.clone()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<E: Entity> RemoteMutator<E> for ScriptedMutator {
    async fn create(&self, item: &E) -> Result<()> {
        self.record(MutationKind::Create, item.id())
    }

    async fn update(&self, item: &E) -> Result<()> {
        self.record(MutationKind::Update, item.id())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.record(MutationKind::Delete, id)
    }

    async fn toggle_status(&self, item: &E) -> Result<()> {
        self.record(MutationKind::ToggleStatus, item.id())
    }
}

/// A scenario-free confirmation for tests that only care about the code.
pub fn confirmation(response_code: &str, order_number: &str) -> Confirmation {
    Confirmation {
        response_code: response_code.to_string(),
        order_number: order_number.to_string(),
        approval_code: Some("APPROVED".to_string()),
        amount: rust_decimal::Decimal::ZERO,
        currency: "XPF".to_string(),
        raw: serde_json::Value::Null,
    }
}
