use super::checkout::{CheckoutOutcome, CheckoutRequest, CheckoutResolver};
use crate::domain::ports::{MembershipApi, ProfileResponse, SessionStore};
use crate::domain::transaction::{Amount, PaymentMethod, ReturnContext, new_transaction_id};
use crate::domain::wizard::{AdvanceOutcome, WizardSession};
use crate::domain::workflow::{FormState, WorkflowDefinition, WorkflowKind};
use crate::error::{EngineError, Result};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Builds the identity prefill for a freshly opened wizard from the
/// authenticated member's profile.
pub async fn profile_prefill(
    store: &dyn SessionStore,
    api: &dyn MembershipApi,
) -> Result<FormState> {
    let auth = store
        .auth_session()
        .await?
        .ok_or(EngineError::Unauthenticated)?;
    match api.current_profile(&auth.token).await? {
        ProfileResponse::Profile(profile) => {
            let mut form = FormState::new();
            form.insert("firstName".into(), profile.first_name);
            form.insert("lastName".into(), profile.last_name);
            form.insert("email".into(), profile.email);
            Ok(form)
        }
        // Token present locally but no longer honored by the backend.
        ProfileResponse::Unauthenticated => Err(EngineError::Unauthenticated),
    }
}

/// Payment choice and page context supplied when the wizard completes.
#[derive(Debug, Clone)]
pub struct PaymentOptions {
    pub method: PaymentMethod,
    pub amount: Amount,
    pub currency: String,
    pub target_id: String,
    pub bot_check_token: String,
    pub secure_transport: bool,
    pub return_url: String,
    pub cancel_url: String,
    pub context: ReturnContext,
    pub replace_pending: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub enum CompletionOutcome {
    Resolved(CheckoutOutcome),
    /// The wizard was cancelled or replaced while the commit was in flight;
    /// the late response is discarded, not applied.
    DiscardedStale,
}

struct ActiveWizard {
    definition: WorkflowDefinition,
    session: WizardSession,
    /// Set when `advance` validates the final step; cleared by any edit or
    /// retreat so completion always runs on a validated form.
    ready: bool,
    /// Generated once per wizard session so that a retried completion reuses
    /// the same idempotency key.
    transaction_id: String,
}

/// Owns the active wizard and ties its completion to the payment branch.
///
/// Other screens hold their own state; this engine only serializes
/// operations on the one wizard it owns.
pub struct WorkflowEngine {
    resolver: CheckoutResolver,
    active: RwLock<Option<ActiveWizard>>,
}

impl WorkflowEngine {
    pub fn new(resolver: CheckoutResolver) -> Self {
        Self {
            resolver,
            active: RwLock::new(None),
        }
    }

    /// Opens a fresh wizard, replacing any current one. Returns the session
    /// id.
    pub async fn open(&self, kind: WorkflowKind) -> String {
        let session = WizardSession::new(kind);
        let id = session.id.clone();
        info!(workflow = %kind, session_id = %id, "wizard opened");
        *self.active.write().await = Some(ActiveWizard {
            definition: WorkflowDefinition::for_kind(kind),
            session,
            ready: false,
            transaction_id: new_transaction_id(),
        });
        id
    }

    pub async fn set_field(&self, field: &str, value: &str) -> Result<()> {
        let mut active = self.active.write().await;
        let wizard = in_progress(&mut active)?;
        wizard.session.set_field(field, value);
        wizard.ready = false;
        Ok(())
    }

    pub async fn set_fields(&self, fields: FormState) -> Result<()> {
        let mut active = self.active.write().await;
        let wizard = in_progress(&mut active)?;
        wizard.session.set_fields(fields);
        wizard.ready = false;
        Ok(())
    }

    pub async fn advance(&self) -> Result<AdvanceOutcome> {
        let mut active = self.active.write().await;
        let wizard = in_progress(&mut active)?;
        let outcome = wizard.session.advance(&wizard.definition);
        wizard.ready = matches!(outcome, AdvanceOutcome::ReadyToComplete);
        Ok(outcome)
    }

    pub async fn retreat(&self) -> Result<()> {
        let mut active = self.active.write().await;
        let wizard = in_progress(&mut active)?;
        wizard.session.retreat();
        wizard.ready = false;
        Ok(())
    }

    /// Discards the wizard synchronously. An in-flight completion is not
    /// cancelled; its response is discarded when it lands.
    pub async fn cancel(&self) -> Result<()> {
        let mut active = self.active.write().await;
        let wizard = in_progress(&mut active)?;
        wizard.session.cancel();
        info!(session_id = %wizard.session.id, "wizard cancelled");
        Ok(())
    }

    pub async fn session(&self) -> Result<WizardSession> {
        let active = self.active.read().await;
        active
            .as_ref()
            .map(|w| w.session.clone())
            .ok_or(EngineError::WizardClosed)
    }

    /// Runs the payment branch for the completed wizard. Rejected unless
    /// `advance` has validated the final step since the last edit.
    ///
    /// The wizard lock is not held across the remote call; the session
    /// identity captured before the await is re-checked afterwards, and a
    /// response belonging to a cancelled or replaced wizard is discarded.
    pub async fn complete(&self, payment: PaymentOptions) -> Result<CompletionOutcome> {
        let (request, session_id) = {
            let mut active = self.active.write().await;
            let wizard = in_progress(&mut active)?;
            if !wizard.ready {
                return Err(EngineError::Precondition(
                    "the final step has not been validated".to_string(),
                ));
            }
            let request = CheckoutRequest {
                workflow: wizard.session.workflow,
                form: wizard.session.form.clone(),
                method: payment.method,
                amount: payment.amount,
                currency: payment.currency,
                target_id: payment.target_id,
                transaction_id: wizard.transaction_id.clone(),
                bot_check_token: payment.bot_check_token,
                secure_transport: payment.secure_transport,
                return_url: payment.return_url,
                cancel_url: payment.cancel_url,
                context: payment.context,
                replace_pending: payment.replace_pending,
            };
            (request, wizard.session.id.clone())
        };

        let outcome = self.resolver.resolve(request).await?;

        let mut active = self.active.write().await;
        let still_current = active
            .as_ref()
            .map(|w| w.session.id == session_id && w.session.is_in_progress())
            .unwrap_or(false);
        if !still_current {
            warn!(%session_id, "completion response for a stale wizard, discarded");
            return Ok(CompletionOutcome::DiscardedStale);
        }

        if let CheckoutOutcome::Completed { .. } = outcome
            && let Some(wizard) = active.as_mut()
        {
            wizard.session.complete();
        }
        Ok(CompletionOutcome::Resolved(outcome))
    }
}

fn in_progress<'a>(
    active: &'a mut Option<ActiveWizard>,
) -> Result<&'a mut ActiveWizard> {
    match active {
        Some(wizard) if wizard.session.is_in_progress() => Ok(wizard),
        _ => Err(EngineError::WizardClosed),
    }
}
