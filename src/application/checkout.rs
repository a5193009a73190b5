use crate::domain::ports::{
    CommitPayload, CommitResponse, InitiationRequest, MembershipApiBox, NavigatorBox,
    PaymentGatewayBox, SessionStoreBox,
};
use crate::domain::transaction::{
    Amount, PaymentMethod, PaymentStatus, PendingTransaction, Receipt, ReturnContext,
};
use crate::domain::workflow::{FormState, WorkflowKind};
use crate::error::{EngineError, Result};
use chrono::Utc;
use tracing::{info, warn};

/// Everything the payment branch needs, captured from the completed wizard
/// and the surrounding page.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub workflow: WorkflowKind,
    pub form: FormState,
    pub method: PaymentMethod,
    pub amount: Amount,
    pub currency: String,
    pub target_id: String,
    /// Caller-generated, unique per wizard session. Reused as the
    /// idempotency key so a retried commit is deduplicable server-side.
    pub transaction_id: String,
    pub bot_check_token: String,
    pub secure_transport: bool,
    pub return_url: String,
    pub cancel_url: String,
    pub context: ReturnContext,
    /// Replacing a live pending transaction is an explicit caller decision,
    /// never a silent overwrite.
    pub replace_pending: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub enum CheckoutOutcome {
    /// Cash path: the commit succeeded synchronously.
    Completed { receipt: Option<Receipt> },
    /// Gateway path: the pending transaction is stored and the navigation
    /// out of the application was issued. Resolution happens on the next
    /// page load, through the resume handler.
    RedirectIssued { redirect_url: String },
    /// A prior pending transaction occupies the single slot and the caller
    /// did not ask to replace it.
    PendingConflict { existing: PendingTransaction },
}

/// Decides between the immediate cash commit and the deferred gateway round
/// trip. Invoked exactly once per completed wizard; exactly one of
/// {cash commit, gateway redirect} happens.
pub struct CheckoutResolver {
    session_store: SessionStoreBox,
    api: MembershipApiBox,
    gateway: PaymentGatewayBox,
    navigator: NavigatorBox,
}

impl CheckoutResolver {
    pub fn new(
        session_store: SessionStoreBox,
        api: MembershipApiBox,
        gateway: PaymentGatewayBox,
        navigator: NavigatorBox,
    ) -> Self {
        Self {
            session_store,
            api,
            gateway,
            navigator,
        }
    }

    pub async fn resolve(&self, request: CheckoutRequest) -> Result<CheckoutOutcome> {
        if request.bot_check_token.trim().is_empty() {
            return Err(EngineError::Precondition(
                "bot-check token is missing".to_string(),
            ));
        }
        if !request.secure_transport {
            return Err(EngineError::Precondition(
                "transport is not secure".to_string(),
            ));
        }
        let auth = self
            .session_store
            .auth_session()
            .await?
            .ok_or(EngineError::Unauthenticated)?;

        match request.method {
            PaymentMethod::Cash => self.commit_cash(&auth.subject_id, request).await,
            PaymentMethod::Gateway => self.defer_to_gateway(&auth.subject_id, request).await,
        }
    }

    /// One synchronous commit with `paymentStatus = pending`; the money is
    /// collected out-of-band later. No pending transaction is ever written
    /// on this path.
    async fn commit_cash(
        &self,
        subject_id: &str,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome> {
        let payload = CommitPayload {
            subject_id: subject_id.to_string(),
            target_id: request.target_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            idempotency_key: request.transaction_id.clone(),
            bot_check_token: Some(request.bot_check_token.clone()),
            fields: request.form.clone(),
        };

        let response = self.commit(request.workflow, payload).await?;
        if response.success {
            info!(
                workflow = %request.workflow,
                transaction_id = %request.transaction_id,
                "cash commit accepted"
            );
            Ok(CheckoutOutcome::Completed {
                receipt: response.receipt,
            })
        } else {
            let message = response
                .message
                .unwrap_or_else(|| "commit rejected without message".to_string());
            warn!(workflow = %request.workflow, %message, "cash commit rejected");
            // Surfaced verbatim; the wizard stays in place for a retry.
            Err(EngineError::RemoteCommit(message))
        }
    }

    /// Initiation first: the pending transaction is written only once a
    /// usable redirect target exists, so a failed initiation leaves no state
    /// behind.
    async fn defer_to_gateway(
        &self,
        subject_id: &str,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome> {
        if let Some(existing) = self.session_store.pending_transaction().await?
            && !request.replace_pending
        {
            warn!(
                existing_id = %existing.transaction_id,
                "pending transaction slot occupied"
            );
            return Ok(CheckoutOutcome::PendingConflict { existing });
        }

        let initiation = self
            .gateway
            .initiate_payment(InitiationRequest {
                amount: request.amount.value(),
                currency: request.currency.clone(),
                transaction_id: request.transaction_id.clone(),
                return_url: request.return_url.clone(),
                cancel_url: request.cancel_url.clone(),
            })
            .await?;

        let redirect_url = match initiation.redirect_url {
            Some(url) if !url.is_empty() => url,
            _ => {
                let reason = initiation
                    .error
                    .unwrap_or_else(|| "gateway returned no redirect URL".to_string());
                return Err(EngineError::GatewayInitiation(reason));
            }
        };

        let pending = PendingTransaction {
            transaction_id: request.transaction_id.clone(),
            subject_id: subject_id.to_string(),
            target_id: request.target_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            method: PaymentMethod::Gateway,
            workflow: request.workflow,
            created_at: Utc::now(),
            context: request.context.clone(),
        };
        self.session_store.set_pending_transaction(pending).await?;
        info!(
            transaction_id = %request.transaction_id,
            %redirect_url,
            "pending transaction stored, redirecting to gateway"
        );

        self.navigator.navigate(&redirect_url).await?;
        Ok(CheckoutOutcome::RedirectIssued { redirect_url })
    }

    async fn commit(&self, workflow: WorkflowKind, payload: CommitPayload) -> Result<CommitResponse> {
        match workflow {
            WorkflowKind::MembershipEnrollment => self.api.commit_enrollment(payload).await,
            WorkflowKind::EventRegistration => self.api.commit_registration(payload).await,
        }
    }
}
