use crate::domain::ports::{CommitPayload, MembershipApiBox, PaymentGatewayBox, SessionStoreBox};
use crate::domain::transaction::{PaymentStatus, PendingTransaction, Receipt};
use crate::domain::workflow::{FormState, WorkflowKind};
use crate::error::Result;
use tracing::{error, info, warn};

/// Degraded message shown whenever the outcome of a payment cannot be
/// established on the client.
pub const MSG_CONTACT_SUPPORT: &str =
    "Le paiement a peut-être été accepté. Veuillez contacter le support.";

#[derive(Debug, PartialEq, Clone)]
pub enum ResumeOutcome {
    /// Gateway approved, deferred commit recorded, pending transaction
    /// cleared. The receipt is populated from the confirmation payload.
    Confirmed { receipt: Receipt },
    /// Gateway declined. The pending transaction is retained.
    Failed { message: String },
    /// The outcome cannot be established (confirmation fetch failed, no
    /// pending transaction, or the deferred commit itself failed after an
    /// approved payment). The user is told to contact support.
    Ambiguous { message: String },
}

/// Reconciles the gateway's confirmation against the persisted pending
/// transaction after re-entry from the external redirect.
///
/// Runs in a fresh logical process: nothing in memory survives the
/// navigation, only the session store does. A reload of the return page
/// after a successful reconciliation finds the slot empty and yields the
/// ambiguous outcome, never a second commit.
pub struct ResumeHandler {
    session_store: SessionStoreBox,
    api: MembershipApiBox,
    gateway: PaymentGatewayBox,
}

impl ResumeHandler {
    pub fn new(
        session_store: SessionStoreBox,
        api: MembershipApiBox,
        gateway: PaymentGatewayBox,
    ) -> Self {
        Self {
            session_store,
            api,
            gateway,
        }
    }

    pub async fn resume(&self) -> Result<ResumeOutcome> {
        // Single attempt; any transport error is ambiguous, not retried.
        let confirmation = match self.gateway.fetch_confirmation().await {
            Ok(confirmation) => confirmation,
            Err(err) => {
                warn!(%err, "confirmation fetch failed");
                return Ok(Self::ambiguous());
            }
        };

        let Some(pending) = self.session_store.pending_transaction().await? else {
            warn!(
                order_number = %confirmation.order_number,
                "confirmation received with no pending transaction"
            );
            return Ok(Self::ambiguous());
        };

        if !confirmation.is_success() {
            info!(
                transaction_id = %pending.transaction_id,
                response_code = %confirmation.response_code,
                "gateway declined the payment"
            );
            // Retained so the user could in principle retry.
            return Ok(ResumeOutcome::Failed {
                message: format!(
                    "Paiement refusé par la banque (code {})",
                    confirmation.response_code
                ),
            });
        }

        match self.commit_deferred(&pending).await {
            Ok(()) => {
                self.session_store.clear_pending_transaction().await?;
                info!(
                    transaction_id = %pending.transaction_id,
                    order_number = %confirmation.order_number,
                    "payment reconciled"
                );
                Ok(ResumeOutcome::Confirmed {
                    receipt: Receipt::from_confirmation(&confirmation, &pending.context),
                })
            }
            Err(err) => {
                // The payment may have been taken but the registration was
                // not recorded. Keep the pending transaction and hand the
                // case to support.
                error!(
                    transaction_id = %pending.transaction_id,
                    %err,
                    "deferred commit failed after approved payment"
                );
                Ok(Self::ambiguous())
            }
        }
    }

    async fn commit_deferred(&self, pending: &PendingTransaction) -> Result<()> {
        let payload = CommitPayload {
            subject_id: pending.subject_id.clone(),
            target_id: pending.target_id.clone(),
            amount: pending.amount,
            currency: pending.currency.clone(),
            method: pending.method,
            payment_status: PaymentStatus::Confirmed,
            idempotency_key: pending.transaction_id.clone(),
            bot_check_token: None,
            fields: FormState::new(),
        };
        let response = match pending.workflow {
            WorkflowKind::MembershipEnrollment => self.api.commit_enrollment(payload).await?,
            WorkflowKind::EventRegistration => self.api.commit_registration(payload).await?,
        };
        if response.success {
            Ok(())
        } else {
            Err(crate::error::EngineError::RemoteCommit(
                response
                    .message
                    .unwrap_or_else(|| "commit rejected without message".to_string()),
            ))
        }
    }

    fn ambiguous() -> ResumeOutcome {
        ResumeOutcome::Ambiguous {
            message: MSG_CONTACT_SUPPORT.to_string(),
        }
    }
}
