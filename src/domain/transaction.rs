use super::workflow::WorkflowKind;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gateway response code denoting an approved payment.
pub const GATEWAY_SUCCESS_CODE: &str = "0";

/// A positive monetary amount.
///
/// Wraps `rust_decimal::Decimal` so that zero or negative amounts are
/// rejected at construction time instead of reaching a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, EngineError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(EngineError::Validation(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = EngineError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Gateway,
}

/// Payment state recorded on a committed registration or enrollment.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Cash path: committed now, money collected out-of-band later.
    Pending,
    /// Gateway path: the gateway approved the payment.
    Confirmed,
}

/// Display details carried across the gateway round trip so the receipt view
/// can be rendered without re-fetching the event.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReturnContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_title: Option<String>,
    /// ISO-8601 date of the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_location: Option<String>,
}

/// Durable record of an initiated-but-unconfirmed deferred payment.
///
/// Written immediately before the redirect out of the application; the only
/// state that survives the gateway round trip. At most one exists in the
/// session store at a time. If reconciliation never happens (browser closed,
/// gateway abandoned) the record stays stale until overwritten.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub transaction_id: String,
    pub subject_id: String,
    pub target_id: String,
    pub amount: Amount,
    pub currency: String,
    pub method: PaymentMethod,
    // Records written before the workflow field existed only ever came from
    // event registrations.
    #[serde(default = "default_workflow")]
    pub workflow: WorkflowKind,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub context: ReturnContext,
}

fn default_workflow() -> WorkflowKind {
    WorkflowKind::EventRegistration
}

/// Caller-generated, locally-unique transaction identifier. Doubles as the
/// idempotency key on commit payloads.
pub fn new_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

/// Confirmation payload fetched after the gateway returns control to the
/// application.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub response_code: String,
    pub order_number: String,
    #[serde(default)]
    pub approval_code: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    /// Untouched gateway payload, kept for support diagnostics.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl Confirmation {
    pub fn is_success(&self) -> bool {
        self.response_code == GATEWAY_SUCCESS_CODE
    }
}

/// Data backing the receipt view shown after a successful reconciliation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub order_number: String,
    #[serde(default)]
    pub approval_code: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub event_title: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_location: Option<String>,
}

impl Receipt {
    pub fn from_confirmation(confirmation: &Confirmation, context: &ReturnContext) -> Self {
        Self {
            order_number: confirmation.order_number.clone(),
            approval_code: confirmation.approval_code.clone(),
            amount: confirmation.amount,
            currency: confirmation.currency.clone(),
            event_title: context.event_title.clone(),
            event_date: context.event_date.clone(),
            event_location: context.event_location.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending() -> PendingTransaction {
        PendingTransaction {
            transaction_id: "tx-1".into(),
            subject_id: "m-42".into(),
            target_id: "evt-7".into(),
            amount: Amount::new(dec!(5000)).unwrap(),
            currency: "XPF".into(),
            method: PaymentMethod::Gateway,
            workflow: WorkflowKind::EventRegistration,
            created_at: Utc::now(),
            context: ReturnContext {
                event_title: Some("Assemblée générale".into()),
                event_date: Some("2026-10-03".into()),
                event_location: None,
            },
        }
    }

    #[test]
    fn test_amount_rejects_non_positive_values() {
        assert!(Amount::new(dec!(0)).is_err());
        assert!(Amount::new(dec!(-1.5)).is_err());
        assert_eq!(Amount::new(dec!(8000)).unwrap().value(), dec!(8000));
    }

    #[test]
    fn test_pending_transaction_wire_layout() {
        let json = serde_json::to_value(pending()).unwrap();

        assert_eq!(json["transactionId"], "tx-1");
        assert_eq!(json["subjectId"], "m-42");
        assert_eq!(json["targetId"], "evt-7");
        assert_eq!(json["method"], "gateway");
        assert_eq!(json["eventTitle"], "Assemblée générale");
        // Absent context fields are omitted, not null.
        assert!(json.get("eventLocation").is_none());
    }

    #[test]
    fn test_pending_transaction_round_trip() {
        let tx = pending();
        let json = serde_json::to_string(&tx).unwrap();
        let back: PendingTransaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_pending_transaction_workflow_defaults_to_event_registration() {
        let json = r#"{
            "transactionId": "tx-9",
            "subjectId": "m-1",
            "targetId": "evt-1",
            "amount": "1000",
            "currency": "XPF",
            "method": "gateway",
            "createdAt": "2026-08-30T10:00:00Z"
        }"#;
        let tx: PendingTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.workflow, WorkflowKind::EventRegistration);
        assert_eq!(tx.context, ReturnContext::default());
    }

    #[test]
    fn test_confirmation_success_sentinel() {
        let mut confirmation = Confirmation {
            response_code: "0".into(),
            order_number: "ORD-1".into(),
            approval_code: Some("APX".into()),
            amount: dec!(5000),
            currency: "XPF".into(),
            raw: serde_json::Value::Null,
        };
        assert!(confirmation.is_success());

        confirmation.response_code = "1".into();
        assert!(!confirmation.is_success());
    }

    #[test]
    fn test_receipt_copies_confirmation_and_context() {
        let confirmation = Confirmation {
            response_code: "0".into(),
            order_number: "ORD-77".into(),
            approval_code: None,
            amount: dec!(5000),
            currency: "XPF".into(),
            raw: serde_json::Value::Null,
        };
        let tx = pending();
        let receipt = Receipt::from_confirmation(&confirmation, &tx.context);

        assert_eq!(receipt.order_number, "ORD-77");
        assert_eq!(receipt.event_title.as_deref(), Some("Assemblée générale"));
        assert_eq!(receipt.amount, dec!(5000));
    }

    #[test]
    fn test_transaction_ids_are_unique() {
        assert_ne!(new_transaction_id(), new_transaction_id());
    }
}
