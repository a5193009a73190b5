use chrono::Utc;
use memberflow::application::resume::{MSG_CONTACT_SUPPORT, ResumeHandler, ResumeOutcome};
use memberflow::domain::ports::SessionStore;
use memberflow::domain::transaction::{
    Amount, PaymentMethod, PaymentStatus, PendingTransaction, ReturnContext,
};
use memberflow::domain::workflow::WorkflowKind;
use memberflow::infrastructure::in_memory::InMemorySessionStore;
use memberflow::infrastructure::scripted::{
    ScriptedGateway, ScriptedMembershipApi, confirmation,
};
use rust_decimal_macros::dec;

fn pending() -> PendingTransaction {
    PendingTransaction {
        transaction_id: "tx-500".into(),
        subject_id: "m-42".into(),
        target_id: "evt-9".into(),
        amount: Amount::new(dec!(5000)).unwrap(),
        currency: "XPF".into(),
        method: PaymentMethod::Gateway,
        workflow: WorkflowKind::EventRegistration,
        created_at: Utc::now(),
        context: ReturnContext {
            event_title: Some("Congrès annuel".into()),
            event_date: Some("2026-10-03".into()),
            event_location: Some("Papeete".into()),
        },
    }
}

fn handler(
    store: &InMemorySessionStore,
    api: &ScriptedMembershipApi,
    gateway: &ScriptedGateway,
) -> ResumeHandler {
    ResumeHandler::new(
        Box::new(store.clone()),
        Box::new(api.clone()),
        Box::new(gateway.clone()),
    )
}

#[tokio::test]
async fn test_successful_confirmation_commits_and_clears_the_slot() {
    let store = InMemorySessionStore::new();
    store.set_pending_transaction(pending()).await.unwrap();
    let api = ScriptedMembershipApi::succeeding();
    let gateway = ScriptedGateway::with_redirect("unused")
        .with_confirmation(confirmation("0", "ORD-123"));

    let outcome = handler(&store, &api, &gateway).resume().await.unwrap();

    match outcome {
        ResumeOutcome::Confirmed { receipt } => {
            assert_eq!(receipt.order_number, "ORD-123");
            assert_eq!(receipt.event_title.as_deref(), Some("Congrès annuel"));
        }
        other => panic!("expected Confirmed, got {other:?}"),
    }

    let calls = api.registration_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].payment_status, PaymentStatus::Confirmed);
    assert_eq!(calls[0].idempotency_key, "tx-500");
    assert!(calls[0].bot_check_token.is_none());

    assert!(store.pending_transaction().await.unwrap().is_none());
}

#[tokio::test]
async fn test_declined_confirmation_keeps_the_pending_transaction() {
    let store = InMemorySessionStore::new();
    store.set_pending_transaction(pending()).await.unwrap();
    let api = ScriptedMembershipApi::succeeding();
    let gateway =
        ScriptedGateway::with_redirect("unused").with_confirmation(confirmation("1", "ORD-124"));

    let outcome = handler(&store, &api, &gateway).resume().await.unwrap();

    match outcome {
        ResumeOutcome::Failed { message } => assert!(message.contains("code 1")),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(api.total_commits(), 0);
    assert!(store.pending_transaction().await.unwrap().is_some());
}

#[tokio::test]
async fn test_confirmation_without_pending_transaction_is_ambiguous() {
    let store = InMemorySessionStore::new();
    let api = ScriptedMembershipApi::succeeding();
    let gateway =
        ScriptedGateway::with_redirect("unused").with_confirmation(confirmation("0", "ORD-125"));

    let outcome = handler(&store, &api, &gateway).resume().await.unwrap();

    assert_eq!(
        outcome,
        ResumeOutcome::Ambiguous {
            message: MSG_CONTACT_SUPPORT.into()
        }
    );
    assert_eq!(api.total_commits(), 0);
}

#[tokio::test]
async fn test_second_reconciliation_never_double_commits() {
    let store = InMemorySessionStore::new();
    store.set_pending_transaction(pending()).await.unwrap();
    let api = ScriptedMembershipApi::succeeding();
    let gateway =
        ScriptedGateway::with_redirect("unused").with_confirmation(confirmation("0", "ORD-126"));

    let first = handler(&store, &api, &gateway).resume().await.unwrap();
    assert!(matches!(first, ResumeOutcome::Confirmed { .. }));

    // Reload of the return page: fresh handler, same store, same payload.
    let second = handler(&store, &api, &gateway).resume().await.unwrap();
    assert!(matches!(second, ResumeOutcome::Ambiguous { .. }));
    assert_eq!(api.total_commits(), 1);
}

#[tokio::test]
async fn test_unreachable_confirmation_endpoint_is_ambiguous() {
    let store = InMemorySessionStore::new();
    store.set_pending_transaction(pending()).await.unwrap();
    let api = ScriptedMembershipApi::succeeding();
    let gateway = ScriptedGateway::with_redirect("unused").confirmation_unreachable();

    let outcome = handler(&store, &api, &gateway).resume().await.unwrap();

    assert!(matches!(outcome, ResumeOutcome::Ambiguous { .. }));
    assert_eq!(api.total_commits(), 0);
    assert!(store.pending_transaction().await.unwrap().is_some());
}

#[tokio::test]
async fn test_failed_deferred_commit_retains_pending_and_reports_ambiguous() {
    let store = InMemorySessionStore::new();
    store.set_pending_transaction(pending()).await.unwrap();
    let api = ScriptedMembershipApi::failing("base indisponible");
    let gateway =
        ScriptedGateway::with_redirect("unused").with_confirmation(confirmation("0", "ORD-127"));

    let outcome = handler(&store, &api, &gateway).resume().await.unwrap();

    // Payment may have been taken: neither confirmed nor failed.
    assert!(matches!(outcome, ResumeOutcome::Ambiguous { .. }));
    assert!(store.pending_transaction().await.unwrap().is_some());
}

#[tokio::test]
async fn test_deferred_enrollment_commits_through_the_enrollment_operation() {
    let store = InMemorySessionStore::new();
    let mut tx = pending();
    tx.workflow = WorkflowKind::MembershipEnrollment;
    store.set_pending_transaction(tx).await.unwrap();
    let api = ScriptedMembershipApi::succeeding();
    let gateway =
        ScriptedGateway::with_redirect("unused").with_confirmation(confirmation("0", "ORD-128"));

    handler(&store, &api, &gateway).resume().await.unwrap();

    assert_eq!(api.enrollment_calls().len(), 1);
    assert!(api.registration_calls().is_empty());
}
