use clap::Parser;
use memberflow::application::checkout::{CheckoutOutcome, CheckoutResolver};
use memberflow::application::engine::{CompletionOutcome, PaymentOptions, WorkflowEngine};
use memberflow::application::resume::{ResumeHandler, ResumeOutcome};
use memberflow::domain::ports::{CommitResponse, SessionStore};
use memberflow::domain::transaction::{Amount, ReturnContext};
use memberflow::domain::wizard::AdvanceOutcome;
use memberflow::infrastructure::in_memory::InMemorySessionStore;
use memberflow::infrastructure::scripted::{
    RecordingNavigator, ScriptedGateway, ScriptedMembershipApi,
};
use memberflow::interfaces::json::scenario_reader::{Scenario, ScenarioReader};
use miette::{IntoDiagnostic, Result, miette};
use std::fs::File;
use std::path::PathBuf;

const RETURN_URL: &str = "https://app.example/paiement/retour";
const CANCEL_URL: &str = "https://app.example/paiement/annulation";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario JSON file driving the engine and its collaborators
    scenario: PathBuf,

    /// Path to a persistent session database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Reconcile a previous run's pending transaction instead of opening a wizard
    #[arg(long)]
    resume: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let file = File::open(&cli.scenario).into_diagnostic()?;
    let scenario = ScenarioReader::new(file).scenario().into_diagnostic()?;

    if let Some(path) = cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            let store = memberflow::infrastructure::rocksdb::RocksDbSessionStore::open(&path)
                .into_diagnostic()?;
            return run(store, scenario, cli.resume).await;
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        {
            let _ = path;
            return Err(miette!(
                "--db-path requires building with --features storage-rocksdb"
            ));
        }
    }
    run(InMemorySessionStore::new(), scenario, cli.resume).await
}

async fn run<S>(store: S, scenario: Scenario, resume: bool) -> Result<()>
where
    S: SessionStore + Clone + 'static,
{
    let api = ScriptedMembershipApi::with_response(CommitResponse {
        success: scenario.api.commit_success,
        message: scenario.api.message.clone(),
        receipt: None,
    });
    let gateway = match &scenario.gateway.redirect_url {
        Some(url) => ScriptedGateway::with_redirect(url),
        None => ScriptedGateway::initiation_failing(
            scenario
                .gateway
                .initiation_error
                .as_deref()
                .unwrap_or("no redirect URL configured"),
        ),
    };
    let gateway = match &scenario.gateway.confirmation {
        Some(confirmation) => gateway.with_confirmation(confirmation.clone()),
        None => gateway,
    };

    if resume {
        run_resume(store, api, gateway).await
    } else {
        run_wizard(store, scenario, api, gateway).await
    }
}

async fn run_wizard<S>(
    store: S,
    scenario: Scenario,
    api: ScriptedMembershipApi,
    gateway: ScriptedGateway,
) -> Result<()>
where
    S: SessionStore + Clone + 'static,
{
    store
        .set_auth_session(scenario.auth.clone())
        .await
        .into_diagnostic()?;

    let resolver = CheckoutResolver::new(
        Box::new(store.clone()),
        Box::new(api),
        Box::new(gateway),
        Box::new(RecordingNavigator::new()),
    );
    let engine = WorkflowEngine::new(resolver);
    engine.open(scenario.workflow).await;

    let mut ready = false;
    for step in &scenario.steps {
        for (field, value) in &step.fields {
            engine.set_field(field, value).await.into_diagnostic()?;
        }
        match engine.advance().await.into_diagnostic()? {
            AdvanceOutcome::Rejected(errors) => {
                for (field, message) in &errors {
                    eprintln!("{field}: {message}");
                }
                return Err(miette!("step validation failed"));
            }
            AdvanceOutcome::Advanced => {}
            AdvanceOutcome::ReadyToComplete => {
                ready = true;
                break;
            }
        }
    }
    if !ready {
        return Err(miette!("scenario ended before the wizard's last step"));
    }

    let options = PaymentOptions {
        method: scenario.payment.method,
        amount: Amount::new(scenario.payment.amount).into_diagnostic()?,
        currency: scenario.payment.currency.clone(),
        target_id: scenario.payment.target_id.clone(),
        bot_check_token: scenario.bot_check_token.clone(),
        secure_transport: scenario.secure_transport,
        return_url: RETURN_URL.to_string(),
        cancel_url: CANCEL_URL.to_string(),
        context: ReturnContext {
            event_title: scenario.payment.event_title.clone(),
            event_date: scenario.payment.event_date.clone(),
            event_location: scenario.payment.event_location.clone(),
        },
        replace_pending: scenario.payment.replace_pending,
    };

    match engine.complete(options).await.into_diagnostic()? {
        CompletionOutcome::Resolved(CheckoutOutcome::Completed { .. }) => {
            println!("registration committed (paymentStatus=pending)");
        }
        CompletionOutcome::Resolved(CheckoutOutcome::RedirectIssued { redirect_url }) => {
            if let Some(pending) = store.pending_transaction().await.into_diagnostic()? {
                println!("pending transaction {} stored", pending.transaction_id);
            }
            println!("redirecting to {redirect_url}");
        }
        CompletionOutcome::Resolved(CheckoutOutcome::PendingConflict { existing }) => {
            println!(
                "pending transaction {} already in progress",
                existing.transaction_id
            );
        }
        CompletionOutcome::DiscardedStale => {
            println!("stale completion discarded");
        }
    }
    Ok(())
}

async fn run_resume<S>(store: S, api: ScriptedMembershipApi, gateway: ScriptedGateway) -> Result<()>
where
    S: SessionStore + Clone + 'static,
{
    let handler = ResumeHandler::new(Box::new(store), Box::new(api), Box::new(gateway));
    match handler.resume().await.into_diagnostic()? {
        ResumeOutcome::Confirmed { receipt } => {
            println!("payment confirmed: order {}", receipt.order_number);
            if let Some(title) = receipt.event_title {
                println!("event: {title}");
            }
        }
        ResumeOutcome::Failed { message } => {
            println!("payment failed: {message}");
        }
        ResumeOutcome::Ambiguous { message } => {
            println!("{message}");
        }
    }
    Ok(())
}
