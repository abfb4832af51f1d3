use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use organizer_actions::{
    actions_for_type, LedgerOutcome, MemoryRecordStore, Organizer, RecordStore,
};
use shared_types::{DuplicateGroup, IssueType, Severity};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::prelude::*;

mod config;
mod state;

use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "contacts-organizer", author, version, about = "Find duplicate contacts, fix incomplete ones, undo anything", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    log_file_path: Option<String>,

    /// Contacts JSON file (overrides the config file)
    #[arg(long, value_name = "PATH", global = true)]
    contacts: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score every contact and report the health summary
    Analyze {
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List probable duplicate groups
    Duplicates,
    /// Show the merge plan for a duplicate group
    Plan {
        /// Group number as listed by `duplicates`
        group: usize,
    },
    /// Merge a duplicate group into its most complete contact
    Merge {
        /// Group number as listed by `duplicates`
        group: usize,
    },
    /// List the fixes offered for an issue type
    Actions {
        contact: String,
        issue_type: IssueType,
    },
    /// Apply one fix to one contact
    Fix {
        contact: String,
        issue_type: IssueType,
        /// Action number as listed by `actions`
        action: usize,
        #[arg(long)]
        value: Option<String>,
    },
    /// Apply one fix to every contact with the given issue
    Bulk {
        issue_type: IssueType,
        action: usize,
        #[arg(long)]
        value: Option<String>,
    },
    /// Undo the most recent change
    Undo,
    /// Redo the most recently undone change
    Redo,
    /// List changes that can be undone
    History,
}

struct Session {
    store: Arc<MemoryRecordStore>,
    organizer: Organizer,
    contacts_path: PathBuf,
    history_path: PathBuf,
}

impl Session {
    fn open(config: &AppConfig, contacts_flag: Option<&Path>) -> Result<Self> {
        let contacts_path = config.contacts_path(contacts_flag);
        let history_path = config.history_path(&contacts_path);

        let contacts = state::load_contacts(&contacts_path)?;
        let ledger = state::load_history(&history_path)?;
        tracing::info!(
            contacts = contacts.records.len(),
            history = ledger.history().len(),
            "Loaded {:?}",
            contacts_path
        );

        let store = Arc::new(MemoryRecordStore::from_state(contacts));
        let organizer = Organizer::with_ledger(store.clone(), config.organizer(), ledger);

        Ok(Self {
            store,
            organizer,
            contacts_path,
            history_path,
        })
    }

    async fn save(&self) -> Result<()> {
        state::save_contacts(&self.contacts_path, &self.store.snapshot().await)?;
        state::save_history(&self.history_path, &self.organizer.ledger_snapshot().await)?;
        Ok(())
    }

    async fn duplicate_group(&self, number: usize) -> Result<DuplicateGroup> {
        let snapshot = self.organizer.refresh_analysis().await?;
        number
            .checked_sub(1)
            .and_then(|index| snapshot.report.duplicates.get(index))
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "No duplicate group {}; there are {}",
                    number,
                    snapshot.report.duplicates.len()
                )
            })
    }
}

fn init_tracing(log_file_path: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("contacts-organizer.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file_path.as_deref());

    let (config, config_path) =
        AppConfig::load(cli.config.as_deref()).context("Failed to load organizer config")?;
    tracing::debug!("Using config at {:?}", config_path);

    let session = Session::open(&config, cli.contacts.as_deref())?;

    match cli.command {
        Command::Analyze { json } => analyze(&session, json).await,
        Command::Duplicates => duplicates(&session).await,
        Command::Plan { group } => {
            let group = session.duplicate_group(group).await?;
            let plan = analyzers::build_plan(&group)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(())
        }
        Command::Merge { group } => {
            let group = session.duplicate_group(group).await?;
            let entry = session.organizer.merge_group(&group).await?;
            session.save().await?;
            println!("{}", entry.description);
            Ok(())
        }
        Command::Actions {
            contact,
            issue_type,
        } => {
            println!("Fixes for {} ({}):", contact, issue_type.label());
            for (number, action) in actions_for_type(issue_type).iter().enumerate() {
                match &action.input_prompt {
                    Some(prompt) => println!("  {}. {} [needs {}]", number + 1, action.title, prompt),
                    None => println!("  {}. {}", number + 1, action.title),
                }
            }
            Ok(())
        }
        Command::Fix {
            contact,
            issue_type,
            action,
            value,
        } => fix(&session, &contact, issue_type, action, value.as_deref()).await,
        Command::Bulk {
            issue_type,
            action,
            value,
        } => bulk(&session, issue_type, action, value.as_deref()).await,
        Command::Undo => {
            let outcome = session.organizer.undo().await;
            // A failed undo still drops the entry, so the history changed either way.
            session.save().await?;
            report_ledger_outcome(outcome?);
            Ok(())
        }
        Command::Redo => {
            let outcome = session.organizer.redo().await;
            session.save().await?;
            report_ledger_outcome(outcome?);
            Ok(())
        }
        Command::History => {
            let history = session.organizer.history().await;
            if history.is_empty() {
                println!("Nothing to undo");
            }
            for entry in history.iter().rev() {
                let when = chrono::DateTime::from_timestamp(entry.registered_at, 0)
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                println!("#{:<4} {}  {}", entry.sequence, when, entry.description);
            }
            if session.organizer.can_redo().await {
                println!("(redo available)");
            }
            Ok(())
        }
    }
}

async fn analyze(session: &Session, json: bool) -> Result<()> {
    let snapshot = session.organizer.refresh_analysis().await?;
    let report = &snapshot.report;

    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{} contacts, health score {:.1}",
        report.record_count, report.summary.health_score
    );
    for severity in [
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Suggestion,
    ] {
        println!("  {:?}: {}", severity, report.summary.count(severity));
    }
    println!("  Duplicate groups: {}", report.duplicates.len());

    for issue in &report.issues {
        println!(
            "[{:?}] {} ({}): {}",
            issue.severity, issue.contact_name, issue.contact_id, issue.description
        );
    }
    Ok(())
}

async fn duplicates(session: &Session) -> Result<()> {
    let snapshot = session.organizer.refresh_analysis().await?;
    if snapshot.report.duplicates.is_empty() {
        println!("No duplicates found");
    }
    for (number, group) in snapshot.report.duplicates.iter().enumerate() {
        let names: Vec<&str> = group
            .records
            .iter()
            .map(|r| r.display_name.as_str())
            .collect();
        println!(
            "{}. {} ({:.0}%): {}",
            number + 1,
            group.match_type.label(),
            group.confidence * 100.0,
            names.join(", ")
        );
    }
    Ok(())
}

async fn fix(
    session: &Session,
    contact_id: &str,
    issue_type: IssueType,
    action_number: usize,
    value: Option<&str>,
) -> Result<()> {
    let record = session
        .store
        .fetch_record(contact_id)
        .await?
        .ok_or_else(|| anyhow!("Contact {} not found", contact_id))?;
    let issue = session
        .organizer
        .scorer()
        .inspect(&record)
        .into_iter()
        .find(|issue| issue.issue_type == issue_type)
        .ok_or_else(|| anyhow!("Contact {} has no {} issue", contact_id, issue_type.label()))?;
    let action = pick_action(issue_type, action_number)?;

    let entry = session.organizer.apply_action(&action, &issue, value).await?;
    session.save().await?;
    println!("{}", entry.description);
    Ok(())
}

async fn bulk(
    session: &Session,
    issue_type: IssueType,
    action_number: usize,
    value: Option<&str>,
) -> Result<()> {
    let action = pick_action(issue_type, action_number)?;
    let snapshot = session.organizer.refresh_analysis().await?;
    let targets: Vec<_> = snapshot
        .report
        .issues
        .iter()
        .filter(|issue| issue.issue_type == issue_type)
        .cloned()
        .collect();

    let outcome = session.organizer.apply_bulk(&action, &targets, value).await;
    session.save().await?;

    println!(
        "{}: {} of {} applied",
        action.title, outcome.succeeded, outcome.attempted
    );
    for failure in &outcome.failures {
        println!("  {} failed: {}", failure.contact_id, failure.error);
    }
    Ok(())
}

fn pick_action(
    issue_type: IssueType,
    number: usize,
) -> Result<shared_types::HealthIssueAction> {
    let actions = actions_for_type(issue_type);
    if number == 0 || number > actions.len() {
        bail!(
            "{} offers actions 1 to {}, not {}",
            issue_type.label(),
            actions.len(),
            number
        );
    }
    Ok(actions[number - 1].clone())
}

fn report_ledger_outcome(outcome: LedgerOutcome) {
    println!("{}", outcome.message());
}
