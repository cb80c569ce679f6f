//! Ledger commands

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{self, OutputFormat};
use crate::state::StateFile;
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use survey_escrow::EscrowVault;
use survey_registry::{RegisterSurvey, SurveyRegistry};
use survey_types::{
    Address, Amount, CallContext, Escrow, SurveyId, SurveyRecord, Timestamp,
};
use tracing::info;

#[derive(Subcommand)]
pub enum LedgerCommands {
    /// Create a fresh ledger: vault, registry, and the agent link between them
    Init {
        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Register a survey and fund its reward pool
    Register(RegisterArgs),

    /// Submit a response to an open survey
    Answer(AnswerArgs),

    /// Close a survey and return its unspent pool to the owner
    Refund(RefundArgs),

    /// Re-point the vault's agent (admin only)
    SetAgent {
        /// Calling address; must be the vault admin
        #[arg(long)]
        from: String,

        /// New agent address
        agent: String,
    },

    /// Show one survey
    Show {
        /// Survey ID
        id: String,
    },

    /// Show vault balance and every registered survey
    Status,
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Survey owner
    #[arg(long)]
    pub from: String,

    /// Survey ID (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Total reward pool
    #[arg(long)]
    pub pool: u64,

    /// Reward per accepted response
    #[arg(long)]
    pub reward: u64,

    /// Closing deadline (unix seconds)
    #[arg(long)]
    pub deadline: Timestamp,

    /// Attached value (defaults to the pool)
    #[arg(long)]
    pub value: Option<u64>,

    /// Call time (defaults to now)
    #[arg(long)]
    pub at: Option<Timestamp>,
}

#[derive(Args)]
pub struct AnswerArgs {
    /// Respondent
    #[arg(long)]
    pub from: String,

    /// Survey ID
    pub id: String,

    /// Where the response content lives
    #[arg(long)]
    pub locator: String,

    /// Call time (defaults to now)
    #[arg(long)]
    pub at: Option<Timestamp>,
}

#[derive(Args)]
pub struct RefundArgs {
    /// Survey owner
    #[arg(long)]
    pub from: String,

    /// Survey ID
    pub id: String,

    /// Call time (defaults to now)
    #[arg(long)]
    pub at: Option<Timestamp>,
}

/// Serializable view of one survey.
#[derive(Serialize)]
struct SurveyView<'a> {
    id: &'a SurveyId,
    owner: &'a Address,
    closing_deadline: Timestamp,
    open: bool,
    total_pool: Amount,
    reward_per_response: Amount,
    response_count: u64,
    max_responses: u64,
    remaining: Amount,
    respondents: Vec<&'a Address>,
}

impl<'a> SurveyView<'a> {
    fn new(record: &'a SurveyRecord, now: Timestamp) -> CliResult<Self> {
        Ok(Self {
            id: &record.id,
            owner: &record.owner,
            closing_deadline: record.closing_deadline,
            open: record.is_open(now),
            total_pool: record.pool.total_pool,
            reward_per_response: record.pool.reward_per_response,
            response_count: record.response_count,
            max_responses: record.pool.max_responses(),
            remaining: record.remainder()?,
            respondents: record.respondents.keys().collect(),
        })
    }
}

#[derive(Serialize)]
struct StatusView<'a> {
    registry: &'a Address,
    vault: &'a Address,
    vault_admin: &'a Address,
    vault_agent: Option<&'a Address>,
    vault_balance: Amount,
    retained_excess: Amount,
    surveys: Vec<SurveyView<'a>>,
}

/// Execute a ledger command
pub fn execute(
    command: LedgerCommands,
    config: &CliConfig,
    state: &StateFile,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        LedgerCommands::Init { force } => init(config, state, force, format),
        LedgerCommands::Register(args) => {
            let mut registry = state.load()?;
            let request = RegisterSurvey::new(
                args.id.map(SurveyId::new).unwrap_or_else(SurveyId::generate),
                Amount::new(args.pool),
                Amount::new(args.reward),
                args.deadline,
            );
            let call = CallContext::new(Address::new(args.from))
                .with_value(Amount::new(args.value.unwrap_or(args.pool)))
                .at(args.at.unwrap_or_else(now));
            let receipt = registry.register_survey(&call, request)?;
            state.save(&registry)?;
            output::print_receipt(&receipt, format)
        }
        LedgerCommands::Answer(args) => {
            let mut registry = state.load()?;
            let call = CallContext::new(Address::new(args.from)).at(args.at.unwrap_or_else(now));
            let receipt = registry.answer_survey(&call, &SurveyId::new(args.id), &args.locator)?;
            state.save(&registry)?;
            output::print_receipt(&receipt, format)
        }
        LedgerCommands::Refund(args) => {
            let mut registry = state.load()?;
            let call = CallContext::new(Address::new(args.from)).at(args.at.unwrap_or_else(now));
            let receipt = registry.refund_on_survey_closed(&call, &SurveyId::new(args.id))?;
            state.save(&registry)?;
            output::print_receipt(&receipt, format)
        }
        LedgerCommands::SetAgent { from, agent } => {
            let mut registry = state.load()?;
            let agent = Address::new(agent);
            registry.set_escrow_agent(&Address::new(from), agent.clone())?;
            state.save(&registry)?;
            if !output::print_structured(&serde_json::json!({ "agent": agent }), format)? {
                println!("{} vault agent is now {}", "✓".green(), agent.to_string().bold());
            }
            Ok(())
        }
        LedgerCommands::Show { id } => {
            let registry = state.load()?;
            let record = registry.survey(&SurveyId::new(id))?;
            let view = SurveyView::new(record, now())?;
            if !output::print_structured(&view, format)? {
                print_survey(&view);
            }
            Ok(())
        }
        LedgerCommands::Status => {
            let registry = state.load()?;
            status(&registry, format)
        }
    }
}

fn init(config: &CliConfig, state: &StateFile, force: bool, format: OutputFormat) -> CliResult<()> {
    if state.exists() && !force {
        return Err(CliError::StateExists(state.path().to_path_buf()));
    }

    let admin = Address::new(config.admin());
    let registry_address = Address::new(config.registry_address());
    let mut vault = EscrowVault::new(Address::new(config.vault_address()), admin.clone());
    vault.set_agent(&admin, registry_address.clone())?;

    let registry = SurveyRegistry::new(registry_address, vault, config.registry);
    state.save(&registry)?;
    info!(path = %state.path().display(), "Initialized survey ledger");

    status(&registry, format)
}

fn status(registry: &SurveyRegistry<EscrowVault>, format: OutputFormat) -> CliResult<()> {
    let at = now();
    let surveys = registry
        .surveys()
        .iter()
        .map(|record| SurveyView::new(record, at))
        .collect::<CliResult<Vec<_>>>()?;
    let view = StatusView {
        registry: registry.address(),
        vault: registry.escrow_address(),
        vault_admin: registry.escrow().admin(),
        vault_agent: registry.escrow().agent(),
        vault_balance: registry.escrow().balance(),
        retained_excess: registry.retained_excess(),
        surveys,
    };

    if output::print_structured(&view, format)? {
        return Ok(());
    }

    println!("{}", "Survey Ledger".bold().cyan());
    println!("  Registry:        {}", view.registry);
    println!("  Vault:           {}", view.vault);
    println!("  Vault admin:     {}", view.vault_admin);
    match view.vault_agent {
        Some(agent) => println!("  Vault agent:     {}", agent),
        None => println!("  Vault agent:     {}", "unset".red()),
    }
    println!("  Vault balance:   {}", view.vault_balance.to_string().green());
    println!("  Retained excess: {}", view.retained_excess);
    println!();
    if view.surveys.is_empty() {
        println!("{}", "No surveys registered".dimmed());
    }
    for survey in &view.surveys {
        print_survey(survey);
    }
    Ok(())
}

fn print_survey(view: &SurveyView<'_>) {
    let state = if view.open {
        "open".green()
    } else {
        "closed".yellow()
    };
    println!("{} [{}]", view.id.to_string().bold(), state);
    println!("  Owner:     {}", view.owner);
    println!("  Deadline:  {}", view.closing_deadline);
    println!(
        "  Pool:      {} ({} per response)",
        view.total_pool, view.reward_per_response
    );
    println!("  Responses: {} of {}", view.response_count, view.max_responses);
    println!("  Remaining: {}", view.remaining.to_string().green());
}

fn now() -> Timestamp {
    chrono::Utc::now().timestamp()
}
