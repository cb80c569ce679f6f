//! Output formatting for CLI

use crate::error::CliResult;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use survey_types::{LedgerEvent, TxReceipt};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Print a serializable value in a machine format. Returns `false` for
/// `Table`, leaving human rendering to the caller.
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> CliResult<bool> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(value)?);
            Ok(true)
        }
        OutputFormat::Table => Ok(false),
    }
}

pub fn print_receipt(receipt: &TxReceipt, format: OutputFormat) -> CliResult<()> {
    if print_structured(receipt, format)? {
        return Ok(());
    }

    println!("{}", "Events".bold().cyan());
    for (index, event) in receipt.events.iter().enumerate() {
        println!(
            "  {} {} {}",
            format!("#{}", index + 1).yellow(),
            event.name().bold(),
            describe(event).dimmed()
        );
    }
    if !receipt.transfers.is_empty() {
        println!("{}", "Transfers".bold().cyan());
        for transfer in &receipt.transfers {
            println!(
                "  {} -> {}  {}",
                transfer.from,
                transfer.to,
                transfer.amount.to_string().green()
            );
        }
    }
    Ok(())
}

fn describe(event: &LedgerEvent) -> String {
    match event {
        LedgerEvent::RewardPoolInfoSet {
            survey_id,
            total_pool,
            reward_per_response,
        } => format!("{survey_id} pool={total_pool} reward={reward_per_response}"),
        LedgerEvent::RewardTransferredToEscrow { survey_id, amount } => {
            format!("{survey_id} amount={amount}")
        }
        LedgerEvent::SurveyRegistered { owner, survey_id }
        | LedgerEvent::SurveyRemoved { owner, survey_id } => {
            format!("{survey_id} owner={owner}")
        }
        LedgerEvent::ResponseSubmitted {
            respondent,
            survey_id,
            response_count,
        } => format!("{survey_id} respondent={respondent} count={response_count}"),
        LedgerEvent::ResponseAlreadyExists {
            respondent,
            survey_id,
        } => format!("{survey_id} respondent={respondent}"),
        LedgerEvent::ResponseRewardPaid {
            survey_id,
            respondent,
            amount,
        } => format!("{survey_id} respondent={respondent} amount={amount}"),
        LedgerEvent::RemainderReturned {
            survey_id,
            recipient,
            amount,
        } => format!("{survey_id} recipient={recipient} amount={amount}"),
    }
}
