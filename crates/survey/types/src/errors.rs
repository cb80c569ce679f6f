//! Error types for the survey reward ledger

use crate::{Address, Amount, SurveyId, Timestamp};

/// Errors that abort a ledger operation. Any failure rolls back every write
/// the operation had already made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Insufficient payment: required {required}, attached {attached}")]
    InsufficientPayment { required: Amount, attached: Amount },

    #[error("Survey id already registered: {0}")]
    DuplicateSurveyId(SurveyId),

    #[error(
        "Invalid reward configuration: reward per response {reward_per_response}, total pool {total_pool}"
    )]
    InvalidRewardConfiguration {
        total_pool: Amount,
        reward_per_response: Amount,
    },

    #[error("Survey not found: {0}")]
    SurveyNotFound(SurveyId),

    #[error("Survey {survey_id} closed at {closing_deadline}")]
    SurveyClosed {
        survey_id: SurveyId,
        closing_deadline: Timestamp,
    },

    #[error("Survey owner cannot respond to own survey: {0}")]
    OwnerCannotRespond(SurveyId),

    #[error("Reward pool exhausted for survey {survey_id} after {response_count} responses")]
    PoolExhausted {
        survey_id: SurveyId,
        response_count: u64,
    },

    #[error("Unauthorized caller: {0}")]
    UnauthorizedCaller(Address),

    #[error("Insufficient vault balance: requested {requested}, available {available}")]
    InsufficientVaultBalance { requested: Amount, available: Amount },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Amount),

    #[error("Survey {survey_id} is open until {closing_deadline}")]
    SurveyStillOpen {
        survey_id: SurveyId,
        closing_deadline: Timestamp,
    },

    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

impl LedgerError {
    /// Stable machine-readable kind, for callers that key their own messages.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientPayment { .. } => "InsufficientPayment",
            Self::DuplicateSurveyId(_) => "DuplicateSurveyId",
            Self::InvalidRewardConfiguration { .. } => "InvalidRewardConfiguration",
            Self::SurveyNotFound(_) => "SurveyNotFound",
            Self::SurveyClosed { .. } => "SurveyClosed",
            Self::OwnerCannotRespond(_) => "OwnerCannotRespond",
            Self::PoolExhausted { .. } => "PoolExhausted",
            Self::UnauthorizedCaller(_) => "UnauthorizedCaller",
            Self::InsufficientVaultBalance { .. } => "InsufficientVaultBalance",
            Self::InvalidAmount(_) => "InvalidAmount",
            Self::SurveyStillOpen { .. } => "SurveyStillOpen",
            Self::ArithmeticOverflow(_) => "ArithmeticOverflow",
            Self::CorruptSnapshot(_) => "CorruptSnapshot",
        }
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
