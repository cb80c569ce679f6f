//! CLI error types

use std::path::PathBuf;
use survey_types::LedgerError;
use thiserror::Error;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Ledger error [{code}]: {0}", code = .0.code())]
    Ledger(#[from] LedgerError),

    #[error("State file already exists: {} (use --force to overwrite)", .0.display())]
    StateExists(PathBuf),

    #[error("No ledger state at {} (run `surveyctl init` first)", .0.display())]
    StateMissing(PathBuf),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use survey_types::{Address, Amount, LedgerResult};

    #[test]
    fn test_ledger_error_converts_and_shows_code() {
        fn reject() -> CliResult<()> {
            let outcome: LedgerResult<()> = Err(LedgerError::InsufficientPayment {
                required: Amount::new(1_000),
                attached: Amount::new(10),
            });
            outcome?;
            Ok(())
        }

        let err = reject().unwrap_err();
        assert!(matches!(err, CliError::Ledger(_)));
        assert!(err.to_string().starts_with("Ledger error [InsufficientPayment]: "));

        let err = CliError::from(LedgerError::UnauthorizedCaller(Address::new("mallory")));
        assert!(err.to_string().contains("[UnauthorizedCaller]"));
        assert!(err.to_string().contains("mallory"));
    }
}
