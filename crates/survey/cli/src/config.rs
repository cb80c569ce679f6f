//! CLI configuration

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use survey_registry::RegistryConfig;

const DEFAULT_STATE_FILE: &str = "survey-ledger.json";
const DEFAULT_ADMIN: &str = "deployer";
const DEFAULT_VAULT_ADDRESS: &str = "reward-escrow";
const DEFAULT_REGISTRY_ADDRESS: &str = "survey-processor";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Ledger state file
    pub state_path: Option<PathBuf>,

    /// Vault administrator used by `init`
    pub admin: Option<String>,

    pub vault_address: Option<String>,

    pub registry_address: Option<String>,

    /// Policies applied when a ledger is initialized
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl CliConfig {
    /// Load configuration from file
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_config_path() {
                Some(p) => p,
                None => return Ok(CliConfig::default()),
            },
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            toml::from_str(&contents).map_err(|e| CliError::Config(e.to_string()))
        } else {
            Ok(CliConfig::default())
        }
    }

    /// `--state` wins over the configured path, which wins over the default.
    pub fn state_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.state_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
    }

    pub fn admin(&self) -> &str {
        self.admin.as_deref().unwrap_or(DEFAULT_ADMIN)
    }

    pub fn vault_address(&self) -> &str {
        self.vault_address.as_deref().unwrap_or(DEFAULT_VAULT_ADDRESS)
    }

    pub fn registry_address(&self) -> &str {
        self.registry_address
            .as_deref()
            .unwrap_or(DEFAULT_REGISTRY_ADDRESS)
    }

    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("surveyctl").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_registry::{ExcessPaymentPolicy, RefundGate, RespondentPayout};

    #[test]
    fn test_load_missing_config() {
        let config = CliConfig::load(Some(Path::new("/nonexistent/path/config.toml"))).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.admin(), "deployer");
        assert_eq!(config.registry, RegistryConfig::default());
    }

    #[test]
    fn test_state_path_precedence() {
        let mut config = CliConfig::default();
        assert_eq!(config.state_path(None), PathBuf::from("survey-ledger.json"));

        config.state_path = Some(PathBuf::from("configured.json"));
        assert_eq!(config.state_path(None), PathBuf::from("configured.json"));
        assert_eq!(
            config.state_path(Some(Path::new("flag.json"))),
            PathBuf::from("flag.json")
        );
    }

    #[test]
    fn test_registry_table_parses() {
        let config: CliConfig = toml::from_str(
            r#"
            admin = "0xadmin"

            [registry]
            excess_payment = "retain"
            refund_gate = "after_deadline"
            "#,
        )
        .unwrap();

        assert_eq!(config.admin(), "0xadmin");
        assert_eq!(config.registry.excess_payment, ExcessPaymentPolicy::Retain);
        assert_eq!(config.registry.refund_gate, RefundGate::AfterDeadline);
        assert_eq!(config.registry.respondent_payout, RespondentPayout::Deferred);
    }

    #[test]
    fn test_malformed_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[registry]\nrefund_gate = \"sometimes\"\n").unwrap();

        let err = CliConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
