//! Ledger state file
//!
//! The whole ledger is stored as one JSON [`LedgerSnapshot`]. Writes go to a
//! sibling temp file first and are renamed into place.

use crate::error::{CliError, CliResult};
use std::path::{Path, PathBuf};
use survey_escrow::EscrowVault;
use survey_registry::{LedgerSnapshot, SurveyRegistry};
use tracing::debug;

pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> CliResult<SurveyRegistry<EscrowVault>> {
        if !self.exists() {
            return Err(CliError::StateMissing(self.path.clone()));
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let snapshot: LedgerSnapshot = serde_json::from_str(&contents)?;
        debug!(path = %self.path.display(), surveys = snapshot.surveys.len(), "Loaded ledger state");
        Ok(SurveyRegistry::<EscrowVault>::from_snapshot(snapshot)?)
    }

    pub fn save(&self, registry: &SurveyRegistry<EscrowVault>) -> CliResult<()> {
        let snapshot = registry.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), surveys = snapshot.surveys.len(), "Saved ledger state");
        Ok(())
    }
}
