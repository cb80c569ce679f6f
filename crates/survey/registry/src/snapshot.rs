//! Point-in-time capture of a registry and its vault
//!
//! Snapshots let an operator persist the ledger between runs. Restoring
//! re-checks the accounting rather than trusting the stored data: every
//! record must satisfy the pool invariant and the vault must still hold
//! every outstanding remainder.

use crate::config::RegistryConfig;
use crate::registry::SurveyRegistry;
use crate::store::SurveyTable;
use crate::transaction::RegistryState;
use serde::{Deserialize, Serialize};
use survey_escrow::EscrowVault;
use survey_types::{Address, Amount, Escrow, LedgerError, LedgerResult, SurveyRecord};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub registry_address: Address,
    pub config: RegistryConfig,
    pub surveys: Vec<SurveyRecord>,
    pub retained_excess: Amount,
    pub escrow: EscrowVault,
}

impl SurveyRegistry<EscrowVault> {
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            registry_address: self.address().clone(),
            config: *self.config(),
            surveys: self.surveys().iter().cloned().collect(),
            retained_excess: self.retained_excess(),
            escrow: self.escrow().clone(),
        }
    }

    /// Rebuild a registry from a snapshot, verifying its accounting.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> LedgerResult<Self> {
        let mut surveys = SurveyTable::new();
        let mut outstanding = Amount::zero();

        for record in snapshot.surveys {
            if !record.invariant_holds() {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "survey {} violates its pool invariant",
                    record.id
                )));
            }
            outstanding = outstanding
                .checked_add(record.remainder()?)
                .ok_or(LedgerError::ArithmeticOverflow("outstanding remainders"))?;
            let id = record.id.clone();
            if surveys.insert(record).is_some() {
                return Err(LedgerError::CorruptSnapshot(format!(
                    "survey {} appears more than once",
                    id
                )));
            }
        }

        if snapshot.escrow.balance() < outstanding {
            return Err(LedgerError::CorruptSnapshot(format!(
                "vault balance {} does not cover outstanding remainders {}",
                snapshot.escrow.balance(),
                outstanding
            )));
        }

        info!(
            registry = %snapshot.registry_address,
            surveys = surveys.len(),
            vault_balance = snapshot.escrow.balance().0,
            "Ledger restored from snapshot"
        );

        Ok(Self::from_parts(
            snapshot.registry_address,
            snapshot.escrow,
            snapshot.config,
            RegistryState {
                surveys,
                retained_excess: snapshot.retained_excess,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegisterSurvey;
    use survey_types::{CallContext, SurveyId};

    fn ledger() -> SurveyRegistry {
        let admin = Address::new("deployer");
        let registry_address = Address::new("survey-processor");
        let mut vault = EscrowVault::new(Address::new("reward-escrow"), admin.clone());
        vault.set_agent(&admin, registry_address.clone()).unwrap();
        let mut registry = SurveyRegistry::new(registry_address, vault, RegistryConfig::default());

        let creator = Address::new("company-a");
        registry
            .register_survey(
                &CallContext::new(creator).with_value(Amount::new(1_000)),
                RegisterSurvey::new(SurveyId::new("s-1"), Amount::new(1_000), Amount::new(100), 100),
            )
            .unwrap();
        registry
            .answer_survey(
                &CallContext::new(Address::new("taker")).at(50),
                &SurveyId::new("s-1"),
                "ipfs://response",
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_snapshot_restores_identical_ledger() {
        let registry = ledger();
        let snapshot = registry.snapshot();

        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        let restored = SurveyRegistry::<EscrowVault>::from_snapshot(decoded).unwrap();

        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.response_count(&SurveyId::new("s-1")).unwrap(), 1);
        assert_eq!(restored.escrow().balance(), Amount::new(1_000));
    }

    #[test]
    fn test_tampered_response_count_rejected() {
        let mut snapshot = ledger().snapshot();
        snapshot.surveys[0].response_count = 50;

        let result = SurveyRegistry::<EscrowVault>::from_snapshot(snapshot);
        assert!(matches!(result, Err(LedgerError::CorruptSnapshot(_))));
    }

    #[test]
    fn test_underfunded_vault_rejected() {
        let snapshot = ledger().snapshot();
        let mut json = serde_json::to_value(&snapshot).unwrap();
        json["escrow"]["balance"] = serde_json::json!(10);
        let tampered: LedgerSnapshot = serde_json::from_value(json).unwrap();

        let result = SurveyRegistry::<EscrowVault>::from_snapshot(tampered);
        assert!(matches!(result, Err(LedgerError::CorruptSnapshot(_))));
    }

    #[test]
    fn test_duplicate_records_rejected() {
        let mut snapshot = ledger().snapshot();
        let duplicate = snapshot.surveys[0].clone();
        snapshot.surveys.push(duplicate);

        let result = SurveyRegistry::<EscrowVault>::from_snapshot(snapshot);
        assert!(matches!(result, Err(LedgerError::CorruptSnapshot(_))));
    }
}
