//! Domain events, value transfers and per-operation receipts

use crate::{Address, Amount, SurveyId};
use serde::{Deserialize, Serialize};

/// Events emitted by ledger operations, in emission order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    RewardPoolInfoSet {
        survey_id: SurveyId,
        total_pool: Amount,
        reward_per_response: Amount,
    },
    RewardTransferredToEscrow {
        survey_id: SurveyId,
        amount: Amount,
    },
    SurveyRegistered {
        owner: Address,
        survey_id: SurveyId,
    },
    ResponseSubmitted {
        respondent: Address,
        survey_id: SurveyId,
        response_count: u64,
    },
    /// Informational: a repeat response was ignored.
    ResponseAlreadyExists {
        respondent: Address,
        survey_id: SurveyId,
    },
    /// Only under immediate respondent payout.
    ResponseRewardPaid {
        survey_id: SurveyId,
        respondent: Address,
        amount: Amount,
    },
    SurveyRemoved {
        owner: Address,
        survey_id: SurveyId,
    },
    RemainderReturned {
        survey_id: SurveyId,
        recipient: Address,
        amount: Amount,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RewardPoolInfoSet { .. } => "reward_pool_info_set",
            Self::RewardTransferredToEscrow { .. } => "reward_transferred_to_escrow",
            Self::SurveyRegistered { .. } => "survey_registered",
            Self::ResponseSubmitted { .. } => "response_submitted",
            Self::ResponseAlreadyExists { .. } => "response_already_exists",
            Self::ResponseRewardPaid { .. } => "response_reward_paid",
            Self::SurveyRemoved { .. } => "survey_removed",
            Self::RemainderReturned { .. } => "remainder_returned",
        }
    }
}

/// Value leaving the ledger core to an external account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

impl Transfer {
    pub fn new(from: Address, to: Address, amount: Amount) -> Self {
        Self { from, to, amount }
    }
}

/// What a committed operation did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub events: Vec<LedgerEvent>,
    pub transfers: Vec<Transfer>,
}

impl TxReceipt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(LedgerEvent::name).collect()
    }

    /// Total value sent to `recipient` by this operation.
    pub fn transferred_to(&self, recipient: &Address) -> Amount {
        self.transfers
            .iter()
            .filter(|transfer| &transfer.to == recipient)
            .fold(Amount::zero(), |acc, transfer| acc.saturating_add(transfer.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let event = LedgerEvent::SurveyRegistered {
            owner: Address::new("company-a"),
            survey_id: SurveyId::new("s-1"),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "survey_registered");
        assert_eq!(value["owner"], "company-a");
        assert_eq!(event.name(), "survey_registered");
    }

    #[test]
    fn transferred_to_sums_matching_transfers() {
        let vault = Address::new("vault");
        let owner = Address::new("owner");
        let receipt = TxReceipt {
            events: vec![],
            transfers: vec![
                Transfer::new(vault.clone(), owner.clone(), Amount::new(300)),
                Transfer::new(vault.clone(), Address::new("other"), Amount::new(50)),
                Transfer::new(vault, owner.clone(), Amount::new(200)),
            ],
        };
        assert_eq!(receipt.transferred_to(&owner), Amount::new(500));
    }
}
