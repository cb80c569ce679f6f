//! Registry policies
//!
//! Defaults: excess payment goes back to the creator, refunds are not gated
//! on the deadline, and respondents are not paid by the ledger itself.

use serde::{Deserialize, Serialize};

/// What happens to value attached above the registered pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcessPaymentPolicy {
    /// Send the excess back to the caller
    #[default]
    Refund,
    /// Keep the excess in the registry's retained counter
    Retain,
}

/// When an owner may close a survey and reclaim the remainder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundGate {
    /// Any time; the deadline is advisory
    #[default]
    Anytime,
    /// Only once the closing deadline has passed
    AfterDeadline,
}

/// Whether accepted responses move value to the respondent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespondentPayout {
    /// Bookkeeping only: the reward stays in the vault
    #[default]
    Deferred,
    /// Pay the reward from the vault inside the answer transaction
    Immediate,
}

/// Registry configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub excess_payment: ExcessPaymentPolicy,
    pub refund_gate: RefundGate,
    pub respondent_payout: RespondentPayout,
}

impl RegistryConfig {
    pub fn with_excess_payment(mut self, policy: ExcessPaymentPolicy) -> Self {
        self.excess_payment = policy;
        self
    }

    pub fn with_refund_gate(mut self, gate: RefundGate) -> Self {
        self.refund_gate = gate;
        self
    }

    pub fn with_respondent_payout(mut self, payout: RespondentPayout) -> Self {
        self.respondent_payout = payout;
        self
    }
}
