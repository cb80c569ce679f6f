//! Escrow Vault - custody of pooled survey rewards
//!
//! The vault is a gated accumulator: anyone may deposit, only the stored
//! agent may pay out. The agent is an explicit identity compared against the
//! caller on every payout. The vault never trusts its agent's bookkeeping and
//! refuses payouts larger than its own balance.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};
use survey_types::{
    Address, Amount, Checkpointed, Escrow, LedgerError, LedgerResult, Transfer,
};
use tracing::{info, warn};

/// Vault state: aggregate balance plus the single authorized agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowVault {
    /// Address the registry uses to reach this vault
    address: Address,
    /// Identity allowed to change the agent
    admin: Address,
    /// Identity allowed to request payouts
    agent: Option<Address>,
    /// Sum of all live surveys' undistributed pools
    balance: Amount,
}

/// Balance captured by an enclosing transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaultCheckpoint {
    balance: Amount,
}

impl EscrowVault {
    /// Create an empty vault administered by `admin`.
    pub fn new(address: Address, admin: Address) -> Self {
        Self {
            address,
            admin,
            agent: None,
            balance: Amount::zero(),
        }
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    /// Point the payout gate at `agent`. Administrative; only the vault's
    /// admin may call it.
    pub fn set_agent(&mut self, caller: &Address, agent: Address) -> LedgerResult<()> {
        if caller != &self.admin {
            warn!(vault = %self.address, caller = %caller, "Rejected agent change");
            return Err(LedgerError::UnauthorizedCaller(caller.clone()));
        }

        info!(
            vault = %self.address,
            previous = ?self.agent.as_ref().map(Address::as_str),
            agent = %agent,
            "Vault agent set"
        );
        self.agent = Some(agent);
        Ok(())
    }

    pub fn is_agent(&self, caller: &Address) -> bool {
        self.agent.as_ref() == Some(caller)
    }
}

impl Checkpointed for EscrowVault {
    type Checkpoint = VaultCheckpoint;

    fn checkpoint(&self) -> VaultCheckpoint {
        VaultCheckpoint {
            balance: self.balance,
        }
    }

    fn restore(&mut self, checkpoint: VaultCheckpoint) {
        self.balance = checkpoint.balance;
    }
}

impl Escrow for EscrowVault {
    fn address(&self) -> &Address {
        &self.address
    }

    fn agent(&self) -> Option<&Address> {
        self.agent.as_ref()
    }

    fn balance(&self) -> Amount {
        self.balance
    }

    fn set_agent(&mut self, caller: &Address, agent: Address) -> LedgerResult<()> {
        EscrowVault::set_agent(self, caller, agent)
    }

    fn deposit(&mut self, from: &Address, amount: Amount) -> LedgerResult<()> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount(amount))?;
        self.balance = balance;

        info!(
            vault = %self.address,
            from = %from,
            amount = amount.0,
            balance = self.balance.0,
            "Deposit received"
        );
        Ok(())
    }

    fn payout(
        &mut self,
        caller: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> LedgerResult<Transfer> {
        if !self.is_agent(caller) {
            warn!(
                vault = %self.address,
                caller = %caller,
                "Payout requested by non-agent"
            );
            return Err(LedgerError::UnauthorizedCaller(caller.clone()));
        }
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let balance = self
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientVaultBalance {
                requested: amount,
                available: self.balance,
            })?;

        // Decrement and transfer record are produced together; nothing is
        // observable in between.
        self.balance = balance;

        info!(
            vault = %self.address,
            recipient = %recipient,
            amount = amount.0,
            balance = self.balance.0,
            "Payout completed"
        );
        Ok(Transfer::new(self.address.clone(), recipient.clone(), amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn setup() -> (EscrowVault, Address, Address) {
        let admin = Address::new("deployer");
        let agent = Address::new("survey-registry");
        let mut vault = EscrowVault::new(Address::new("reward-escrow"), admin.clone());
        vault.set_agent(&admin, agent.clone()).unwrap();
        (vault, admin, agent)
    }

    #[test]
    fn test_agent_is_set() {
        let (vault, _, agent) = setup();
        assert_eq!(vault.agent(), Some(&agent));
    }

    #[test]
    fn test_only_admin_sets_agent() {
        let (mut vault, _, agent) = setup();
        let result = vault.set_agent(&Address::new("mallory"), Address::new("mallory"));
        assert!(matches!(result, Err(LedgerError::UnauthorizedCaller(_))));
        assert_eq!(vault.agent(), Some(&agent));
    }

    #[test]
    fn test_deposit_and_payout() {
        let (mut vault, _, agent) = setup();
        let creator = Address::new("company-a");

        vault.deposit(&agent, Amount::new(1_000_000)).unwrap();
        assert_eq!(vault.balance(), Amount::new(1_000_000));

        let transfer = vault
            .payout(&agent, &creator, Amount::new(800_000))
            .unwrap();
        assert_eq!(transfer.to, creator);
        assert_eq!(transfer.from, Address::new("reward-escrow"));
        assert_eq!(transfer.amount, Amount::new(800_000));
        assert_eq!(vault.balance(), Amount::new(200_000));
    }

    #[test]
    fn test_zero_and_overflowing_deposits_rejected() {
        let (mut vault, _, agent) = setup();
        assert_eq!(
            vault.deposit(&agent, Amount::zero()),
            Err(LedgerError::InvalidAmount(Amount::zero()))
        );

        vault.deposit(&agent, Amount::new(u64::MAX)).unwrap();
        assert_eq!(
            vault.deposit(&agent, Amount::new(1)),
            Err(LedgerError::InvalidAmount(Amount::new(1)))
        );
        assert_eq!(vault.balance(), Amount::new(u64::MAX));
    }

    #[test]
    fn test_payout_beyond_balance_rejected() {
        let (mut vault, _, agent) = setup();
        vault.deposit(&agent, Amount::new(500)).unwrap();

        let result = vault.payout(&agent, &Address::new("owner"), Amount::new(501));
        assert_eq!(
            result,
            Err(LedgerError::InsufficientVaultBalance {
                requested: Amount::new(501),
                available: Amount::new(500),
            })
        );
        assert_eq!(vault.balance(), Amount::new(500));
    }

    #[test]
    fn test_payout_without_agent_rejected() {
        let admin = Address::new("deployer");
        let mut vault = EscrowVault::new(Address::new("reward-escrow"), admin.clone());
        vault.deposit(&admin, Amount::new(10)).unwrap();

        let result = vault.payout(&admin, &admin, Amount::new(10));
        assert!(matches!(result, Err(LedgerError::UnauthorizedCaller(_))));
    }

    #[test]
    fn test_checkpoint_restore() {
        let (mut vault, _, agent) = setup();
        vault.deposit(&agent, Amount::new(100)).unwrap();
        let checkpoint = vault.checkpoint();

        vault.deposit(&agent, Amount::new(50)).unwrap();
        vault.restore(checkpoint);
        assert_eq!(vault.balance(), Amount::new(100));
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let (mut vault, _, agent) = setup();
        vault.deposit(&agent, Amount::new(42)).unwrap();

        let json = serde_json::to_string(&vault).unwrap();
        let restored: EscrowVault = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, vault);
    }

    proptest! {
        #[test]
        fn payout_by_non_agent_always_rejected(
            caller in "[a-z]{1,12}",
            recipient in "[a-z]{1,12}",
            amount in 0u64..2_000_000,
        ) {
            let (mut vault, _, agent) = setup();
            vault.deposit(&agent, Amount::new(1_000_000)).unwrap();
            let caller = Address::new(format!("user-{caller}"));
            prop_assume!(caller != agent);

            let result = vault.payout(&caller, &Address::new(recipient), Amount::new(amount));
            prop_assert_eq!(result, Err(LedgerError::UnauthorizedCaller(caller)));
            prop_assert_eq!(vault.balance(), Amount::new(1_000_000));
        }
    }
}
