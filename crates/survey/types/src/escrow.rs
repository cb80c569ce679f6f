//! Seam between the registry and whatever custodies the pooled value

use crate::{Address, Amount, LedgerResult, Transfer};

/// State that can be captured and put back by an enclosing transaction.
///
/// `restore` bypasses every gate of the implementing type. Holders of a
/// `&mut` to a live escrow must not be handed out beyond the transaction.
pub trait Checkpointed {
    type Checkpoint;

    fn checkpoint(&self) -> Self::Checkpoint;

    fn restore(&mut self, checkpoint: Self::Checkpoint);
}

/// The vault contract as seen by its callers.
///
/// Deposits are unrestricted. Payouts are honoured only when `caller` is the
/// stored agent; an implementation must re-check its own balance rather than
/// trust the agent's accounting.
pub trait Escrow: Checkpointed {
    /// Address other components use to reach this vault.
    fn address(&self) -> &Address;

    /// The single identity allowed to request payouts, if one is set.
    fn agent(&self) -> Option<&Address>;

    /// Aggregate balance held for all live surveys.
    fn balance(&self) -> Amount;

    /// Re-point the payout gate. Only the vault's administrator may call it.
    fn set_agent(&mut self, caller: &Address, agent: Address) -> LedgerResult<()>;

    fn deposit(&mut self, from: &Address, amount: Amount) -> LedgerResult<()>;

    fn payout(
        &mut self,
        caller: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> LedgerResult<Transfer>;
}
