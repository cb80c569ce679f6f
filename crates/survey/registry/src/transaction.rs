//! Begin/commit/rollback over the registry's in-memory state
//!
//! A [`LedgerTx`] records an undo entry for every write it makes to the
//! survey table and takes a checkpoint of the escrow when it begins. Commit
//! discards the log and hands back the receipt. Dropping a transaction that
//! was not committed (an early `?` return, a panic) replays the log in
//! reverse and restores the escrow, so callers never observe partial state.

use crate::store::SurveyTable;
use survey_types::{
    Address, Amount, Escrow, LedgerError, LedgerEvent, LedgerResult, SurveyId, SurveyRecord,
    Transfer, TxReceipt,
};
use tracing::debug;

/// Mutable registry state covered by transactions.
#[derive(Clone, Debug, Default)]
pub(crate) struct RegistryState {
    pub(crate) surveys: SurveyTable,
    pub(crate) retained_excess: Amount,
}

enum Undo {
    Inserted(SurveyId),
    Removed(SurveyRecord),
    ResponseRecorded { survey_id: SurveyId, respondent: Address },
    Retained(Amount),
}

/// One atomic unit of work against the registry and its escrow.
pub(crate) struct LedgerTx<'a, E: Escrow> {
    state: &'a mut RegistryState,
    escrow: &'a mut E,
    escrow_checkpoint: Option<E::Checkpoint>,
    undo: Vec<Undo>,
    receipt: TxReceipt,
    committed: bool,
}

impl<'a, E: Escrow> LedgerTx<'a, E> {
    pub(crate) fn begin(state: &'a mut RegistryState, escrow: &'a mut E) -> Self {
        let escrow_checkpoint = Some(escrow.checkpoint());
        Self {
            state,
            escrow,
            escrow_checkpoint,
            undo: Vec::new(),
            receipt: TxReceipt::new(),
            committed: false,
        }
    }

    pub(crate) fn insert_survey(&mut self, record: SurveyRecord) -> LedgerResult<()> {
        if self.state.surveys.contains(&record.id) {
            return Err(LedgerError::DuplicateSurveyId(record.id));
        }
        self.undo.push(Undo::Inserted(record.id.clone()));
        self.state.surveys.insert(record);
        Ok(())
    }

    pub(crate) fn remove_survey(&mut self, survey_id: &SurveyId) -> LedgerResult<SurveyRecord> {
        let record = self
            .state
            .surveys
            .remove(survey_id)
            .ok_or_else(|| LedgerError::SurveyNotFound(survey_id.clone()))?;
        self.undo.push(Undo::Removed(record.clone()));
        Ok(record)
    }

    pub(crate) fn record_response(
        &mut self,
        survey_id: &SurveyId,
        respondent: &Address,
        locator: &str,
    ) -> LedgerResult<u64> {
        let record = self
            .state
            .surveys
            .get_mut(survey_id)
            .ok_or_else(|| LedgerError::SurveyNotFound(survey_id.clone()))?;
        let count = record.record_response(respondent.clone(), locator)?;
        self.undo.push(Undo::ResponseRecorded {
            survey_id: survey_id.clone(),
            respondent: respondent.clone(),
        });
        Ok(count)
    }

    pub(crate) fn retain_excess(&mut self, amount: Amount) -> LedgerResult<()> {
        let retained = self
            .state
            .retained_excess
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow("retained excess"))?;
        self.undo.push(Undo::Retained(self.state.retained_excess));
        self.state.retained_excess = retained;
        Ok(())
    }

    pub(crate) fn deposit(&mut self, from: &Address, amount: Amount) -> LedgerResult<()> {
        self.escrow.deposit(from, amount)
    }

    pub(crate) fn payout(
        &mut self,
        caller: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        let transfer = self.escrow.payout(caller, recipient, amount)?;
        self.receipt.transfers.push(transfer);
        Ok(())
    }

    /// Record value sent out of the core that did not pass through the escrow.
    pub(crate) fn transfer(&mut self, transfer: Transfer) {
        self.receipt.transfers.push(transfer);
    }

    pub(crate) fn emit(&mut self, event: LedgerEvent) {
        self.receipt.events.push(event);
    }

    pub(crate) fn commit(mut self) -> TxReceipt {
        self.committed = true;
        self.undo.clear();
        self.escrow_checkpoint = None;
        std::mem::take(&mut self.receipt)
    }

    fn rollback(&mut self) {
        let writes = self.undo.len();
        while let Some(undo) = self.undo.pop() {
            match undo {
                Undo::Inserted(survey_id) => {
                    self.state.surveys.remove(&survey_id);
                }
                Undo::Removed(record) => {
                    self.state.surveys.insert(record);
                }
                Undo::ResponseRecorded {
                    survey_id,
                    respondent,
                } => {
                    if let Some(record) = self.state.surveys.get_mut(&survey_id) {
                        record.respondents.remove(&respondent);
                        record.response_count = record.response_count.saturating_sub(1);
                    }
                }
                Undo::Retained(previous) => {
                    self.state.retained_excess = previous;
                }
            }
        }
        if let Some(checkpoint) = self.escrow_checkpoint.take() {
            self.escrow.restore(checkpoint);
        }
        debug!(writes, "Ledger transaction rolled back");
    }
}

impl<E: Escrow> Drop for LedgerTx<'_, E> {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_escrow::EscrowVault;
    use survey_types::RewardPoolInfo;

    fn setup() -> (RegistryState, EscrowVault) {
        let admin = Address::new("deployer");
        let mut vault = EscrowVault::new(Address::new("vault"), admin.clone());
        vault.set_agent(&admin, Address::new("registry")).unwrap();
        (RegistryState::default(), vault)
    }

    fn survey(id: &str) -> SurveyRecord {
        SurveyRecord::new(
            SurveyId::new(id),
            Address::new("owner"),
            RewardPoolInfo::new(Amount::new(1_000), Amount::new(100)),
            2_000_000_000,
            0,
        )
    }

    #[test]
    fn test_commit_keeps_writes() {
        let (mut state, mut vault) = setup();
        let receipt = {
            let mut tx = LedgerTx::begin(&mut state, &mut vault);
            tx.insert_survey(survey("s-1")).unwrap();
            tx.deposit(&Address::new("registry"), Amount::new(1_000)).unwrap();
            tx.emit(LedgerEvent::SurveyRegistered {
                owner: Address::new("owner"),
                survey_id: SurveyId::new("s-1"),
            });
            tx.commit()
        };

        assert!(state.surveys.contains(&SurveyId::new("s-1")));
        assert_eq!(vault.balance(), Amount::new(1_000));
        assert_eq!(receipt.event_names(), vec!["survey_registered"]);
    }

    #[test]
    fn test_drop_without_commit_rolls_back_everything() {
        let (mut state, mut vault) = setup();
        {
            let mut tx = LedgerTx::begin(&mut state, &mut vault);
            tx.insert_survey(survey("s-1")).unwrap();
            tx.commit();
        }

        {
            let mut tx = LedgerTx::begin(&mut state, &mut vault);
            tx.insert_survey(survey("s-2")).unwrap();
            tx.deposit(&Address::new("registry"), Amount::new(1_000)).unwrap();
            tx.record_response(&SurveyId::new("s-1"), &Address::new("taker"), "cid")
                .unwrap();
            tx.retain_excess(Amount::new(7)).unwrap();
            tx.remove_survey(&SurveyId::new("s-1")).unwrap();
        }

        assert_eq!(state.surveys.len(), 1);
        let restored = state.surveys.get(&SurveyId::new("s-1")).unwrap();
        assert_eq!(restored.response_count, 0);
        assert!(restored.respondents.is_empty());
        assert_eq!(state.retained_excess, Amount::zero());
        assert_eq!(vault.balance(), Amount::zero());
    }

    fn register_with_zero_deposit(
        state: &mut RegistryState,
        vault: &mut EscrowVault,
    ) -> LedgerResult<TxReceipt> {
        let mut tx = LedgerTx::begin(state, vault);
        tx.insert_survey(survey("s-1"))?;
        tx.deposit(&Address::new("registry"), Amount::zero())?;
        Ok(tx.commit())
    }

    #[test]
    fn test_failed_step_rolls_back_earlier_steps() {
        let (mut state, mut vault) = setup();
        let result = register_with_zero_deposit(&mut state, &mut vault);

        assert_eq!(result, Err(LedgerError::InvalidAmount(Amount::zero())));
        assert!(state.surveys.is_empty());
    }
}
