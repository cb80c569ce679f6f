//! Survey Registry - registration, response intake, closure refunds
//!
//! Per survey id the lifecycle is `NonExistent -> Open -> Removed`. Answers
//! loop on `Open`; a refund deletes the record, after which the id may be
//! registered again.

use crate::config::{ExcessPaymentPolicy, RefundGate, RegistryConfig, RespondentPayout};
use crate::store::SurveyTable;
use crate::transaction::{LedgerTx, RegistryState};
use serde::{Deserialize, Serialize};
use survey_escrow::EscrowVault;
use survey_types::{
    Address, Amount, CallContext, Escrow, LedgerError, LedgerEvent, LedgerResult,
    RewardPoolInfo, SurveyId, SurveyRecord, Timestamp, Transfer, TxReceipt,
};
use tracing::{info, warn};

/// Arguments of a survey registration. The attached value travels in the
/// [`CallContext`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSurvey {
    pub survey_id: SurveyId,
    pub total_pool: Amount,
    pub reward_per_response: Amount,
    pub closing_deadline: Timestamp,
}

impl RegisterSurvey {
    pub fn new(
        survey_id: SurveyId,
        total_pool: Amount,
        reward_per_response: Amount,
        closing_deadline: Timestamp,
    ) -> Self {
        Self {
            survey_id,
            total_pool,
            reward_per_response,
            closing_deadline,
        }
    }

    pub fn pool(&self) -> RewardPoolInfo {
        RewardPoolInfo::new(self.total_pool, self.reward_per_response)
    }
}

/// The registry: owns survey records and acts as the escrow's agent.
pub struct SurveyRegistry<E: Escrow = EscrowVault> {
    /// Identity the registry presents to the escrow
    address: Address,
    config: RegistryConfig,
    state: RegistryState,
    escrow: E,
}

impl<E: Escrow> SurveyRegistry<E> {
    /// Create a registry in front of an existing escrow.
    ///
    /// The escrow's agent is expected to be `address`; if it is not, the
    /// registry still accepts registrations and answers but every payout
    /// (refunds, immediate rewards) fails until the agent is fixed.
    pub fn new(address: Address, escrow: E, config: RegistryConfig) -> Self {
        Self::from_parts(address, escrow, config, RegistryState::default())
    }

    pub(crate) fn from_parts(
        address: Address,
        escrow: E,
        config: RegistryConfig,
        state: RegistryState,
    ) -> Self {
        if escrow.agent() != Some(&address) {
            warn!(
                registry = %address,
                escrow = %escrow.address(),
                agent = ?escrow.agent().map(Address::as_str),
                "Registry is not the escrow agent; payouts will be rejected"
            );
        }

        Self {
            address,
            config,
            state,
            escrow,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn escrow(&self) -> &E {
        &self.escrow
    }

    /// Re-point the escrow's agent. `caller` must be the escrow admin; the
    /// balance is never touched.
    pub fn set_escrow_agent(&mut self, caller: &Address, agent: Address) -> LedgerResult<()> {
        self.escrow.set_agent(caller, agent).inspect_err(|err| {
            warn!(caller = %caller, code = err.code(), "Escrow agent change rejected");
        })?;
        if self.escrow.agent() != Some(&self.address) {
            warn!(
                registry = %self.address,
                agent = ?self.escrow.agent().map(Address::as_str),
                "Registry is no longer the escrow agent; payouts will be rejected"
            );
        }
        Ok(())
    }

    pub fn surveys(&self) -> &SurveyTable {
        &self.state.surveys
    }

    /// Excess payments kept under [`ExcessPaymentPolicy::Retain`].
    pub fn retained_excess(&self) -> Amount {
        self.state.retained_excess
    }

    // --- Mutating operations ---

    /// Register a survey funded by the value attached to `call`.
    ///
    /// Emits, in order: `RewardPoolInfoSet`, `RewardTransferredToEscrow`,
    /// `SurveyRegistered`.
    pub fn register_survey(
        &mut self,
        call: &CallContext,
        request: RegisterSurvey,
    ) -> LedgerResult<TxReceipt> {
        self.try_register(call, request).inspect_err(|err| {
            warn!(caller = %call.caller, code = err.code(), error = %err, "Survey registration rejected");
        })
    }

    fn try_register(
        &mut self,
        call: &CallContext,
        request: RegisterSurvey,
    ) -> LedgerResult<TxReceipt> {
        let Self {
            address,
            config,
            state,
            escrow,
        } = self;

        if state.surveys.contains(&request.survey_id) {
            return Err(LedgerError::DuplicateSurveyId(request.survey_id));
        }
        if call.value < request.total_pool {
            return Err(LedgerError::InsufficientPayment {
                required: request.total_pool,
                attached: call.value,
            });
        }
        let pool = request.pool();
        pool.validate()?;
        let excess = call
            .value
            .checked_sub(pool.total_pool)
            .ok_or(LedgerError::ArithmeticOverflow("registration excess"))?;

        let survey_id = request.survey_id;
        let owner = call.caller.clone();

        let mut tx = LedgerTx::begin(state, escrow);
        tx.insert_survey(SurveyRecord::new(
            survey_id.clone(),
            owner.clone(),
            pool,
            request.closing_deadline,
            call.timestamp,
        ))?;
        tx.emit(LedgerEvent::RewardPoolInfoSet {
            survey_id: survey_id.clone(),
            total_pool: pool.total_pool,
            reward_per_response: pool.reward_per_response,
        });

        tx.deposit(address, pool.total_pool)?;
        tx.emit(LedgerEvent::RewardTransferredToEscrow {
            survey_id: survey_id.clone(),
            amount: pool.total_pool,
        });

        if !excess.is_zero() {
            match config.excess_payment {
                ExcessPaymentPolicy::Refund => {
                    tx.transfer(Transfer::new(address.clone(), owner.clone(), excess));
                }
                ExcessPaymentPolicy::Retain => tx.retain_excess(excess)?,
            }
        }

        tx.emit(LedgerEvent::SurveyRegistered {
            owner: owner.clone(),
            survey_id: survey_id.clone(),
        });
        let receipt = tx.commit();

        info!(
            survey_id = %survey_id,
            owner = %owner,
            total_pool = pool.total_pool.0,
            reward_per_response = pool.reward_per_response.0,
            excess = excess.0,
            "Survey registered"
        );
        Ok(receipt)
    }

    /// Accept `call.caller`'s response to an open survey.
    ///
    /// A repeat response from the same address is not an error: nothing is
    /// written and the receipt carries a single `ResponseAlreadyExists`.
    pub fn answer_survey(
        &mut self,
        call: &CallContext,
        survey_id: &SurveyId,
        response_locator: &str,
    ) -> LedgerResult<TxReceipt> {
        self.try_answer(call, survey_id, response_locator)
            .inspect_err(|err| {
                warn!(
                    survey_id = %survey_id,
                    respondent = %call.caller,
                    code = err.code(),
                    "Survey response rejected"
                );
            })
    }

    fn try_answer(
        &mut self,
        call: &CallContext,
        survey_id: &SurveyId,
        response_locator: &str,
    ) -> LedgerResult<TxReceipt> {
        let Self {
            address,
            config,
            state,
            escrow,
        } = self;

        let record = state
            .surveys
            .get(survey_id)
            .ok_or_else(|| LedgerError::SurveyNotFound(survey_id.clone()))?;
        if !record.is_open(call.timestamp) {
            return Err(LedgerError::SurveyClosed {
                survey_id: survey_id.clone(),
                closing_deadline: record.closing_deadline,
            });
        }
        if record.is_owner(&call.caller) {
            return Err(LedgerError::OwnerCannotRespond(survey_id.clone()));
        }
        if record.has_responded(&call.caller) {
            warn!(survey_id = %survey_id, respondent = %call.caller, "Duplicate response ignored");
            let mut receipt = TxReceipt::new();
            receipt.events.push(LedgerEvent::ResponseAlreadyExists {
                respondent: call.caller.clone(),
                survey_id: survey_id.clone(),
            });
            return Ok(receipt);
        }
        let reward = record.pool.reward_per_response;

        let mut tx = LedgerTx::begin(state, escrow);
        let response_count = tx.record_response(survey_id, &call.caller, response_locator)?;
        tx.emit(LedgerEvent::ResponseSubmitted {
            respondent: call.caller.clone(),
            survey_id: survey_id.clone(),
            response_count,
        });

        if config.respondent_payout == RespondentPayout::Immediate {
            tx.payout(address, &call.caller, reward)?;
            tx.emit(LedgerEvent::ResponseRewardPaid {
                survey_id: survey_id.clone(),
                respondent: call.caller.clone(),
                amount: reward,
            });
        }
        let receipt = tx.commit();

        info!(
            survey_id = %survey_id,
            respondent = %call.caller,
            response_count,
            "Survey response recorded"
        );
        Ok(receipt)
    }

    /// Close a survey: pay the unspent remainder back to its owner and delete
    /// the record.
    ///
    /// Emits, in order: `SurveyRemoved`, `RemainderReturned`.
    pub fn refund_on_survey_closed(
        &mut self,
        call: &CallContext,
        survey_id: &SurveyId,
    ) -> LedgerResult<TxReceipt> {
        self.try_refund(call, survey_id).inspect_err(|err| {
            warn!(
                survey_id = %survey_id,
                caller = %call.caller,
                code = err.code(),
                "Survey refund rejected"
            );
        })
    }

    fn try_refund(&mut self, call: &CallContext, survey_id: &SurveyId) -> LedgerResult<TxReceipt> {
        let Self {
            address,
            config,
            state,
            escrow,
        } = self;

        let record = state
            .surveys
            .get(survey_id)
            .ok_or_else(|| LedgerError::SurveyNotFound(survey_id.clone()))?;
        if !record.is_owner(&call.caller) {
            return Err(LedgerError::UnauthorizedCaller(call.caller.clone()));
        }
        if config.refund_gate == RefundGate::AfterDeadline && record.is_open(call.timestamp) {
            return Err(LedgerError::SurveyStillOpen {
                survey_id: survey_id.clone(),
                closing_deadline: record.closing_deadline,
            });
        }
        let owner = record.owner.clone();
        let remainder = record.remainder()?;
        let response_count = record.response_count;

        let mut tx = LedgerTx::begin(state, escrow);
        if !remainder.is_zero() {
            tx.payout(address, &owner, remainder)?;
        }
        tx.remove_survey(survey_id)?;
        tx.emit(LedgerEvent::SurveyRemoved {
            owner: owner.clone(),
            survey_id: survey_id.clone(),
        });
        tx.emit(LedgerEvent::RemainderReturned {
            survey_id: survey_id.clone(),
            recipient: owner.clone(),
            amount: remainder,
        });
        let receipt = tx.commit();

        info!(
            survey_id = %survey_id,
            owner = %owner,
            remainder = remainder.0,
            response_count,
            "Survey closed and remainder returned"
        );
        Ok(receipt)
    }

    // --- Read-only accessors ---

    fn record(&self, survey_id: &SurveyId) -> LedgerResult<&SurveyRecord> {
        self.state
            .surveys
            .get(survey_id)
            .ok_or_else(|| LedgerError::SurveyNotFound(survey_id.clone()))
    }

    /// True when `survey_id` is live and owned by `owner`.
    pub fn check_survey_id_exists(&self, survey_id: &SurveyId, owner: &Address) -> bool {
        self.state
            .surveys
            .get(survey_id)
            .is_some_and(|record| record.is_owner(owner))
    }

    pub fn owner_of_survey(&self, survey_id: &SurveyId) -> LedgerResult<&Address> {
        Ok(&self.record(survey_id)?.owner)
    }

    pub fn total_distributable_rewards_of_survey(&self, survey_id: &SurveyId) -> LedgerResult<Amount> {
        Ok(self.record(survey_id)?.pool.total_pool)
    }

    pub fn reward_per_response_of_survey(&self, survey_id: &SurveyId) -> LedgerResult<Amount> {
        Ok(self.record(survey_id)?.pool.reward_per_response)
    }

    pub fn escrow_address(&self) -> &Address {
        self.escrow.address()
    }

    pub fn survey(&self, survey_id: &SurveyId) -> LedgerResult<&SurveyRecord> {
        self.record(survey_id)
    }

    pub fn pool_info(&self, survey_id: &SurveyId) -> LedgerResult<RewardPoolInfo> {
        Ok(self.record(survey_id)?.pool)
    }

    pub fn response_count(&self, survey_id: &SurveyId) -> LedgerResult<u64> {
        Ok(self.record(survey_id)?.response_count)
    }

    pub fn has_responded(&self, survey_id: &SurveyId, respondent: &Address) -> LedgerResult<bool> {
        Ok(self.record(survey_id)?.has_responded(respondent))
    }

    pub fn response_locator(
        &self,
        survey_id: &SurveyId,
        respondent: &Address,
    ) -> LedgerResult<Option<&str>> {
        Ok(self
            .record(survey_id)?
            .respondents
            .get(respondent)
            .map(String::as_str))
    }

    pub fn closing_deadline(&self, survey_id: &SurveyId) -> LedgerResult<Timestamp> {
        Ok(self.record(survey_id)?.closing_deadline)
    }

    /// What the owner would get back if the survey closed now.
    pub fn remaining_rewards(&self, survey_id: &SurveyId) -> LedgerResult<Amount> {
        self.record(survey_id)?.remainder()
    }

    /// Open surveys created by `owner`.
    pub fn surveys_of(&self, owner: &Address) -> Vec<SurveyId> {
        self.state.surveys.owned_by(owner).cloned().collect()
    }
}
