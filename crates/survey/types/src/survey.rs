//! Survey records and their embedded reward pools
//!
//! A [`SurveyRecord`] is plain data plus the bookkeeping rules that keep
//! `reward_per_response * response_count <= total_pool`. It does not move
//! value; the registry does that through the escrow.

use crate::{Address, Amount, LedgerError, LedgerResult, SurveyId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The `(total_pool, reward_per_response)` pair of a survey.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPoolInfo {
    pub total_pool: Amount,
    pub reward_per_response: Amount,
}

impl RewardPoolInfo {
    pub fn new(total_pool: Amount, reward_per_response: Amount) -> Self {
        Self {
            total_pool,
            reward_per_response,
        }
    }

    /// Reward must be non-zero and fit in the pool at least once.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.reward_per_response.is_zero() || self.reward_per_response > self.total_pool {
            return Err(LedgerError::InvalidRewardConfiguration {
                total_pool: self.total_pool,
                reward_per_response: self.reward_per_response,
            });
        }
        Ok(())
    }

    /// How many responses the pool can fund.
    pub fn max_responses(&self) -> u64 {
        if self.reward_per_response.is_zero() {
            return 0;
        }
        self.total_pool.0 / self.reward_per_response.0
    }

    /// Amount earmarked for `responses` responses.
    pub fn distributed_for(&self, responses: u64) -> Option<Amount> {
        self.reward_per_response.checked_mul(responses)
    }
}

/// A registered, open survey.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub id: SurveyId,
    pub owner: Address,
    /// Last second at which responses are accepted.
    pub closing_deadline: Timestamp,
    pub pool: RewardPoolInfo,
    pub response_count: u64,
    /// Respondent address to opaque response locator.
    pub respondents: BTreeMap<Address, String>,
    pub registered_at: Timestamp,
}

impl SurveyRecord {
    pub fn new(
        id: SurveyId,
        owner: Address,
        pool: RewardPoolInfo,
        closing_deadline: Timestamp,
        registered_at: Timestamp,
    ) -> Self {
        Self {
            id,
            owner,
            closing_deadline,
            pool,
            response_count: 0,
            respondents: BTreeMap::new(),
            registered_at,
        }
    }

    pub fn is_open(&self, at: Timestamp) -> bool {
        at <= self.closing_deadline
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        &self.owner == address
    }

    pub fn has_responded(&self, respondent: &Address) -> bool {
        self.respondents.contains_key(respondent)
    }

    /// Value already earmarked for accepted responses.
    pub fn distributed(&self) -> LedgerResult<Amount> {
        self.pool
            .distributed_for(self.response_count)
            .ok_or(LedgerError::ArithmeticOverflow("distributed rewards"))
    }

    /// Unspent pool value that goes back to the owner on closure.
    pub fn remainder(&self) -> LedgerResult<Amount> {
        self.pool
            .total_pool
            .checked_sub(self.distributed()?)
            .ok_or(LedgerError::ArithmeticOverflow("pool remainder"))
    }

    pub fn invariant_holds(&self) -> bool {
        self.response_count == self.respondents.len() as u64
            && matches!(self.distributed(), Ok(distributed) if distributed <= self.pool.total_pool)
    }

    /// Record a first response from `respondent`, returning the new count.
    ///
    /// Caller is responsible for open/owner/duplicate checks; this only
    /// enforces that the pool still covers one more reward.
    pub fn record_response(
        &mut self,
        respondent: Address,
        locator: impl Into<String>,
    ) -> LedgerResult<u64> {
        let next = self.response_count + 1;
        let funded = self
            .pool
            .distributed_for(next)
            .is_some_and(|needed| needed <= self.pool.total_pool);
        if !funded {
            return Err(LedgerError::PoolExhausted {
                survey_id: self.id.clone(),
                response_count: self.response_count,
            });
        }

        self.respondents.insert(respondent, locator.into());
        self.response_count = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(pool: u64, reward: u64) -> SurveyRecord {
        SurveyRecord::new(
            SurveyId::new("s-1"),
            Address::new("owner"),
            RewardPoolInfo::new(Amount::new(pool), Amount::new(reward)),
            1_643_532_271,
            1_643_000_000,
        )
    }

    #[test]
    fn test_pool_validation() {
        assert!(RewardPoolInfo::new(Amount::new(1_000), Amount::new(100))
            .validate()
            .is_ok());
        assert!(RewardPoolInfo::new(Amount::new(1_000), Amount::new(1_000))
            .validate()
            .is_ok());
        assert!(matches!(
            RewardPoolInfo::new(Amount::new(1_000), Amount::zero()).validate(),
            Err(LedgerError::InvalidRewardConfiguration { .. })
        ));
        assert!(matches!(
            RewardPoolInfo::new(Amount::new(1_000), Amount::new(1_001)).validate(),
            Err(LedgerError::InvalidRewardConfiguration { .. })
        ));
    }

    #[test]
    fn test_deadline_is_inclusive() {
        let survey = record(1_000, 100);
        assert!(survey.is_open(1_643_532_271));
        assert!(!survey.is_open(1_643_532_272));
    }

    #[test]
    fn test_responses_until_exhausted() {
        let mut survey = record(250, 100);
        assert_eq!(survey.record_response(Address::new("a"), "cid-a").unwrap(), 1);
        assert_eq!(survey.record_response(Address::new("b"), "cid-b").unwrap(), 2);

        let err = survey
            .record_response(Address::new("c"), "cid-c")
            .unwrap_err();
        assert!(matches!(err, LedgerError::PoolExhausted { response_count: 2, .. }));
        assert_eq!(survey.response_count, 2);
        assert!(!survey.has_responded(&Address::new("c")));
        assert_eq!(survey.remainder().unwrap(), Amount::new(50));
    }

    #[test]
    fn test_remainder_of_fresh_survey_is_whole_pool() {
        let survey = record(1_000_000, 100_000);
        assert_eq!(survey.remainder().unwrap(), Amount::new(1_000_000));
        assert_eq!(survey.pool.max_responses(), 10);
    }

    proptest! {
        #[test]
        fn pool_invariant_survives_any_response_sequence(
            pool in 1u64..10_000,
            reward in 1u64..500,
            respondents in 0usize..64,
        ) {
            prop_assume!(reward <= pool);
            let mut survey = record(pool, reward);
            for i in 0..respondents {
                let _ = survey.record_response(Address::new(format!("r-{i}")), "cid");
                prop_assert!(survey.invariant_holds());
            }
            prop_assert!(survey.response_count <= survey.pool.max_responses());
        }
    }
}
