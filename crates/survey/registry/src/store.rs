//! Survey table keyed by survey id

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use survey_types::{Address, SurveyId, SurveyRecord};

/// Live surveys. Closing a survey removes its entry outright, respondent set
/// included.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyTable {
    records: BTreeMap<SurveyId, SurveyRecord>,
}

impl SurveyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &SurveyId) -> Option<&SurveyRecord> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &SurveyId) -> Option<&mut SurveyRecord> {
        self.records.get_mut(id)
    }

    pub fn contains(&self, id: &SurveyId) -> bool {
        self.records.contains_key(id)
    }

    pub(crate) fn insert(&mut self, record: SurveyRecord) -> Option<SurveyRecord> {
        self.records.insert(record.id.clone(), record)
    }

    pub(crate) fn remove(&mut self, id: &SurveyId) -> Option<SurveyRecord> {
        self.records.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SurveyRecord> {
        self.records.values()
    }

    /// Ids of the open surveys created by `owner`, in id order.
    pub fn owned_by<'a>(&'a self, owner: &'a Address) -> impl Iterator<Item = &'a SurveyId> {
        self.records
            .values()
            .filter(move |record| &record.owner == owner)
            .map(|record| &record.id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
