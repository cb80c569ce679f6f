//! Call context supplied by the external sequencer

use crate::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Envelope of a single ledger call: who is calling, how much value is
/// attached, and the sequencer's notion of "now".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub value: Amount,
    pub timestamp: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address) -> Self {
        Self {
            caller,
            value: Amount::zero(),
            timestamp: 0,
        }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }

    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }
}
