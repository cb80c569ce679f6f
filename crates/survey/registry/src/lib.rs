//! Survey Registry - the business rules of the reward ledger
//!
//! The registry owns every [`SurveyRecord`](survey_types::SurveyRecord) and is
//! the sole agent of the escrow vault. It:
//!
//! - registers funded surveys and forwards their pools into the vault,
//! - accepts one response per respondent while debiting the pool's books,
//! - returns the unspent remainder to the owner and deletes the survey on
//!   closure.
//!
//! Every mutating operation runs inside a [`LedgerTx`](transaction::LedgerTx):
//! either all of its writes and value movements commit, or none do.

#![deny(unsafe_code)]

pub mod config;
pub mod registry;
pub mod snapshot;
pub mod store;
pub mod transaction;

pub use config::{ExcessPaymentPolicy, RefundGate, RegistryConfig, RespondentPayout};
pub use registry::{RegisterSurvey, SurveyRegistry};
pub use snapshot::LedgerSnapshot;
pub use store::SurveyTable;
