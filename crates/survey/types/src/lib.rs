//! Survey Reward Ledger Domain Types
//!
//! Shared vocabulary for the two cooperating ledger components:
//!
//! - **Survey Registry**: registers funded surveys, accepts one response per
//!   respondent, and refunds the unspent pool on closure.
//! - **Escrow Vault**: holds the pooled value of every open survey and pays out
//!   only to the single authorized agent's instructions.
//!
//! # Architecture
//!
//! This is a pure types crate with no runtime dependencies. Identifiers use the
//! newtype pattern and implement `Display` and `new()`. Amounts are unsigned
//! integers in the smallest value unit and every arithmetic step on them is
//! checked. Operations report what they did as a [`TxReceipt`] holding the
//! ordered [`LedgerEvent`]s and outgoing [`Transfer`]s, never via callbacks.

#![deny(unsafe_code)]

mod amount;
mod call;
mod errors;
mod escrow;
mod events;
mod ids;
mod survey;

pub use amount::*;
pub use call::*;
pub use errors::*;
pub use escrow::*;
pub use events::*;
pub use ids::*;
pub use survey::*;
