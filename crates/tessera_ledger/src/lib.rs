//! Credit ledger for the Tessera gateway.
//!
//! Tracks a rolling daily allowance per account, prices requests by tier and
//! workload, admits or denies them before dispatch, and debits after
//! completion. Durable state lives behind [`LedgerStore`](tessera_interface::LedgerStore).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod in_memory;
mod ledger;
mod pricing;
mod reset;

pub use clock::{Clock, ManualClock, SystemClock};
pub use in_memory::InMemoryLedgerStore;
pub use ledger::{Admission, CreditLedger, DenialReason};
pub use pricing::{request_cost, workload_cost};
pub use reset::{RESET_INTERVAL_HOURS, should_reset};
