//! Mock storage implementations for testing.
//!
//! In-memory stores with the same semantics as the real backends plus
//! fault-injection switches, so coordinator retry and inconsistency
//! paths can be exercised deterministically.

mod ledger_store;
mod transaction_log;
mod voucher_store;

pub use ledger_store::MockLedgerStore;
pub use transaction_log::MockTransactionLog;
pub use voucher_store::MockVoucherStore;

#[cfg(test)]
mod tests;
