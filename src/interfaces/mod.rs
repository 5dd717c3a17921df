//! Abstract interfaces for engine components.
//!
//! These traits define the contracts for:
//! - Voucher storage (creation, atomic claim)
//! - Ledger storage (idempotent balance credit)
//! - Transaction log (append-only audit trail)
//! - Authentication gate (consumed from the surrounding application)

pub mod auth;
pub mod ledger_store;
pub mod transaction_log;
pub mod voucher_store;

pub use auth::{AuthContext, AuthError, AuthGate, Role};
pub use ledger_store::LedgerStore;
pub use transaction_log::{EntryType, LedgerEntry, TransactionLog};
pub use voucher_store::{StorageError, Voucher, VoucherStatus, VoucherStore};
