//! Scrip - voucher redemption and balance-ledger engine.
//!
//! Users accrue balance by redeeming one-time-use vouchers. The engine
//! guarantees that a voucher is consumed exactly once, the redeemer's
//! balance is credited exactly once, and an audit record is appended,
//! under concurrent redemption attempts across server instances with no
//! shared memory. All mutual exclusion is delegated to a conditional
//! operation at the storage layer.

pub mod codes;
pub mod config;
pub mod error;
#[cfg(feature = "sqlite")]
pub mod facade;
pub mod interfaces;
pub mod redemption;
pub mod storage;
pub mod utils;

pub use error::RedemptionError;
pub use redemption::{RedemptionCoordinator, RedemptionOutcome};
