//! Ledger storage interface.

use async_trait::async_trait;

use super::voucher_store::Result;

/// Interface for per-user balance persistence.
///
/// A user's balance is mutated only through [`LedgerStore::credit`],
/// never by direct write.
///
/// Implementations:
/// - `SqliteLedgerStore`: SQLite storage
/// - `MockLedgerStore`: in-memory storage for tests
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Increase `user_id`'s balance by `amount`.
    ///
    /// Idempotent on `idempotency_key` (the voucher code): if a credit
    /// with the same key was already durably applied, re-invocation
    /// returns the balance computed when the credit first applied,
    /// without incrementing twice. The key is recorded in the same
    /// storage transaction as the balance update, so a retry after a
    /// crash or timeout can never double-apply.
    ///
    /// Fails with `UserNotFound` if the account does not exist.
    async fn credit(&self, user_id: &str, amount: i64, idempotency_key: &str) -> Result<i64>;

    /// Current balance for a user.
    async fn balance(&self, user_id: &str) -> Result<i64>;

    /// Create an account with zero balance if it does not exist.
    async fn create_account(&self, user_id: &str) -> Result<()>;
}
