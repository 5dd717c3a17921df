//! Billing facade for in-process library usage.
//!
//! Wires the SQLite stores and the redemption coordinator behind the
//! small surface the request layer consumes, without requiring any
//! server or external services.
//!
//! # Example
//!
//! ```ignore
//! use scrip::facade::{Billing, BillingConfig};
//! use scrip::interfaces::{AuthContext, Role};
//!
//! let billing = Billing::builder(BillingConfig::in_memory()).build().await?;
//!
//! let admin = AuthContext::new("admin@example.com", Role::Admin);
//! let voucher = billing.generate_voucher(100, &admin).await?;
//!
//! let user = AuthContext::new("user@example.com", Role::User);
//! billing.register_account(&user.user_id).await?;
//! let outcome = billing.redeem_voucher(&user, &voucher.code).await?;
//! ```

use std::sync::Arc;

use crate::config::RetryConfig;
use crate::error::RedemptionError;
use crate::interfaces::{
    AuthContext, LedgerEntry, LedgerStore, StorageError, TransactionLog, Voucher, VoucherStore,
};
use crate::redemption::{RedemptionCoordinator, RedemptionOutcome};
use crate::storage::sqlite::{
    connect, SqliteLedgerStore, SqliteTransactionLog, SqliteVoucherStore,
};

/// Configuration for a Billing instance.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// SQLite database path. Use `:memory:` for in-memory.
    pub database_path: String,
}

impl BillingConfig {
    /// Create config for in-memory database (testing/embedded).
    pub fn in_memory() -> Self {
        Self {
            database_path: ":memory:".to_string(),
        }
    }

    /// Create config with file-based database.
    pub fn with_database(path: impl Into<String>) -> Self {
        Self {
            database_path: path.into(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Builder for a Billing instance.
pub struct BillingBuilder {
    config: BillingConfig,
    retry: RetryConfig,
}

impl BillingBuilder {
    /// Create a new builder with given config.
    pub fn new(config: BillingConfig) -> Self {
        Self {
            config,
            retry: RetryConfig::default(),
        }
    }

    /// Override the retry policy for post-claim steps.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the Billing instance.
    pub async fn build(self) -> Result<Billing, RedemptionError> {
        let pool = connect(&self.config.database_path)
            .await
            .map_err(StorageError::from)?;

        let vouchers = Arc::new(SqliteVoucherStore::new(pool.clone()));
        vouchers.init().await?;

        let ledger = Arc::new(SqliteLedgerStore::new(pool.clone()));
        ledger.init().await?;

        let log = Arc::new(SqliteTransactionLog::new(pool));
        log.init().await?;

        let coordinator = RedemptionCoordinator::new(
            Arc::clone(&vouchers) as Arc<dyn VoucherStore>,
            Arc::clone(&ledger) as Arc<dyn LedgerStore>,
            Arc::clone(&log) as Arc<dyn TransactionLog>,
        )
        .with_retry(self.retry);

        Ok(Billing {
            vouchers,
            ledger,
            log,
            coordinator,
        })
    }
}

/// Main billing instance for library usage.
pub struct Billing {
    vouchers: Arc<SqliteVoucherStore>,
    ledger: Arc<SqliteLedgerStore>,
    log: Arc<SqliteTransactionLog>,
    coordinator: RedemptionCoordinator,
}

impl Billing {
    /// Create a new builder with given config.
    pub fn builder(config: BillingConfig) -> BillingBuilder {
        BillingBuilder::new(config)
    }

    /// Create a voucher worth `amount` minor units.
    ///
    /// Requires an admin caller.
    pub async fn generate_voucher(
        &self,
        amount: i64,
        auth: &AuthContext,
    ) -> Result<Voucher, RedemptionError> {
        if !auth.is_admin() {
            return Err(RedemptionError::Forbidden);
        }

        Ok(self.vouchers.generate(amount).await?)
    }

    /// Redeem a voucher for the authenticated caller.
    pub async fn redeem_voucher(
        &self,
        auth: &AuthContext,
        code: &str,
    ) -> Result<RedemptionOutcome, RedemptionError> {
        self.coordinator.redeem(&auth.user_id, code).await
    }

    /// Current balance for a user.
    pub async fn balance(&self, user_id: &str) -> Result<i64, RedemptionError> {
        Ok(self.ledger.balance(user_id).await?)
    }

    /// Create an account with zero balance if it does not exist.
    pub async fn register_account(&self, user_id: &str) -> Result<(), RedemptionError> {
        Ok(self.ledger.create_account(user_id).await?)
    }

    /// Audit-trail entries for a user, oldest first.
    pub async fn ledger_entries(&self, user_id: &str) -> Result<Vec<LedgerEntry>, RedemptionError> {
        Ok(self.log.entries_for_user(user_id).await?)
    }

    /// Get direct access to the voucher store.
    pub fn voucher_store(&self) -> &Arc<SqliteVoucherStore> {
        &self.vouchers
    }

    /// Get direct access to the ledger store.
    pub fn ledger_store(&self) -> &Arc<SqliteLedgerStore> {
        &self.ledger
    }

    /// Get direct access to the transaction log.
    pub fn transaction_log(&self) -> &Arc<SqliteTransactionLog> {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::Role;

    fn admin() -> AuthContext {
        AuthContext::new("admin@example.com", Role::Admin)
    }

    fn user() -> AuthContext {
        AuthContext::new("user@example.com", Role::User)
    }

    async fn billing() -> Billing {
        Billing::builder(BillingConfig::in_memory())
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_billing_config_in_memory() {
        let config = BillingConfig::in_memory();
        assert_eq!(config.database_path, ":memory:");
    }

    #[tokio::test]
    async fn test_billing_config_with_database() {
        let config = BillingConfig::with_database("/tmp/test.db");
        assert_eq!(config.database_path, "/tmp/test.db");
    }

    #[tokio::test]
    async fn test_billing_config_default() {
        let config = BillingConfig::default();
        assert_eq!(config.database_path, ":memory:");
    }

    #[tokio::test]
    async fn test_generate_voucher_requires_admin() {
        let billing = billing().await;

        let err = billing.generate_voucher(100, &user()).await.unwrap_err();
        assert!(matches!(err, RedemptionError::Forbidden));

        let voucher = billing.generate_voucher(100, &admin()).await.unwrap();
        assert_eq!(voucher.amount, 100);
    }

    #[tokio::test]
    async fn test_generate_voucher_rejects_non_positive_amount() {
        let billing = billing().await;

        let err = billing.generate_voucher(0, &admin()).await.unwrap_err();
        assert!(matches!(err, RedemptionError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_generate_and_redeem_roundtrip() {
        let billing = billing().await;
        let user = user();

        billing.register_account(&user.user_id).await.unwrap();
        let voucher = billing.generate_voucher(250, &admin()).await.unwrap();

        let outcome = billing.redeem_voucher(&user, &voucher.code).await.unwrap();

        assert_eq!(outcome.amount, 250);
        assert_eq!(outcome.new_balance, 250);
        assert_eq!(billing.balance(&user.user_id).await.unwrap(), 250);
    }

    #[tokio::test]
    async fn test_balance_unknown_user() {
        let billing = billing().await;

        let err = billing.balance("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, RedemptionError::UserNotFound));
    }

    #[tokio::test]
    async fn test_register_account_is_idempotent() {
        let billing = billing().await;

        billing.register_account("u@example.com").await.unwrap();
        billing.register_account("u@example.com").await.unwrap();

        assert_eq!(billing.balance("u@example.com").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ledger_entries_projection() {
        let billing = billing().await;
        let user = user();
        billing.register_account(&user.user_id).await.unwrap();

        let v1 = billing.generate_voucher(100, &admin()).await.unwrap();
        let v2 = billing.generate_voucher(50, &admin()).await.unwrap();
        billing.redeem_voucher(&user, &v1.code).await.unwrap();
        billing.redeem_voucher(&user, &v2.code).await.unwrap();

        let entries = billing.ledger_entries(&user.user_id).await.unwrap();
        assert_eq!(entries.len(), 2);

        let total: i64 = entries.iter().map(|e| e.amount).sum();
        assert_eq!(total, billing.balance(&user.user_id).await.unwrap());
    }
}
