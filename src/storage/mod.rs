//! Storage implementations.

#[cfg(feature = "sqlite")]
use std::sync::Arc;

#[cfg(feature = "sqlite")]
use tracing::info;

#[cfg(feature = "sqlite")]
use crate::config::StorageConfig;
#[cfg(feature = "sqlite")]
use crate::interfaces::{LedgerStore, TransactionLog, VoucherStore};

#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteLedgerStore, SqliteTransactionLog, SqliteVoucherStore};

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockLedgerStore, MockTransactionLog, MockVoucherStore};

/// Initialize storage based on configuration.
///
/// Returns the (VoucherStore, LedgerStore, TransactionLog) triple for
/// the configured storage type.
#[cfg(feature = "sqlite")]
pub async fn init_storage(
    config: &StorageConfig,
) -> Result<
    (
        Arc<dyn VoucherStore>,
        Arc<dyn LedgerStore>,
        Arc<dyn TransactionLog>,
    ),
    Box<dyn std::error::Error>,
> {
    info!("Storage: {} at {}", config.storage_type, config.path);

    match config.storage_type.as_str() {
        "sqlite" => {
            if config.path != ":memory:" {
                if let Some(parent) = std::path::Path::new(&config.path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
            }

            let pool = sqlite::connect(&config.path).await?;

            let voucher_store = Arc::new(SqliteVoucherStore::new(pool.clone()));
            voucher_store.init().await?;

            let ledger_store = Arc::new(SqliteLedgerStore::new(pool.clone()));
            ledger_store.init().await?;

            let transaction_log = Arc::new(SqliteTransactionLog::new(pool));
            transaction_log.init().await?;

            Ok((voucher_store, ledger_store, transaction_log))
        }
        other => Err(format!("Unknown storage type: {other}").into()),
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_storage_sqlite_in_memory() {
        let config = StorageConfig {
            storage_type: "sqlite".to_string(),
            path: ":memory:".to_string(),
        };

        let (vouchers, ledger, log) = init_storage(&config).await.unwrap();

        let voucher = vouchers.generate(42).await.unwrap();
        ledger.create_account("u@example.com").await.unwrap();
        let amount = vouchers.claim(&voucher.code, "u@example.com").await.unwrap();
        assert_eq!(amount, 42);
        assert!(log.entries_for_user("u@example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_init_storage_rejects_unknown_type() {
        let config = StorageConfig {
            storage_type: "papertape".to_string(),
            path: ":memory:".to_string(),
        };

        assert!(init_storage(&config).await.is_err());
    }
}
