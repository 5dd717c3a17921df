//! SQLite implementations of storage interfaces.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

mod ledger_store;
mod transaction_log;
mod voucher_store;

pub use ledger_store::SqliteLedgerStore;
pub use transaction_log::SqliteTransactionLog;
pub use voucher_store::SqliteVoucherStore;

/// Open a pool for the given database path.
///
/// `:memory:` gets a single-connection pool: sqlite creates one private
/// in-memory database per connection, so a larger pool would scatter
/// tables across databases.
pub async fn connect(path: &str) -> Result<SqlitePool, sqlx::Error> {
    if path == ":memory:" {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
    } else {
        SqlitePool::connect(&format!("sqlite:{path}?mode=rwc")).await
    }
}
