//! Mock TransactionLog implementation for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::interfaces::voucher_store::Result;
use crate::interfaces::{LedgerEntry, StorageError, TransactionLog};

#[derive(Default)]
struct LogState {
    entries: Vec<LedgerEntry>,
    fail_on_append: bool,
    append_attempts: u32,
}

/// Mock transaction log that keeps entries in memory.
#[derive(Default)]
pub struct MockTransactionLog {
    state: RwLock<LogState>,
}

impl MockTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_append(&self, fail: bool) {
        self.state.write().await.fail_on_append = fail;
    }

    /// Number of append invocations observed, including failed ones.
    pub async fn append_attempts(&self) -> u32 {
        self.state.read().await.append_attempts
    }

    /// Snapshot of all entries in append order.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.state.read().await.entries.clone()
    }
}

#[async_trait]
impl TransactionLog for MockTransactionLog {
    async fn append(&self, entry: LedgerEntry) -> Result<Uuid> {
        let mut state = self.state.write().await;
        state.append_attempts += 1;

        if state.fail_on_append {
            return Err(StorageError::Unavailable {
                detail: "injected append failure".to_string(),
            });
        }

        let id = entry.id;
        state.entries.push(entry);
        Ok(id)
    }

    async fn entries_for_user(&self, user_id: &str) -> Result<Vec<LedgerEntry>> {
        Ok(self
            .state
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn entries_for_reference(&self, reference: &str) -> Result<Vec<LedgerEntry>> {
        Ok(self
            .state
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.reference == reference)
            .cloned()
            .collect())
    }
}
