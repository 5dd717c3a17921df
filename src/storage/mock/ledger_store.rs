//! Mock LedgerStore implementation for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::interfaces::voucher_store::Result;
use crate::interfaces::{LedgerStore, StorageError};

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<String, i64>,
    /// idempotency key -> balance computed when the credit applied
    credits: HashMap<String, i64>,
    /// Fail this many credit calls before applying anything.
    fail_before_apply: u32,
    /// Apply the credit but report failure, this many times. Simulates
    /// a lost acknowledgement: the increment is durable, the caller
    /// times out and retries.
    fail_after_apply: u32,
    credit_calls: u32,
}

/// Mock ledger store that keeps balances in memory.
#[derive(Default)]
pub struct MockLedgerStore {
    state: RwLock<LedgerState>,
}

impl MockLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_before_apply(&self, times: u32) {
        self.state.write().await.fail_before_apply = times;
    }

    pub async fn set_fail_after_apply(&self, times: u32) {
        self.state.write().await.fail_after_apply = times;
    }

    /// Number of credit invocations observed.
    pub async fn credit_calls(&self) -> u32 {
        self.state.read().await.credit_calls
    }
}

#[async_trait]
impl LedgerStore for MockLedgerStore {
    async fn credit(&self, user_id: &str, amount: i64, idempotency_key: &str) -> Result<i64> {
        let mut state = self.state.write().await;
        state.credit_calls += 1;

        if state.fail_before_apply > 0 {
            state.fail_before_apply -= 1;
            return Err(StorageError::Unavailable {
                detail: "injected credit failure".to_string(),
            });
        }

        if let Some(balance) = state.credits.get(idempotency_key) {
            return Ok(*balance);
        }

        let balance = state.accounts.get_mut(user_id).ok_or_else(|| {
            StorageError::UserNotFound {
                user_id: user_id.to_string(),
            }
        })?;
        let new_balance =
            balance
                .checked_add(amount)
                .ok_or_else(|| StorageError::InvalidRecord {
                    detail: format!("balance overflow crediting {amount} to {user_id}"),
                })?;
        *balance = new_balance;
        state
            .credits
            .insert(idempotency_key.to_string(), new_balance);

        if state.fail_after_apply > 0 {
            state.fail_after_apply -= 1;
            return Err(StorageError::Unavailable {
                detail: "injected lost acknowledgement".to_string(),
            });
        }

        Ok(new_balance)
    }

    async fn balance(&self, user_id: &str) -> Result<i64> {
        self.state
            .read()
            .await
            .accounts
            .get(user_id)
            .copied()
            .ok_or_else(|| StorageError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }

    async fn create_account(&self, user_id: &str) -> Result<()> {
        self.state
            .write()
            .await
            .accounts
            .entry(user_id.to_string())
            .or_insert(0);
        Ok(())
    }
}
