//! Mock VoucherStore implementation for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::codes;
use crate::interfaces::voucher_store::Result;
use crate::interfaces::{StorageError, Voucher, VoucherStatus, VoucherStore};

/// Mock voucher store that keeps vouchers in memory.
///
/// The write lock makes `claim` a single indivisible check-and-set, the
/// same guarantee the real store gets from its conditional UPDATE.
#[derive(Default)]
pub struct MockVoucherStore {
    vouchers: RwLock<HashMap<String, Voucher>>,
    fail_on_claim: RwLock<bool>,
}

impl MockVoucherStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_claim(&self, fail: bool) {
        *self.fail_on_claim.write().await = fail;
    }

    /// Seed an unredeemed voucher with a fixed code.
    pub async fn insert_unredeemed(&self, code: &str, amount: i64) {
        let voucher = Voucher {
            code: code.to_string(),
            amount,
            status: VoucherStatus::Unredeemed,
            redeemed_by: None,
            redeemed_at: None,
            created_at: Utc::now(),
        };
        self.vouchers
            .write()
            .await
            .insert(code.to_string(), voucher);
    }
}

#[async_trait]
impl VoucherStore for MockVoucherStore {
    async fn generate(&self, amount: i64) -> Result<Voucher> {
        if amount <= 0 {
            return Err(StorageError::InvalidAmount { amount });
        }

        let mut store = self.vouchers.write().await;
        for _ in 0..5 {
            let code = codes::generate_code();
            if store.contains_key(&code) {
                continue;
            }
            let voucher = Voucher {
                code: code.clone(),
                amount,
                status: VoucherStatus::Unredeemed,
                redeemed_by: None,
                redeemed_at: None,
                created_at: Utc::now(),
            };
            store.insert(code, voucher.clone());
            return Ok(voucher);
        }

        Err(StorageError::GenerationConflict { attempts: 5 })
    }

    async fn claim(&self, code: &str, user_id: &str) -> Result<i64> {
        if *self.fail_on_claim.read().await {
            return Err(StorageError::Unavailable {
                detail: "injected claim failure".to_string(),
            });
        }

        let mut store = self.vouchers.write().await;
        match store.get_mut(code) {
            None => Err(StorageError::VoucherNotFound {
                code: code.to_string(),
            }),
            Some(voucher) if voucher.status == VoucherStatus::Redeemed => {
                Err(StorageError::VoucherAlreadyRedeemed {
                    code: code.to_string(),
                })
            }
            Some(voucher) => {
                voucher.status = VoucherStatus::Redeemed;
                voucher.redeemed_by = Some(user_id.to_string());
                voucher.redeemed_at = Some(Utc::now());
                Ok(voucher.amount)
            }
        }
    }

    async fn get(&self, code: &str) -> Result<Voucher> {
        self.vouchers
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| StorageError::VoucherNotFound {
                code: code.to_string(),
            })
    }
}
