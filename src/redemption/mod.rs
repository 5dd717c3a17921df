//! Redemption coordination: claim, credit, audit as one logical unit.
//!
//! The coordinator orchestrates the three stores but holds no state of
//! its own; it can run on any number of server instances concurrently.
//! All mutual exclusion for a voucher code lives in
//! [`VoucherStore::claim`], which the storage layer applies as a single
//! conditional operation.

use std::sync::Arc;

use backon::Retryable;
use tracing::{debug, error, info, warn};

use crate::codes;
use crate::config::RetryConfig;
use crate::error::RedemptionError;
use crate::interfaces::{LedgerEntry, LedgerStore, StorageError, TransactionLog, VoucherStore};

/// Result of a successful redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionOutcome {
    /// The redeemer's balance after the credit.
    pub new_balance: i64,
    /// The voucher's amount.
    pub amount: i64,
}

/// Orchestrates claim, credit, and audit log for voucher redemptions.
pub struct RedemptionCoordinator {
    vouchers: Arc<dyn VoucherStore>,
    ledger: Arc<dyn LedgerStore>,
    log: Arc<dyn TransactionLog>,
    retry: RetryConfig,
}

impl RedemptionCoordinator {
    /// Create a coordinator over the given stores.
    pub fn new(
        vouchers: Arc<dyn VoucherStore>,
        ledger: Arc<dyn LedgerStore>,
        log: Arc<dyn TransactionLog>,
    ) -> Self {
        Self {
            vouchers,
            ledger,
            log,
            retry: RetryConfig::default(),
        }
    }

    /// Override the retry policy for post-claim steps.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Redeem `code` for `user_id`.
    ///
    /// Exactly one of N concurrent calls for the same code succeeds; the
    /// rest fail with `VoucherAlreadyRedeemed` and produce no side
    /// effects. A caller whose own call timed out after the claim went
    /// through will also see `VoucherAlreadyRedeemed` on re-invocation:
    /// the voucher is never unclaimed, so the caller should treat that
    /// answer as "already completed" and confirm via the ledger.
    pub async fn redeem(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<RedemptionOutcome, RedemptionError> {
        if !codes::is_well_formed(code) {
            return Err(RedemptionError::InvalidRequest(format!(
                "malformed voucher code '{code}'"
            )));
        }

        // Race-elimination point. Losers and unknown codes exit here
        // with no side effects; the claim is never retried.
        let amount = self.vouchers.claim(code, user_id).await?;
        debug!(user_id, code, amount, "claim won");

        // The claim is durable now. Crediting is idempotent on the
        // code, so transient failures are retried; whatever still fails
        // leaves a claimed-but-uncredited voucher that must be flagged,
        // never rolled back.
        let new_balance = match self.credit_with_retry(user_id, amount, code).await {
            Ok(balance) => balance,
            Err(err) => {
                return Err(self.record_inconsistency(user_id, code, amount, err).await);
            }
        };

        // Audit is best-effort: the ledger and voucher state already
        // agree, so a log failure does not invalidate the redemption.
        let entry = LedgerEntry::voucher_redeem(user_id, amount, code);
        if let Err(err) = self.log.append(entry.clone()).await {
            warn!(code, error = %err, "transaction log append failed, retrying in background");
            self.retry_append_detached(entry);
        }

        info!(user_id, code, amount, new_balance, "voucher redeemed");

        Ok(RedemptionOutcome {
            new_balance,
            amount,
        })
    }

    async fn credit_with_retry(
        &self,
        user_id: &str,
        amount: i64,
        code: &str,
    ) -> Result<i64, StorageError> {
        (|| self.ledger.credit(user_id, amount, code))
            .retry(self.retry.backoff())
            .when(StorageError::is_transient)
            .notify(|err, dur| {
                warn!(code, error = %err, "credit failed transiently, retrying in {dur:?}");
            })
            .await
    }

    /// Flag a claimed-but-uncredited voucher for operator reconciliation.
    async fn record_inconsistency(
        &self,
        user_id: &str,
        code: &str,
        amount: i64,
        err: StorageError,
    ) -> RedemptionError {
        error!(
            user_id,
            code,
            amount,
            error = %err,
            "voucher claimed but credit failed, reconciliation required"
        );

        let entry = LedgerEntry::reconcile_required(user_id, amount, code);
        if let Err(log_err) = self.log.append(entry).await {
            warn!(code, error = %log_err, "could not record reconciliation entry");
        }

        RedemptionError::RedemptionInconsistency {
            code: code.to_string(),
            user_id: user_id.to_string(),
            detail: err.to_string(),
        }
    }

    /// Retry a failed audit append off the request path.
    fn retry_append_detached(&self, entry: LedgerEntry) {
        let log = Arc::clone(&self.log);
        let backoff = self.retry.backoff();

        tokio::spawn(async move {
            let result = (|| log.append(entry.clone()))
                .retry(backoff)
                .when(StorageError::is_transient)
                .await;

            match result {
                Ok(id) => info!(reference = %entry.reference, entry_id = %id, "audit entry appended after retry"),
                Err(err) => error!(
                    reference = %entry.reference,
                    error = %err,
                    "audit entry dropped after retries, ledger remains authoritative"
                ),
            }
        });
    }
}
