//! Append-only audit trail of ledger-affecting events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::voucher_store::Result;

/// Kind of a transaction-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// A voucher was redeemed and the balance credited.
    VoucherRedeem,
    /// A voucher was claimed but crediting failed permanently; the
    /// voucher-ledger pair needs operator reconciliation.
    ReconcileRequired,
}

impl EntryType {
    /// Stable storage encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoucherRedeem => "voucher_redeem",
            Self::ReconcileRequired => "reconcile_required",
        }
    }

    /// Decode from the storage encoding.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "voucher_redeem" => Some(Self::VoucherRedeem),
            "reconcile_required" => Some(Self::ReconcileRequired),
            _ => None,
        }
    }
}

/// An immutable audit record; never mutated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub entry_type: EntryType,
    pub user_id: String,
    pub amount: i64,
    /// Voucher code; doubles as the credit idempotency key.
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Entry for a completed redemption.
    pub fn voucher_redeem(user_id: &str, amount: i64, reference: &str) -> Self {
        Self::new(EntryType::VoucherRedeem, user_id, amount, reference)
    }

    /// Anomaly entry for a claimed-but-uncredited voucher.
    pub fn reconcile_required(user_id: &str, amount: i64, reference: &str) -> Self {
        Self::new(EntryType::ReconcileRequired, user_id, amount, reference)
    }

    fn new(entry_type: EntryType, user_id: &str, amount: i64, reference: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            entry_type,
            user_id: user_id.to_string(),
            amount,
            reference: reference.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Interface for audit-trail persistence.
///
/// The log is audit-only: voucher state and the ledger are the sources
/// of truth, and the absence of a log entry must never be read as proof
/// that a redemption did not happen.
///
/// Implementations:
/// - `SqliteTransactionLog`: SQLite storage
/// - `MockTransactionLog`: in-memory storage for tests
#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// Write an immutable record; returns its id.
    ///
    /// Never rejects on logical grounds, only on storage failure, which
    /// is retryable.
    async fn append(&self, entry: LedgerEntry) -> Result<Uuid>;

    /// All entries for a user, oldest first.
    async fn entries_for_user(&self, user_id: &str) -> Result<Vec<LedgerEntry>>;

    /// All entries referencing a voucher code, oldest first.
    async fn entries_for_reference(&self, reference: &str) -> Result<Vec<LedgerEntry>>;
}
