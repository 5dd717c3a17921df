//! Voucher storage interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Voucher not found: {code}")]
    VoucherNotFound { code: String },

    #[error("Voucher already redeemed: {code}")]
    VoucherAlreadyRedeemed { code: String },

    #[error("Code generation conflict after {attempts} attempts")]
    GenerationConflict { attempts: u32 },

    #[error("Invalid voucher amount: {amount}")]
    InvalidAmount { amount: i64 },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Invalid stored record: {detail}")]
    InvalidRecord { detail: String },

    #[error("Storage unavailable: {detail}")]
    Unavailable { detail: String },

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Whether the caller may retry the failed operation.
    ///
    /// Only backend availability failures are transient. Logical
    /// conflicts never become retryable.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            #[cfg(feature = "sqlite")]
            Self::Database(_) => true,
            _ => false,
        }
    }
}

/// Lifecycle state of a voucher.
///
/// Monotonic: the only transition is Unredeemed to Redeemed, applied
/// exactly once by [`VoucherStore::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherStatus {
    Unredeemed,
    Redeemed,
}

impl VoucherStatus {
    /// Stable storage encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unredeemed => "unredeemed",
            Self::Redeemed => "redeemed",
        }
    }

    /// Decode from the storage encoding.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unredeemed" => Some(Self::Unredeemed),
            "redeemed" => Some(Self::Redeemed),
            _ => None,
        }
    }
}

/// A single-use token entitling its redeemer to a fixed balance credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voucher {
    /// Unique, immutable, generated code.
    pub code: String,
    /// Credit amount in minor units; immutable, always positive.
    pub amount: i64,
    pub status: VoucherStatus,
    /// Set iff status is Redeemed.
    pub redeemed_by: Option<String>,
    /// Set iff status is Redeemed.
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Interface for voucher persistence.
///
/// Implementations:
/// - `SqliteVoucherStore`: SQLite storage
/// - `MockVoucherStore`: in-memory storage for tests
#[async_trait]
pub trait VoucherStore: Send + Sync {
    /// Create a voucher with a freshly generated unique code.
    ///
    /// Collisions with existing codes are retried a bounded number of
    /// times; exhaustion fails with `GenerationConflict`. Non-positive
    /// amounts fail with `InvalidAmount` before touching storage.
    async fn generate(&self, amount: i64) -> Result<Voucher>;

    /// Atomically transition a voucher from Unredeemed to Redeemed.
    ///
    /// The sole operation allowed to change voucher status, and the sole
    /// synchronization point for concurrent redemptions of one code. The
    /// transition is a single conditional operation applied indivisibly
    /// by the storage layer; of N concurrent callers exactly one
    /// observes `Ok(amount)`, the rest `VoucherAlreadyRedeemed`.
    async fn claim(&self, code: &str, user_id: &str) -> Result<i64>;

    /// Read a voucher back, for reconciliation and audit.
    async fn get(&self, code: &str) -> Result<Voucher>;
}
