//! Public error taxonomy for the redemption engine.
//!
//! A closed set of typed error kinds is the only signal callers consume.
//! Backend diagnostic text rides along as display payload and is never
//! required to distinguish outcomes.

use crate::interfaces::StorageError;

/// Errors surfaced by the redemption engine.
#[derive(Debug, thiserror::Error)]
pub enum RedemptionError {
    /// Malformed input; caller error, not retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No voucher exists with the given code.
    #[error("Voucher not found")]
    VoucherNotFound,

    /// The voucher was already redeemed, by this or another user.
    ///
    /// A caller retrying its own timed-out `redeem` also lands here; it
    /// should reconcile via the ledger rather than report a hard failure.
    #[error("Voucher already redeemed")]
    VoucherAlreadyRedeemed,

    /// The referenced user account does not exist.
    #[error("User account not found")]
    UserNotFound,

    /// Voucher code generation kept colliding after bounded retries.
    #[error("Voucher code generation conflict")]
    GenerationConflict,

    /// Transient backend failure; safe for the caller to retry.
    #[error("Storage unavailable: {detail}")]
    StorageUnavailable { detail: String },

    /// The voucher was claimed but the credit could not be applied.
    ///
    /// Cross-entity state is inconsistent and needs operator
    /// reconciliation. The claim is never rolled back.
    #[error("Redemption inconsistency for voucher {code}, user {user_id}: {detail}")]
    RedemptionInconsistency {
        code: String,
        user_id: String,
        detail: String,
    },

    /// Caller lacks the role required for the operation.
    #[error("Forbidden")]
    Forbidden,
}

impl From<StorageError> for RedemptionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::VoucherNotFound { .. } => Self::VoucherNotFound,
            StorageError::VoucherAlreadyRedeemed { .. } => Self::VoucherAlreadyRedeemed,
            StorageError::UserNotFound { .. } => Self::UserNotFound,
            StorageError::GenerationConflict { .. } => Self::GenerationConflict,
            StorageError::InvalidAmount { amount } => {
                Self::InvalidRequest(format!("amount must be positive, got {amount}"))
            }
            StorageError::InvalidRecord { detail } => Self::StorageUnavailable { detail },
            StorageError::Unavailable { detail } => Self::StorageUnavailable { detail },
            #[cfg(feature = "sqlite")]
            StorageError::Database(e) => Self::StorageUnavailable {
                detail: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_conflicts_map_to_their_kinds() {
        let err: RedemptionError = StorageError::VoucherNotFound {
            code: "ZZZZZZZZ".into(),
        }
        .into();
        assert!(matches!(err, RedemptionError::VoucherNotFound));

        let err: RedemptionError = StorageError::VoucherAlreadyRedeemed {
            code: "ZZZZZZZZ".into(),
        }
        .into();
        assert!(matches!(err, RedemptionError::VoucherAlreadyRedeemed));

        let err: RedemptionError = StorageError::UserNotFound {
            user_id: "u@example.com".into(),
        }
        .into();
        assert!(matches!(err, RedemptionError::UserNotFound));
    }

    #[test]
    fn test_invalid_amount_maps_to_invalid_request() {
        let err: RedemptionError = StorageError::InvalidAmount { amount: -5 }.into();
        match err {
            RedemptionError::InvalidRequest(detail) => assert!(detail.contains("-5")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_transient_failure_maps_to_storage_unavailable() {
        let err: RedemptionError = StorageError::Unavailable {
            detail: "connection reset".into(),
        }
        .into();
        assert!(matches!(err, RedemptionError::StorageUnavailable { .. }));
    }
}
