use std::sync::Arc;

use crate::interfaces::{LedgerStore, StorageError, VoucherStatus, VoucherStore};

use super::{MockLedgerStore, MockVoucherStore};

#[tokio::test]
async fn test_mock_claim_is_exactly_once() {
    let store = Arc::new(MockVoucherStore::new());
    store.insert_unredeemed("AAAABBBB", 100).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.claim("AAAABBBB", &format!("user-{i}")).await
        }));
    }

    let mut winners = 0;
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(amount) => {
                assert_eq!(amount, 100);
                winners += 1;
            }
            Err(StorageError::VoucherAlreadyRedeemed { .. }) => losers += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(losers, 7);

    let voucher = store.get("AAAABBBB").await.unwrap();
    assert_eq!(voucher.status, VoucherStatus::Redeemed);
    assert!(voucher.redeemed_by.is_some());
    assert!(voucher.redeemed_at.is_some());
}

#[tokio::test]
async fn test_mock_claim_unknown_code() {
    let store = MockVoucherStore::new();
    let err = store.claim("ZZZZZZZZ", "user").await.unwrap_err();
    assert!(matches!(err, StorageError::VoucherNotFound { .. }));
}

#[tokio::test]
async fn test_mock_generate_rejects_non_positive_amount() {
    let store = MockVoucherStore::new();
    assert!(matches!(
        store.generate(0).await.unwrap_err(),
        StorageError::InvalidAmount { amount: 0 }
    ));
    assert!(matches!(
        store.generate(-10).await.unwrap_err(),
        StorageError::InvalidAmount { amount: -10 }
    ));
}

#[tokio::test]
async fn test_mock_credit_is_idempotent() {
    let ledger = MockLedgerStore::new();
    ledger.create_account("u@example.com").await.unwrap();

    let first = ledger.credit("u@example.com", 100, "AAAABBBB").await.unwrap();
    let second = ledger.credit("u@example.com", 100, "AAAABBBB").await.unwrap();

    assert_eq!(first, 100);
    assert_eq!(second, 100);
    assert_eq!(ledger.balance("u@example.com").await.unwrap(), 100);
}

#[tokio::test]
async fn test_mock_credit_lost_ack_then_retry_applies_once() {
    let ledger = MockLedgerStore::new();
    ledger.create_account("u@example.com").await.unwrap();
    ledger.set_fail_after_apply(1).await;

    // First attempt applies but reports failure, as if the caller timed out.
    let err = ledger.credit("u@example.com", 100, "AAAABBBB").await.unwrap_err();
    assert!(err.is_transient());

    // The retry replays via the idempotency record.
    let balance = ledger.credit("u@example.com", 100, "AAAABBBB").await.unwrap();
    assert_eq!(balance, 100);
    assert_eq!(ledger.balance("u@example.com").await.unwrap(), 100);
}

#[tokio::test]
async fn test_mock_credit_overflow_is_rejected() {
    let ledger = MockLedgerStore::new();
    ledger.create_account("u@example.com").await.unwrap();
    ledger.credit("u@example.com", i64::MAX, "K1").await.unwrap();

    let err = ledger.credit("u@example.com", 1, "K2").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidRecord { .. }));
    assert_eq!(ledger.balance("u@example.com").await.unwrap(), i64::MAX);
}

#[tokio::test]
async fn test_mock_credit_unknown_user() {
    let ledger = MockLedgerStore::new();
    let err = ledger.credit("ghost@example.com", 5, "K").await.unwrap_err();
    assert!(matches!(err, StorageError::UserNotFound { .. }));
}

#[tokio::test]
async fn test_mock_concurrent_credits_of_distinct_vouchers() {
    let ledger = Arc::new(MockLedgerStore::new());
    ledger.create_account("u@example.com").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger.credit("u@example.com", 10, &format!("code-{i}")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(ledger.balance("u@example.com").await.unwrap(), 100);
}
