//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Vouchers table schema.
#[derive(Iden)]
pub enum Vouchers {
    Table,
    #[iden = "code"]
    Code,
    #[iden = "amount"]
    Amount,
    #[iden = "status"]
    Status,
    #[iden = "redeemed_by"]
    RedeemedBy,
    #[iden = "redeemed_at"]
    RedeemedAt,
    #[iden = "created_at"]
    CreatedAt,
}

/// Accounts table schema.
#[derive(Iden)]
pub enum Accounts {
    Table,
    #[iden = "user_id"]
    UserId,
    #[iden = "balance"]
    Balance,
}

/// Transaction-log table schema.
#[derive(Iden)]
pub enum LedgerEntries {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "entry_type"]
    EntryType,
    #[iden = "user_id"]
    UserId,
    #[iden = "amount"]
    Amount,
    #[iden = "reference"]
    Reference,
    #[iden = "created_at"]
    CreatedAt,
}

/// Credit idempotency-record table schema.
#[derive(Iden)]
pub enum Credits {
    Table,
    #[iden = "idempotency_key"]
    IdempotencyKey,
    #[iden = "user_id"]
    UserId,
    #[iden = "amount"]
    Amount,
    #[iden = "balance_after"]
    BalanceAfter,
    #[iden = "applied_at"]
    AppliedAt,
}

/// SQL for creating the vouchers table.
pub const CREATE_VOUCHERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS vouchers (
    code TEXT PRIMARY KEY,
    amount INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'unredeemed',
    redeemed_by TEXT,
    redeemed_at TEXT,
    created_at TEXT NOT NULL
)
"#;

/// SQL for creating the accounts table.
pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    user_id TEXT PRIMARY KEY,
    balance INTEGER NOT NULL DEFAULT 0
)
"#;

/// SQL for creating the transaction-log table and its indexes.
///
/// One statement per constant; the sqlite driver prepares statements
/// individually.
pub const CREATE_LEDGER_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ledger_entries (
    id TEXT PRIMARY KEY,
    entry_type TEXT NOT NULL,
    user_id TEXT NOT NULL,
    amount INTEGER NOT NULL,
    reference TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

pub const CREATE_LEDGER_ENTRIES_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_ledger_entries_user ON ledger_entries(user_id)";

pub const CREATE_LEDGER_ENTRIES_REFERENCE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_ledger_entries_reference ON ledger_entries(reference)";

/// SQL for creating the credit idempotency-record table.
pub const CREATE_CREDITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS credits (
    idempotency_key TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    amount INTEGER NOT NULL,
    balance_after INTEGER NOT NULL,
    applied_at TEXT NOT NULL
)
"#;
