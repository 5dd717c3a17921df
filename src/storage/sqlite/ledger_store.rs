//! SQLite LedgerStore implementation.

use async_trait::async_trait;
use chrono::Utc;
use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::interfaces::voucher_store::Result;
use crate::interfaces::{LedgerStore, StorageError};
use crate::storage::schema::{Accounts, Credits, CREATE_ACCOUNTS_TABLE, CREATE_CREDITS_TABLE};

/// SQLite implementation of LedgerStore.
///
/// The balance update and the idempotency record are written in one
/// transaction, so a credit either fully applies with its key durably
/// recorded, or not at all.
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    /// Create a new SQLite ledger store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_ACCOUNTS_TABLE)
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_CREDITS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Apply a credit within an already-started transaction.
    async fn apply_credit(
        conn: &mut SqliteConnection,
        user_id: &str,
        amount: i64,
        idempotency_key: &str,
    ) -> Result<i64> {
        // Replay check: a key already present means this credit was
        // durably applied by an earlier attempt.
        let query = Query::select()
            .column(Credits::BalanceAfter)
            .from(Credits::Table)
            .and_where(Expr::col(Credits::IdempotencyKey).eq(idempotency_key))
            .to_string(SqliteQueryBuilder);

        if let Some(row) = sqlx::query(&query).fetch_optional(&mut *conn).await? {
            return Ok(row.get("balance_after"));
        }

        let query = Query::select()
            .column(Accounts::Balance)
            .from(Accounts::Table)
            .and_where(Expr::col(Accounts::UserId).eq(user_id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StorageError::UserNotFound {
                user_id: user_id.to_string(),
            })?;

        let balance: i64 = row.get("balance");
        let new_balance =
            balance
                .checked_add(amount)
                .ok_or_else(|| StorageError::InvalidRecord {
                    detail: format!(
                        "balance overflow crediting {amount} to {user_id} at balance {balance}"
                    ),
                })?;

        // The write lock held by BEGIN IMMEDIATE serializes concurrent
        // credits to the same account; this update cannot lose one.
        let query = Query::update()
            .table(Accounts::Table)
            .value(Accounts::Balance, new_balance)
            .and_where(Expr::col(Accounts::UserId).eq(user_id))
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&mut *conn).await?;

        let query = Query::insert()
            .into_table(Credits::Table)
            .columns([
                Credits::IdempotencyKey,
                Credits::UserId,
                Credits::Amount,
                Credits::BalanceAfter,
                Credits::AppliedAt,
            ])
            .values_panic([
                idempotency_key.into(),
                user_id.into(),
                amount.into(),
                new_balance.into(),
                Utc::now().to_rfc3339().into(),
            ])
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&mut *conn).await?;

        Ok(new_balance)
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn credit(&self, user_id: &str, amount: i64, idempotency_key: &str) -> Result<i64> {
        // BEGIN IMMEDIATE acquires the write lock upfront, preventing deadlocks
        // when concurrent DEFERRED transactions race to upgrade from shared to exclusive.
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result = Self::apply_credit(&mut conn, user_id, amount, idempotency_key).await;

        match result {
            Ok(balance) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(balance)
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(e)
            }
        }
    }

    async fn balance(&self, user_id: &str) -> Result<i64> {
        let query = Query::select()
            .column(Accounts::Balance)
            .from(Accounts::Table)
            .and_where(Expr::col(Accounts::UserId).eq(user_id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::UserNotFound {
                user_id: user_id.to_string(),
            })?;

        Ok(row.get("balance"))
    }

    async fn create_account(&self, user_id: &str) -> Result<()> {
        let query = Query::insert()
            .into_table(Accounts::Table)
            .columns([Accounts::UserId, Accounts::Balance])
            .values_panic([user_id.into(), 0i64.into()])
            .on_conflict(
                OnConflict::column(Accounts::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }
}
