//! SQLite TransactionLog implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::interfaces::voucher_store::Result;
use crate::interfaces::{EntryType, LedgerEntry, StorageError, TransactionLog};
use crate::storage::schema::{
    LedgerEntries, CREATE_LEDGER_ENTRIES_REFERENCE_INDEX, CREATE_LEDGER_ENTRIES_TABLE,
    CREATE_LEDGER_ENTRIES_USER_INDEX,
};

/// SQLite implementation of TransactionLog.
pub struct SqliteTransactionLog {
    pool: SqlitePool,
}

impl SqliteTransactionLog {
    /// Create a new SQLite transaction log.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_LEDGER_ENTRIES_TABLE)
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_LEDGER_ENTRIES_USER_INDEX)
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_LEDGER_ENTRIES_REFERENCE_INDEX)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<LedgerEntry> {
        let id_raw: String = row.get("id");
        let id = Uuid::parse_str(&id_raw).map_err(|e| StorageError::InvalidRecord {
            detail: format!("bad entry id '{id_raw}': {e}"),
        })?;

        let type_raw: String = row.get("entry_type");
        let entry_type =
            EntryType::parse(&type_raw).ok_or_else(|| StorageError::InvalidRecord {
                detail: format!("unknown entry type '{type_raw}'"),
            })?;

        let created_raw: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StorageError::InvalidRecord {
                detail: format!("bad timestamp '{created_raw}': {e}"),
            })?;

        Ok(LedgerEntry {
            id,
            entry_type,
            user_id: row.get("user_id"),
            amount: row.get("amount"),
            reference: row.get("reference"),
            created_at,
        })
    }

    async fn fetch_ordered(&self, filter_col: LedgerEntries, value: &str) -> Result<Vec<LedgerEntry>> {
        let query = Query::select()
            .columns([
                LedgerEntries::Id,
                LedgerEntries::EntryType,
                LedgerEntries::UserId,
                LedgerEntries::Amount,
                LedgerEntries::Reference,
                LedgerEntries::CreatedAt,
            ])
            .from(LedgerEntries::Table)
            .and_where(Expr::col(filter_col).eq(value))
            .order_by(LedgerEntries::CreatedAt, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(Self::entry_from_row(&row)?);
        }

        Ok(entries)
    }
}

#[async_trait]
impl TransactionLog for SqliteTransactionLog {
    async fn append(&self, entry: LedgerEntry) -> Result<Uuid> {
        let query = Query::insert()
            .into_table(LedgerEntries::Table)
            .columns([
                LedgerEntries::Id,
                LedgerEntries::EntryType,
                LedgerEntries::UserId,
                LedgerEntries::Amount,
                LedgerEntries::Reference,
                LedgerEntries::CreatedAt,
            ])
            .values_panic([
                entry.id.to_string().into(),
                entry.entry_type.as_str().into(),
                entry.user_id.clone().into(),
                entry.amount.into(),
                entry.reference.clone().into(),
                entry.created_at.to_rfc3339().into(),
            ])
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;

        Ok(entry.id)
    }

    async fn entries_for_user(&self, user_id: &str) -> Result<Vec<LedgerEntry>> {
        self.fetch_ordered(LedgerEntries::UserId, user_id).await
    }

    async fn entries_for_reference(&self, reference: &str) -> Result<Vec<LedgerEntry>> {
        self.fetch_ordered(LedgerEntries::Reference, reference).await
    }
}
