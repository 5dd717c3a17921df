//! SQLite VoucherStore implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_query::{Expr, Query, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::codes;
use crate::interfaces::voucher_store::Result;
use crate::interfaces::{StorageError, Voucher, VoucherStatus, VoucherStore};
use crate::storage::schema::{Vouchers, CREATE_VOUCHERS_TABLE};

/// How many collision-checked code draws before giving up.
const MAX_GENERATE_ATTEMPTS: u32 = 5;

/// SQLite implementation of VoucherStore.
pub struct SqliteVoucherStore {
    pool: SqlitePool,
}

impl SqliteVoucherStore {
    /// Create a new SQLite voucher store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_VOUCHERS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StorageError::InvalidRecord {
                detail: format!("bad timestamp '{raw}': {e}"),
            })
    }

    fn voucher_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Voucher> {
        let status_raw: String = row.get("status");
        let status = VoucherStatus::parse(&status_raw).ok_or_else(|| {
            StorageError::InvalidRecord {
                detail: format!("unknown voucher status '{status_raw}'"),
            }
        })?;

        let redeemed_at: Option<String> = row.get("redeemed_at");
        let redeemed_at = redeemed_at
            .as_deref()
            .map(Self::parse_timestamp)
            .transpose()?;

        let created_at: String = row.get("created_at");

        Ok(Voucher {
            code: row.get("code"),
            amount: row.get("amount"),
            status,
            redeemed_by: row.get("redeemed_by"),
            redeemed_at,
            created_at: Self::parse_timestamp(&created_at)?,
        })
    }
}

#[async_trait]
impl VoucherStore for SqliteVoucherStore {
    async fn generate(&self, amount: i64) -> Result<Voucher> {
        if amount <= 0 {
            return Err(StorageError::InvalidAmount { amount });
        }

        for attempt in 1..=MAX_GENERATE_ATTEMPTS {
            let code = codes::generate_code();
            let created_at = Utc::now();

            let query = Query::insert()
                .into_table(Vouchers::Table)
                .columns([
                    Vouchers::Code,
                    Vouchers::Amount,
                    Vouchers::Status,
                    Vouchers::CreatedAt,
                ])
                .values_panic([
                    code.clone().into(),
                    amount.into(),
                    VoucherStatus::Unredeemed.as_str().into(),
                    created_at.to_rfc3339().into(),
                ])
                .to_string(SqliteQueryBuilder);

            match sqlx::query(&query).execute(&self.pool).await {
                Ok(_) => {
                    return Ok(Voucher {
                        code,
                        amount,
                        status: VoucherStatus::Unredeemed,
                        redeemed_by: None,
                        redeemed_at: None,
                        created_at,
                    });
                }
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    debug!(attempt, "voucher code collision, drawing again");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::GenerationConflict {
            attempts: MAX_GENERATE_ATTEMPTS,
        })
    }

    async fn claim(&self, code: &str, user_id: &str) -> Result<i64> {
        // The conditional UPDATE is the entire race-elimination mechanism:
        // the status predicate is evaluated and applied indivisibly by
        // sqlite, so of N concurrent callers exactly one affects a row.
        let query = Query::update()
            .table(Vouchers::Table)
            .value(Vouchers::Status, VoucherStatus::Redeemed.as_str())
            .value(Vouchers::RedeemedBy, user_id)
            .value(Vouchers::RedeemedAt, Utc::now().to_rfc3339())
            .and_where(Expr::col(Vouchers::Code).eq(code))
            .and_where(Expr::col(Vouchers::Status).eq(VoucherStatus::Unredeemed.as_str()))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;

        if result.rows_affected() == 1 {
            // Winner. Amount is immutable, so this follow-up read cannot
            // race with anything.
            let query = Query::select()
                .column(Vouchers::Amount)
                .from(Vouchers::Table)
                .and_where(Expr::col(Vouchers::Code).eq(code))
                .to_string(SqliteQueryBuilder);

            let row = sqlx::query(&query).fetch_one(&self.pool).await?;
            return Ok(row.get("amount"));
        }

        // Zero rows: either the code does not exist or the voucher is
        // already redeemed. Status is monotonic, so the read-after-miss
        // cannot misclassify.
        let query = Query::select()
            .column(Vouchers::Status)
            .from(Vouchers::Table)
            .and_where(Expr::col(Vouchers::Code).eq(code))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(_) => Err(StorageError::VoucherAlreadyRedeemed {
                code: code.to_string(),
            }),
            None => Err(StorageError::VoucherNotFound {
                code: code.to_string(),
            }),
        }
    }

    async fn get(&self, code: &str) -> Result<Voucher> {
        let query = Query::select()
            .columns([
                Vouchers::Code,
                Vouchers::Amount,
                Vouchers::Status,
                Vouchers::RedeemedBy,
                Vouchers::RedeemedAt,
                Vouchers::CreatedAt,
            ])
            .from(Vouchers::Table)
            .and_where(Expr::col(Vouchers::Code).eq(code))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::VoucherNotFound {
                code: code.to_string(),
            })?;

        Self::voucher_from_row(&row)
    }
}
