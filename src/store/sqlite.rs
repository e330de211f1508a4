//! SQLite adapter for the journal store.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

use crate::domain::model::{DailyTrade, DailyTradeInput, Money, Transaction, TransactionKind, User};
use crate::domain::ports::JournalStore;
use crate::utils::error::{JournalError, Result};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS "user" (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "transaction" (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES "user"(id),
        kind TEXT NOT NULL CHECK (kind IN ('deposit', 'withdraw')),
        amount INTEGER NOT NULL,
        timestamp TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS daily_trade (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES "user"(id),
        trade_date TEXT NOT NULL,
        profit INTEGER NOT NULL DEFAULT 0,
        loss INTEGER NOT NULL DEFAULT 0,
        reason_profit TEXT NOT NULL DEFAULT '',
        reason_loss TEXT NOT NULL DEFAULT '',
        CONSTRAINT uix_user_date UNIQUE (user_id, trade_date)
    )
    "#,
];

/// 以 SQLite 儲存使用者、存提款與每日損益
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// 連線並建立資料表。記憶體資料庫只使用單一連線，否則每條連線各自是一個空資料庫
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.ensure_schema().await?;

        tracing::info!("🗄️  Database ready ({})", if in_memory { "in-memory" } else { url });
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
    })
}

fn daily_from_row(row: &SqliteRow) -> Result<DailyTrade> {
    let date: String = row.try_get("trade_date")?;
    let trade_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| JournalError::ValidationError {
        message: format!("stored trade date '{}' is invalid: {}", date, e),
    })?;

    Ok(DailyTrade {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        trade_date,
        profit: Money::from_cents(row.try_get("profit")?),
        loss: Money::from_cents(row.try_get("loss")?),
        reason_profit: row.try_get("reason_profit")?,
        reason_loss: row.try_get("reason_loss")?,
    })
}

#[async_trait]
impl JournalStore for SqliteStore {
    async fn table_names(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(JournalError::from))
            .collect()
    }

    async fn count_users(&self) -> Result<i64> {
        let row = sqlx::query(r#"SELECT COUNT(*) AS n FROM "user""#)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let result = sqlx::query(
            r#"INSERT INTO "user" (username, password_hash) VALUES (?, ?) RETURNING id, username, password_hash"#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => user_from_row(&row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(JournalError::ConflictError {
                message: "Username already exists".to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(r#"SELECT id, username, password_hash FROM "user" WHERE id = ?"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_name(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(r#"SELECT id, username, password_hash FROM "user" WHERE username = ?"#)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn add_transaction(&self, user_id: i64, kind: TransactionKind, amount: Money) -> Result<Transaction> {
        let timestamp = Utc::now();
        let row = sqlx::query(
            r#"INSERT INTO "transaction" (user_id, kind, amount, timestamp) VALUES (?, ?, ?, ?) RETURNING id"#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(amount.cents())
        .bind(timestamp.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        Ok(Transaction {
            id: row.try_get("id")?,
            user_id,
            kind,
            amount,
            timestamp,
        })
    }

    async fn transaction_totals(&self, user_id: i64) -> Result<(Money, Money)> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'deposit' THEN amount ELSE 0 END), 0) AS deposits,
                COALESCE(SUM(CASE WHEN kind = 'withdraw' THEN amount ELSE 0 END), 0) AS withdrawals
            FROM "transaction"
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((
            Money::from_cents(row.try_get("deposits")?),
            Money::from_cents(row.try_get("withdrawals")?),
        ))
    }

    async fn daily_trade(&self, user_id: i64, date: NaiveDate) -> Result<Option<DailyTrade>> {
        let row = sqlx::query("SELECT * FROM daily_trade WHERE user_id = ? AND trade_date = ?")
            .bind(user_id)
            .bind(date.format("%Y-%m-%d").to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(daily_from_row).transpose()
    }

    async fn upsert_daily_trade(&self, user_id: i64, date: NaiveDate, input: &DailyTradeInput) -> Result<DailyTrade> {
        let row = sqlx::query(
            r#"
            INSERT INTO daily_trade (user_id, trade_date, profit, loss, reason_profit, reason_loss)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, trade_date) DO UPDATE SET
                profit = excluded.profit,
                loss = excluded.loss,
                reason_profit = excluded.reason_profit,
                reason_loss = excluded.reason_loss
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(date.format("%Y-%m-%d").to_string())
        .bind(input.profit.cents())
        .bind(input.loss.cents())
        .bind(input.reason_profit.as_str())
        .bind(input.reason_loss.as_str())
        .fetch_one(&self.pool)
        .await?;

        daily_from_row(&row)
    }

    async fn daily_trades(&self, user_id: i64) -> Result<Vec<DailyTrade>> {
        let rows = sqlx::query("SELECT * FROM daily_trade WHERE user_id = ? ORDER BY trade_date")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(daily_from_row).collect()
    }

    async fn pl_totals(&self, user_id: i64) -> Result<(Money, Money)> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(profit), 0) AS profit, COALESCE(SUM(loss), 0) AS loss FROM daily_trade WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((
            Money::from_cents(row.try_get("profit")?),
            Money::from_cents(row.try_get("loss")?),
        ))
    }
}
