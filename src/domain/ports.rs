use crate::domain::model::{
    DailyTrade, DailyTradeInput, InstalledPackage, Money, PackageSpec, Transaction, TransactionKind,
    User,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::Path;

/// 將清單中的一個套件安裝到映像的依賴目錄
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, package: &PackageSpec, target_dir: &Path) -> Result<InstalledPackage>;
}

#[async_trait]
pub trait JournalStore: Send + Sync {
    async fn table_names(&self) -> Result<Vec<String>>;
    async fn count_users(&self) -> Result<i64>;
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;
    async fn find_user(&self, id: i64) -> Result<Option<User>>;
    async fn find_user_by_name(&self, username: &str) -> Result<Option<User>>;

    async fn add_transaction(
        &self,
        user_id: i64,
        kind: TransactionKind,
        amount: Money,
    ) -> Result<Transaction>;
    /// 回傳 (存入總額, 提領總額)
    async fn transaction_totals(&self, user_id: i64) -> Result<(Money, Money)>;

    async fn daily_trade(&self, user_id: i64, date: NaiveDate) -> Result<Option<DailyTrade>>;
    async fn upsert_daily_trade(
        &self,
        user_id: i64,
        date: NaiveDate,
        input: &DailyTradeInput,
    ) -> Result<DailyTrade>;
    async fn daily_trades(&self, user_id: i64) -> Result<Vec<DailyTrade>>;
    /// 回傳 (獲利總額, 虧損總額)
    async fn pl_totals(&self, user_id: i64) -> Result<(Money, Money)>;
}

/// 產生交易建議的外部服務；失敗時以文字說明回傳，不會讓請求失敗
#[async_trait]
pub trait AdviceProvider: Send + Sync {
    async fn advise(&self, prompt: &str) -> String;
}
