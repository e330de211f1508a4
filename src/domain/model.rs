use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::utils::error::{JournalError, Result};

// ─── 部署相關 ──────────────────────────────────────────────────────────────────

/// 版本比較運算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "~=")]
    Compatible,
}

impl VersionOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionOp::Eq => "==",
            VersionOp::Ne => "!=",
            VersionOp::Ge => ">=",
            VersionOp::Le => "<=",
            VersionOp::Gt => ">",
            VersionOp::Lt => "<",
            VersionOp::Compatible => "~=",
        }
    }
}

/// 依賴清單中的一筆套件描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    pub constraint: Option<(VersionOp, String)>,
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some((op, version)) => write!(f, "{}{}{}", self.name, op.as_str(), version),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: Option<String>,
    pub specifier: String,
}

// ─── 交易日誌 ──────────────────────────────────────────────────────────────────

/// 以「分」儲存的金額，對應 Numeric(12,2)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);
    pub const MAX_CENTS: i64 = 999_999_999_999;

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// 解析表單輸入的金額字串
    pub fn parse(field: &str, input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let value: f64 = trimmed.parse().map_err(|_| JournalError::ValidationError {
            message: format!("'{}' is not a valid amount for {}", trimmed, field),
        })?;

        if !value.is_finite() {
            return Err(JournalError::ValidationError {
                message: format!("'{}' is not a valid amount for {}", trimmed, field),
            });
        }

        let cents = (value * 100.0).round();
        if cents.abs() > Self::MAX_CENTS as f64 {
            return Err(JournalError::ValidationError {
                message: format!("{} exceeds the maximum amount", field),
            });
        }

        Ok(Self(cents as i64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl User {
    pub fn hash_password(password: &str) -> String {
        hex::encode(Sha256::digest(password.as_bytes()))
    }

    pub fn check_password(&self, password: &str) -> bool {
        self.password_hash == Self::hash_password(password)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdraw" => Ok(TransactionKind::Withdraw),
            other => Err(JournalError::ValidationError {
                message: format!("unknown transaction type '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub kind: TransactionKind,
    pub amount: Money,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyTrade {
    pub id: i64,
    pub user_id: i64,
    pub trade_date: NaiveDate,
    pub profit: Money,
    pub loss: Money,
    pub reason_profit: String,
    pub reason_loss: String,
}

/// 每日紀錄表單送出的內容
#[derive(Debug, Clone, Default)]
pub struct DailyTradeInput {
    pub profit: Money,
    pub loss: Money,
    pub reason_profit: String,
    pub reason_loss: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub active_balance: Money,
    pub deposit_amount: Money,
    pub withdraw_amount: Money,
    pub total_pl: Money,
    pub tips: String,
    pub lessons: String,
}

impl DashboardSummary {
    /// 可用餘額 = 存入 − 提領 + 獲利 − 虧損
    pub fn compute(
        deposits: Money,
        withdrawals: Money,
        profit: Money,
        loss: Money,
        tips: String,
        lessons: String,
    ) -> Self {
        let total_pl = profit - loss;
        Self {
            active_balance: deposits - withdrawals + total_pl,
            deposit_amount: deposits,
            withdraw_amount: withdrawals,
            total_pl,
            tips,
            lessons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_parse_and_display() {
        assert_eq!(Money::parse("amount", "12.34").unwrap().cents(), 1234);
        assert_eq!(Money::parse("amount", " 100 ").unwrap().cents(), 10000);
        assert_eq!(Money::parse("amount", "2.499").unwrap().cents(), 250);
        assert_eq!(Money::from_cents(-50).to_string(), "-0.50");
        assert_eq!(Money::from_cents(123456).to_string(), "1234.56");
        assert!(Money::parse("amount", "abc").is_err());
        assert!(Money::parse("amount", "inf").is_err());
        assert!(Money::parse("amount", "10000000000").is_err());
    }

    #[test]
    fn test_money_serializes_as_number() {
        let json = serde_json::to_string(&Money::from_cents(1050)).unwrap();
        assert_eq!(json, "10.5");
    }

    #[test]
    fn test_password_hash_is_hex_sha256() {
        let hash = User::hash_password("secret");
        assert_eq!(
            hash,
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
        );
        let user = User {
            id: 1,
            username: "alice".to_string(),
            password_hash: hash,
        };
        assert!(user.check_password("secret"));
        assert!(!user.check_password("Secret"));
    }

    #[test]
    fn test_dashboard_balance() {
        let summary = DashboardSummary::compute(
            Money::from_cents(100_000),
            Money::from_cents(20_000),
            Money::from_cents(5_000),
            Money::from_cents(1_500),
            String::new(),
            String::new(),
        );
        assert_eq!(summary.total_pl.cents(), 3_500);
        assert_eq!(summary.active_balance.cents(), 83_500);
    }

    #[test]
    fn test_package_spec_display() {
        let spec = PackageSpec {
            name: "axum".to_string(),
            constraint: Some((VersionOp::Ge, "0.7".to_string())),
        };
        assert_eq!(spec.to_string(), "axum>=0.7");
    }
}
