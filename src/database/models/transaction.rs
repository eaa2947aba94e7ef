use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ServiceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 3] = [
        TransactionStatus::Pending,
        TransactionStatus::Approved,
        TransactionStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown transaction status '{s}'"))
    }
}

/// A donation, joined with the service and donor it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub amount: Decimal,
    pub service_id: i64,
    pub service_name: String,
    pub service_type: ServiceType,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub notes: Option<String>,
    pub payment_proof: Option<String>,
    pub status: TransactionStatus,
    pub approved_by: Option<i64>,
    pub approved_at: Option<NaiveDateTime>, // set only while APPROVED
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub service_id: i64,
    pub notes: Option<String>,
    pub payment_proof: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub service_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTotal {
    pub amount: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransactionStats {
    pub pending: StatusTotal,
    pub approved: StatusTotal,
    pub rejected: StatusTotal,
}
