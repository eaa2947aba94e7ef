// Death committee: monthly subscriptions, dependents and funeral payouts.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    Overdue,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] =
        [PaymentStatus::Paid, PaymentStatus::Unpaid, PaymentStatus::Overdue];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "PAID",
            Self::Unpaid => "UNPAID",
            Self::Overdue => "OVERDUE",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown payment status '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeceasedStatus {
    Alive,
    Deceased,
}

impl DeceasedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alive => "ALIVE",
            Self::Deceased => "DECEASED",
        }
    }
}

impl FromStr for DeceasedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("DECEASED") {
            Ok(Self::Deceased)
        } else if s.eq_ignore_ascii_case("ALIVE") {
            Ok(Self::Alive)
        } else {
            Err(format!("Unknown deceased status '{s}'"))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitteeMember {
    pub id: i64,
    pub user_id: i64,
    pub monthly_fee: Decimal,
    pub status: PaymentStatus,
    pub deceased_status: DeceasedStatus,
    pub deceased_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: i64,
    pub member_id: i64,
    pub month: u32,
    pub year: i32,
    pub amount: Decimal,
    pub is_paid: bool,
    pub payment_proof: Option<String>,
    pub paid_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dependent {
    pub id: i64,
    pub member_id: i64,
    pub name: String,
    pub relation: String,
    pub age: i64,
    pub nic: Option<String>,
    pub deceased_status: DeceasedStatus,
    pub deceased_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct FuneralPayout {
    pub id: i64,
    pub member_id: i64,
    pub dependent_id: Option<i64>,
    pub amount: Decimal,
    pub receiver_name: String,
    pub receiver_relation: String,
    pub notes: Option<String>,
    pub payout_date: NaiveDateTime,
}

/// Payout row for the admin history, with the names it refers to.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutRecord {
    #[serde(flatten)]
    pub payout: FuneralPayout,
    pub member_name: String,
    pub member_email: String,
    pub dependent_name: Option<String>,
    pub dependent_relation: Option<String>,
}

/// A committee record with everything hanging off it.
#[derive(Debug, Clone, Serialize)]
pub struct CommitteeMemberDetail {
    #[serde(flatten)]
    pub member: CommitteeMember,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: Option<String>,
    pub subscriptions: Vec<Subscription>, // newest month first
    pub dependents: Vec<Dependent>,
    pub payouts: Vec<FuneralPayout>,
}

impl CommitteeMemberDetail {
    pub fn payout_count(&self) -> usize {
        self.payouts.len()
    }

    pub fn subscription_for(&self, month: u32, year: i32) -> Option<&Subscription> {
        self.subscriptions
            .iter()
            .find(|s| s.month == month && s.year == year)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDependent {
    pub name: String,
    pub relation: String,
    pub age: i64,
    pub nic: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPayout {
    pub amount: Decimal,
    pub receiver_name: String,
    pub receiver_relation: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum DeceasedTarget {
    /// Identified by the user id of the member.
    Member(i64),
    Dependent(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self { year: date.year(), month: date.month() }
    }

    pub fn next(self) -> Self {
        if self.month >= 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutstandingBalance {
    pub total_outstanding: Decimal,
    pub overdue_count: usize,
    pub missing_months: Vec<MonthKey>,
    pub monthly_fee: Decimal,
}

impl OutstandingBalance {
    pub fn derived_status(&self) -> PaymentStatus {
        if self.overdue_count > 0 {
            PaymentStatus::Overdue
        } else {
            PaymentStatus::Paid
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinancialHealth {
    pub total_collected: Decimal,
    pub total_paid_out: Decimal,
    pub net_balance: Decimal,
    pub subscription_count: i64,
    pub payout_count: i64,
}
