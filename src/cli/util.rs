use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::database::models::MonthKey;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn parse_money(s: &str) -> Option<Decimal> {
    s.trim().parse::<Decimal>().ok()
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
        .copied()
        .unwrap_or("?")
}

pub fn fmt_month(k: MonthKey) -> String {
    format!("{} {}", month_name(k.month), k.year)
}

pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

pub fn fmt_date(t: &NaiveDateTime) -> String {
    t.format("%Y-%m-%d").to_string()
}
