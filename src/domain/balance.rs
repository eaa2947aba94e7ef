//! Outstanding death committee fees, walked month by month from the join date.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::database::models::{MonthKey, OutstandingBalance, Subscription};

fn key(s: &Subscription) -> MonthKey {
    MonthKey::new(s.year, s.month)
}

/// Every month from `joined` up to and including the month of `today` must
/// have a paid record. Unpaid months before the current one are overdue and
/// owe the recorded amount, or `monthly_fee` when nothing was recorded.
/// Unpaid records dated before the join month still count when they are past.
pub fn outstanding_balance(
    joined: NaiveDate,
    today: NaiveDate,
    monthly_fee: Decimal,
    subscriptions: &[Subscription],
) -> OutstandingBalance {
    let first = MonthKey::of(joined);
    let current = MonthKey::of(today);

    let mut total_outstanding = Decimal::ZERO;
    let mut overdue_count = 0;
    let mut missing_months = Vec::new();

    let mut month = first;
    while month <= current {
        let record = subscriptions.iter().find(|s| key(s) == month);
        if !record.is_some_and(|s| s.is_paid) {
            missing_months.push(month);
            if month < current {
                total_outstanding += record.map_or(monthly_fee, |s| s.amount);
                overdue_count += 1;
            }
        }
        month = month.next();
    }

    for s in subscriptions {
        let k = key(s);
        if !s.is_paid && k < first && k < current {
            total_outstanding += s.amount;
            overdue_count += 1;
        }
    }

    OutstandingBalance {
        total_outstanding,
        overdue_count,
        missing_months,
        monthly_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::PaymentStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sub(year: i32, month: u32, amount: i64, is_paid: bool) -> Subscription {
        Subscription {
            id: 0,
            member_id: 1,
            month,
            year,
            amount: Decimal::from(amount),
            is_paid,
            payment_proof: None,
            paid_at: None,
            created_at: date(year, month, 1).and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn joining_this_month_owes_nothing_yet() {
        let b = outstanding_balance(date(2024, 5, 3), date(2024, 5, 20), Decimal::from(500), &[]);
        assert_eq!(b.overdue_count, 0);
        assert_eq!(b.total_outstanding, Decimal::ZERO);
        assert_eq!(b.missing_months, vec![MonthKey::new(2024, 5)]);
        assert_eq!(b.derived_status(), PaymentStatus::Paid);
    }

    #[test]
    fn past_months_without_payment_are_overdue_at_the_fee() {
        let b = outstanding_balance(date(2024, 1, 15), date(2024, 4, 2), Decimal::from(500), &[]);
        assert_eq!(b.overdue_count, 3);
        assert_eq!(b.total_outstanding, Decimal::from(1500));
        assert_eq!(b.missing_months.len(), 4);
        assert_eq!(b.derived_status(), PaymentStatus::Overdue);
    }

    #[test]
    fn paid_months_are_skipped_and_pending_records_owe_their_amount() {
        let subs = [sub(2024, 1, 500, true), sub(2024, 2, 300, false)];
        let b = outstanding_balance(date(2024, 1, 1), date(2024, 3, 10), Decimal::from(500), &subs);
        assert_eq!(b.overdue_count, 1);
        assert_eq!(b.total_outstanding, Decimal::from(300));
        assert_eq!(b.missing_months, vec![MonthKey::new(2024, 2), MonthKey::new(2024, 3)]);
    }

    #[test]
    fn walk_crosses_year_boundary() {
        let subs = [sub(2023, 12, 500, true)];
        let b = outstanding_balance(date(2023, 11, 30), date(2024, 2, 1), Decimal::from(200), &subs);
        assert_eq!(
            b.missing_months,
            vec![MonthKey::new(2023, 11), MonthKey::new(2024, 1), MonthKey::new(2024, 2)]
        );
        assert_eq!(b.overdue_count, 2);
        assert_eq!(b.total_outstanding, Decimal::from(400));
    }

    #[test]
    fn unpaid_records_before_joining_still_count() {
        let subs = [sub(2023, 6, 250, false), sub(2023, 7, 250, true)];
        let b = outstanding_balance(date(2024, 2, 1), date(2024, 2, 5), Decimal::from(500), &subs);
        assert_eq!(b.overdue_count, 1);
        assert_eq!(b.total_outstanding, Decimal::from(250));
    }

    #[test]
    fn fully_paid_member_is_clear() {
        let subs = [sub(2024, 3, 500, true), sub(2024, 4, 500, true)];
        let b = outstanding_balance(date(2024, 3, 1), date(2024, 4, 30), Decimal::from(500), &subs);
        assert!(b.missing_months.is_empty());
        assert_eq!(b.derived_status(), PaymentStatus::Paid);
    }
}
