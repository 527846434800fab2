//! Aggregation of transaction lists into category, period, and overall summaries.
//!
//! These functions are pure: they only look at the slice they are given and
//! never touch the database. Handlers fetch the transactions they care about
//! and pass them in.

use std::collections::HashMap;

use serde::Serialize;
use time::Date;

use crate::transaction::{Transaction, TransactionKind};

/// The total amount recorded against one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    /// The category name.
    pub category: String,
    /// The sum of the amounts of the transactions in this category.
    pub total: f64,
}

/// The calendar bucket size used by [period_totals].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One bucket per calendar day.
    Day,
    /// One bucket per calendar month.
    Month,
}

/// The income and expense totals for one calendar bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary {
    /// The first date of the bucket, i.e. the day itself for daily buckets and
    /// the first of the month for monthly buckets.
    pub period: Date,
    /// The sum of income amounts in the bucket.
    pub income: f64,
    /// The sum of expense amounts in the bucket.
    pub expense: f64,
}

/// Sum transaction amounts per category.
///
/// Results are ordered by total descending, with ties broken by category name
/// so the output is stable regardless of insertion order.
pub fn category_totals(transactions: &[Transaction]) -> Vec<CategorySummary> {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for transaction in transactions {
        *totals.entry(transaction.category.as_str()).or_insert(0.0) += transaction.amount;
    }

    let mut summaries: Vec<CategorySummary> = totals
        .into_iter()
        .map(|(category, total)| CategorySummary {
            category: category.to_owned(),
            total,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    summaries
}

/// Bucket transactions by calendar period and total income and expenses
/// separately within each bucket.
///
/// Buckets are returned in chronological order. Only periods that contain at
/// least one transaction appear, and partial periods are included as-is.
pub fn period_totals(transactions: &[Transaction], granularity: Granularity) -> Vec<PeriodSummary> {
    let mut buckets: HashMap<Date, (f64, f64)> = HashMap::new();

    for transaction in transactions {
        let period = match granularity {
            Granularity::Day => transaction.date,
            Granularity::Month => transaction
                .date
                .replace_day(1)
                .expect("the first of the month is always a valid date"),
        };

        let (income, expense) = buckets.entry(period).or_insert((0.0, 0.0));
        match transaction.kind {
            TransactionKind::Income => *income += transaction.amount,
            TransactionKind::Expense => *expense += transaction.amount,
        }
    }

    let mut summaries: Vec<PeriodSummary> = buckets
        .into_iter()
        .map(|(period, (income, expense))| PeriodSummary {
            period,
            income,
            expense,
        })
        .collect();

    summaries.sort_by_key(|summary| summary.period);

    summaries
}

/// Total income, total expenses, and the resulting balance for a transaction list.
pub fn ledger_totals(transactions: &[Transaction]) -> (f64, f64, f64) {
    let mut income = 0.0;
    let mut expense = 0.0;

    for transaction in transactions {
        match transaction.kind {
            TransactionKind::Income => income += transaction.amount,
            TransactionKind::Expense => expense += transaction.amount,
        }
    }

    (income, expense, income - expense)
}

/// A financial health score between 0 and 100.
///
/// The score is the percentage of income left after expenses, clamped at 0.
/// Returns `None` when there is no income to measure against.
pub fn health_score(income: f64, expense: f64) -> Option<u8> {
    if income <= 0.0 {
        return None;
    }

    let expense_ratio = expense / income;
    let score = (100.0 - expense_ratio * 100.0).clamp(0.0, 100.0);

    Some(score.round() as u8)
}

#[cfg(test)]
mod summary_tests {
    use time::{Date, OffsetDateTime, macros::date};

    use crate::{
        summary::{
            CategorySummary, Granularity, category_totals, health_score, ledger_totals,
            period_totals,
        },
        transaction::{Transaction, TransactionKind},
        user::UserID,
    };

    fn make_transaction(
        amount: f64,
        kind: TransactionKind,
        category: &str,
        date: Date,
    ) -> Transaction {
        Transaction {
            id: 0,
            user_id: UserID::new(1),
            amount,
            kind,
            category: category.to_owned(),
            date,
            note: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(category_totals(&[]).is_empty());
        assert!(period_totals(&[], Granularity::Month).is_empty());
        assert_eq!(ledger_totals(&[]), (0.0, 0.0, 0.0));
    }

    #[test]
    fn category_totals_groups_and_orders_by_total_descending() {
        let transactions = vec![
            make_transaction(
                1000.0,
                TransactionKind::Income,
                "salary",
                date!(2024 - 01 - 31),
            ),
            make_transaction(
                500.0,
                TransactionKind::Expense,
                "rent",
                date!(2024 - 01 - 31),
            ),
            make_transaction(20.0, TransactionKind::Expense, "food", date!(2024 - 02 - 05)),
        ];

        let summaries = category_totals(&transactions);

        assert_eq!(
            summaries,
            vec![
                CategorySummary {
                    category: "salary".to_owned(),
                    total: 1000.0
                },
                CategorySummary {
                    category: "rent".to_owned(),
                    total: 500.0
                },
                CategorySummary {
                    category: "food".to_owned(),
                    total: 20.0
                },
            ]
        );
    }

    #[test]
    fn category_totals_invariant_under_insertion_order() {
        let forwards = vec![
            make_transaction(5.0, TransactionKind::Expense, "food", date!(2024 - 01 - 01)),
            make_transaction(7.0, TransactionKind::Expense, "food", date!(2024 - 01 - 02)),
            make_transaction(3.0, TransactionKind::Expense, "rent", date!(2024 - 01 - 03)),
        ];
        let mut backwards = forwards.clone();
        backwards.reverse();

        assert_eq!(category_totals(&forwards), category_totals(&backwards));
    }

    #[test]
    fn category_totals_breaks_ties_by_name() {
        let transactions = vec![
            make_transaction(10.0, TransactionKind::Expense, "zoo", date!(2024 - 01 - 01)),
            make_transaction(
                10.0,
                TransactionKind::Expense,
                "apples",
                date!(2024 - 01 - 02),
            ),
        ];

        let summaries = category_totals(&transactions);

        assert_eq!(summaries[0].category, "apples");
        assert_eq!(summaries[1].category, "zoo");
    }

    #[test]
    fn monthly_period_totals_splits_income_and_expense() {
        let transactions = vec![
            make_transaction(
                1000.0,
                TransactionKind::Income,
                "salary",
                date!(2024 - 01 - 31),
            ),
            make_transaction(
                500.0,
                TransactionKind::Expense,
                "rent",
                date!(2024 - 01 - 31),
            ),
            make_transaction(20.0, TransactionKind::Expense, "food", date!(2024 - 02 - 05)),
        ];

        let summaries = period_totals(&transactions, Granularity::Month);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].period, date!(2024 - 01 - 01));
        assert_eq!(summaries[0].income, 1000.0);
        assert_eq!(summaries[0].expense, 500.0);
        assert_eq!(summaries[1].period, date!(2024 - 02 - 01));
        assert_eq!(summaries[1].income, 0.0);
        assert_eq!(summaries[1].expense, 20.0);
    }

    #[test]
    fn daily_period_totals_buckets_by_exact_date() {
        let transactions = vec![
            make_transaction(5.0, TransactionKind::Expense, "food", date!(2024 - 01 - 01)),
            make_transaction(7.0, TransactionKind::Expense, "food", date!(2024 - 01 - 01)),
            make_transaction(9.0, TransactionKind::Income, "tips", date!(2024 - 01 - 02)),
        ];

        let summaries = period_totals(&transactions, Granularity::Day);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].period, date!(2024 - 01 - 01));
        assert_eq!(summaries[0].expense, 12.0);
        assert_eq!(summaries[1].period, date!(2024 - 01 - 02));
        assert_eq!(summaries[1].income, 9.0);
    }

    #[test]
    fn ledger_totals_sums_by_kind() {
        let transactions = vec![
            make_transaction(
                1000.0,
                TransactionKind::Income,
                "salary",
                date!(2024 - 01 - 31),
            ),
            make_transaction(
                500.0,
                TransactionKind::Expense,
                "rent",
                date!(2024 - 01 - 31),
            ),
            make_transaction(20.0, TransactionKind::Expense, "food", date!(2024 - 02 - 05)),
        ];

        let (income, expense, balance) = ledger_totals(&transactions);

        assert_eq!(income, 1000.0);
        assert_eq!(expense, 520.0);
        assert_eq!(balance, 480.0);
    }

    #[test]
    fn health_score_is_percentage_of_income_left() {
        assert_eq!(health_score(1000.0, 520.0), Some(48));
        assert_eq!(health_score(1000.0, 0.0), Some(100));
    }

    #[test]
    fn health_score_clamps_overspend_to_zero() {
        assert_eq!(health_score(100.0, 250.0), Some(0));
    }

    #[test]
    fn health_score_is_none_without_income() {
        assert_eq!(health_score(0.0, 50.0), None);
    }
}
