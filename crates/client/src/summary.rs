//! Totals derived from the cached transactions and budget.

use api_types::{
    budget::Budget,
    transaction::{Transaction, TransactionType},
};
use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_spending: Decimal,
    /// Budget amount, zero when no budget is known.
    pub budget: Decimal,
    pub budget_exceeded: bool,
}

impl Summary {
    /// Sums saturate at the `Decimal` bounds instead of overflowing.
    pub fn compute(transactions: &[Transaction], budget: Option<&Budget>) -> Self {
        let (total_income, total_spending) = transactions.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, spending), tx| match tx.kind {
                TransactionType::Income => (income.saturating_add(tx.amount), spending),
                TransactionType::Expense => (income, spending.saturating_add(tx.amount)),
            },
        );
        let budget = budget.map_or(Decimal::ZERO, |budget| budget.amount);

        Self {
            total_income,
            total_spending,
            budget,
            budget_exceeded: total_spending > budget,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.total_income.saturating_sub(self.total_spending)
    }

    /// Budget left before it is exceeded, negative once over.
    pub fn remaining_budget(&self) -> Decimal {
        self.budget.saturating_sub(self.total_spending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: i32, amount: i64, kind: TransactionType) -> Transaction {
        Transaction {
            id,
            user_id: 1,
            category_id: 1,
            amount: Decimal::from(amount),
            date: "2024-01-01".to_string(),
            description: String::new(),
            kind,
        }
    }

    fn budget(amount: i64) -> Budget {
        Budget {
            user_id: 1,
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
            amount: Decimal::from(amount),
        }
    }

    #[test]
    fn splits_income_and_spending() {
        let txs = vec![
            tx(1, 100, TransactionType::Income),
            tx(2, 40, TransactionType::Expense),
            tx(3, 10, TransactionType::Expense),
        ];

        let summary = Summary::compute(&txs, Some(&budget(45)));
        assert_eq!(summary.total_income, Decimal::from(100));
        assert_eq!(summary.total_spending, Decimal::from(50));
        assert!(summary.budget_exceeded);
        assert_eq!(summary.balance(), Decimal::from(50));
        assert_eq!(summary.remaining_budget(), Decimal::from(-5));

        let summary = Summary::compute(&txs, Some(&budget(50)));
        assert!(!summary.budget_exceeded);
    }

    #[test]
    fn missing_budget_counts_as_zero() {
        let summary = Summary::compute(&[], None);
        assert_eq!(summary, Summary::default());
        assert!(!summary.budget_exceeded);

        let summary = Summary::compute(&[tx(1, 1, TransactionType::Expense)], None);
        assert!(summary.budget_exceeded);
    }

    #[test]
    fn huge_amounts_saturate_instead_of_panicking() {
        let mut big = tx(1, 0, TransactionType::Expense);
        big.amount = Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0);
        let mut income = big.clone();
        income.kind = TransactionType::Income;
        let txs = vec![big.clone(), big, income.clone(), income];

        let summary = Summary::compute(&txs, Some(&budget(45)));
        assert_eq!(summary.total_spending, Decimal::MAX);
        assert_eq!(summary.total_income, Decimal::MAX);
        assert!(summary.budget_exceeded);
        assert_eq!(summary.balance(), Decimal::ZERO);
        assert_eq!(summary.remaining_budget(), Decimal::from(45).saturating_sub(Decimal::MAX));
    }
}
