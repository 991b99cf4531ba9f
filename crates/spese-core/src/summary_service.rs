//! Read-side derivations: totals, breakdowns, balances and budget progress.

use std::collections::BTreeMap;

use serde::Serialize;

use spese_domain::{year_month, Account, Budgets, Transaction, TransactionKind};

/// Time window applied to transaction timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase", tag = "period")]
pub enum PeriodFilter {
    #[default]
    Total,
    Month {
        year: i32,
        month: u32,
    },
    Year {
        year: i32,
    },
}

impl PeriodFilter {
    pub fn matches(&self, txn: &Transaction) -> bool {
        let (year, month) = year_month(txn.timestamp);
        match *self {
            PeriodFilter::Total => true,
            PeriodFilter::Month {
                year: wanted_year,
                month: wanted_month,
            } => year == wanted_year && month == wanted_month,
            PeriodFilter::Year { year: wanted_year } => year == wanted_year,
        }
    }
}

/// Account restriction applied to transactions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountFilter {
    #[default]
    All,
    Account(String),
}

impl AccountFilter {
    pub fn matches(&self, txn: &Transaction) -> bool {
        match self {
            AccountFilter::All => true,
            AccountFilter::Account(id) => txn.account_id == *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AggregateFilter {
    pub period: PeriodFilter,
    pub account: AccountFilter,
}

impl AggregateFilter {
    pub fn total() -> Self {
        Self::default()
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            period: PeriodFilter::Month { year, month },
            account: AccountFilter::All,
        }
    }

    pub fn year(year: i32) -> Self {
        Self {
            period: PeriodFilter::Year { year },
            account: AccountFilter::All,
        }
    }

    pub fn for_account(mut self, account_id: impl Into<String>) -> Self {
        self.account = AccountFilter::Account(account_id.into());
        self
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        self.period.matches(txn) && self.account.matches(txn)
    }
}

/// Lifetime balance of a single account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountBalance {
    pub account_id: String,
    pub label: String,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

/// Everything a dashboard needs for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateView {
    pub filter: AggregateFilter,
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    pub expenses_by_category: BTreeMap<String, f64>,
    pub income_by_category: BTreeMap<String, f64>,
    pub account_balances: Vec<AccountBalance>,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetBand {
    Normal,
    Warning,
    Over,
}

impl BudgetBand {
    const WARNING_THRESHOLD: f64 = 80.0;
    const OVER_THRESHOLD: f64 = 100.0;

    /// Warning starts at 80% inclusive, over is strictly above 100%.
    pub fn classify(percentage: f64) -> Self {
        if percentage > Self::OVER_THRESHOLD {
            BudgetBand::Over
        } else if percentage >= Self::WARNING_THRESHOLD {
            BudgetBand::Warning
        } else {
            BudgetBand::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetProgress {
    /// Category name, or `None` for the overall monthly cap.
    pub category: Option<String>,
    pub spent: f64,
    pub cap: f64,
    /// `None` when no cap is configured.
    pub percentage: Option<f64>,
    pub band: Option<BudgetBand>,
}

impl BudgetProgress {
    fn new(category: Option<String>, spent: f64, cap: f64) -> Self {
        let percentage = (cap > 0.0).then(|| spent / cap * 100.0);
        Self {
            category,
            spent,
            cap,
            percentage,
            band: percentage.map(BudgetBand::classify),
        }
    }

    pub fn remaining(&self) -> f64 {
        self.cap - self.spent
    }
}

/// Pure aggregation helpers; none of them mutate their inputs.
pub struct SummaryService;

impl SummaryService {
    pub fn aggregate(
        transactions: &[Transaction],
        accounts: &[Account],
        filter: &AggregateFilter,
    ) -> AggregateView {
        let filtered = Self::filter(transactions, filter);
        let total_income = sum_kind(&filtered, TransactionKind::Income);
        let total_expenses = sum_kind(&filtered, TransactionKind::Expense);
        AggregateView {
            filter: filter.clone(),
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
            expenses_by_category: breakdown(&filtered, TransactionKind::Expense),
            income_by_category: breakdown(&filtered, TransactionKind::Income),
            account_balances: Self::account_balances(transactions, accounts),
            transaction_count: filtered.len(),
        }
    }

    /// Transactions matching `filter`, in their stored order.
    pub fn filter<'a>(transactions: &'a [Transaction], filter: &AggregateFilter) -> Vec<&'a Transaction> {
        transactions.iter().filter(|txn| filter.matches(txn)).collect()
    }

    /// Summed amounts per category; categories without matches are absent.
    pub fn category_breakdown(
        transactions: &[Transaction],
        filter: &AggregateFilter,
        kind: TransactionKind,
    ) -> BTreeMap<String, f64> {
        breakdown(&Self::filter(transactions, filter), kind)
    }

    /// Lifetime balance of every account, ignoring any period filter.
    pub fn account_balances(transactions: &[Transaction], accounts: &[Account]) -> Vec<AccountBalance> {
        accounts
            .iter()
            .map(|account| {
                let mut income = 0.0;
                let mut expenses = 0.0;
                for txn in transactions.iter().filter(|txn| txn.account_id == account.id) {
                    match txn.kind {
                        TransactionKind::Income => income += txn.amount,
                        TransactionKind::Expense => expenses += txn.amount,
                    }
                }
                AccountBalance {
                    account_id: account.id.clone(),
                    label: spese_domain::Displayable::display_label(account),
                    income,
                    expenses,
                    balance: income - expenses,
                }
            })
            .collect()
    }

    /// Expenses of `category` in the given month across all accounts, against its cap.
    pub fn budget_progress(
        transactions: &[Transaction],
        budgets: &Budgets,
        category: &str,
        month: u32,
        year: i32,
    ) -> BudgetProgress {
        let filter = AggregateFilter::month(year, month);
        let spent = transactions
            .iter()
            .filter(|txn| txn.is_expense() && txn.category == category && filter.matches(txn))
            .map(|txn| txn.amount)
            .sum();
        BudgetProgress::new(Some(category.to_string()), spent, budgets.cap_for(category))
    }

    /// All expenses of the month across all accounts, against the overall cap.
    pub fn total_budget_progress(
        transactions: &[Transaction],
        budgets: &Budgets,
        month: u32,
        year: i32,
    ) -> BudgetProgress {
        let filter = AggregateFilter::month(year, month);
        let spent = transactions
            .iter()
            .filter(|txn| txn.is_expense() && filter.matches(txn))
            .map(|txn| txn.amount)
            .sum();
        BudgetProgress::new(None, spent, budgets.total)
    }

    /// Progress for every category that has a cap configured.
    pub fn budgeted_categories(
        transactions: &[Transaction],
        budgets: &Budgets,
        month: u32,
        year: i32,
    ) -> Vec<BudgetProgress> {
        budgets
            .categories
            .iter()
            .filter(|(_, cap)| **cap > 0.0)
            .map(|(name, _)| Self::budget_progress(transactions, budgets, name, month, year))
            .collect()
    }
}

fn sum_kind(transactions: &[&Transaction], kind: TransactionKind) -> f64 {
    transactions
        .iter()
        .filter(|txn| txn.kind == kind)
        .map(|txn| txn.amount)
        .sum()
}

fn breakdown(transactions: &[&Transaction], kind: TransactionKind) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for txn in transactions.iter().filter(|txn| txn.kind == kind) {
        *totals.entry(txn.category.clone()).or_insert(0.0) += txn.amount;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use spese_domain::{Account, TransactionDraft, CASH_ACCOUNT_ID};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn txn(id: &str, draft: TransactionDraft) -> Transaction {
        Transaction::from_draft(id, &draft)
    }

    fn sample() -> (Vec<Transaction>, Vec<Account>) {
        let mut bank = Account::new("ING", "IT00", "Conto corrente");
        bank.id = "ing".into();
        let accounts = vec![Account::cash(), bank];
        let transactions = vec![
            txn("1", TransactionDraft::income(2000.0, "Stipendio", "Lavoro", "ing", at(2024, 3, 27))),
            txn("2", TransactionDraft::expense(60.0, "Spesa", "Cibo", "ing", at(2024, 3, 2))),
            txn("3", TransactionDraft::expense(20.0, "Pizza", "Cibo", CASH_ACCOUNT_ID, at(2024, 3, 9))),
            txn("4", TransactionDraft::expense(45.0, "Benzina", "Auto", "ing", at(2024, 2, 11))),
            txn("5", TransactionDraft::expense(300.0, "Volo", "Viaggi", "ing", at(2023, 8, 1))),
        ];
        (transactions, accounts)
    }

    #[test]
    fn month_filter_totals_and_breakdown() {
        let (transactions, accounts) = sample();
        let view = SummaryService::aggregate(&transactions, &accounts, &AggregateFilter::month(2024, 3));

        assert_eq!(view.total_income, 2000.0);
        assert_eq!(view.total_expenses, 80.0);
        assert_eq!(view.balance, 1920.0);
        assert_eq!(view.expenses_by_category.get("Cibo"), Some(&80.0));
        assert!(!view.expenses_by_category.contains_key("Auto"));
        assert_eq!(view.transaction_count, 3);
    }

    #[test]
    fn year_and_account_filters_combine() {
        let (transactions, accounts) = sample();
        let filter = AggregateFilter::year(2024).for_account("ing");
        let view = SummaryService::aggregate(&transactions, &accounts, &filter);

        assert_eq!(view.total_expenses, 105.0);
        assert_eq!(view.transaction_count, 3);
    }

    #[test]
    fn account_balances_ignore_period_filter() {
        let (transactions, accounts) = sample();
        let view = SummaryService::aggregate(&transactions, &accounts, &AggregateFilter::month(1999, 1));

        assert_eq!(view.transaction_count, 0);
        let ing = view
            .account_balances
            .iter()
            .find(|b| b.account_id == "ing")
            .unwrap();
        assert_eq!(ing.balance, 2000.0 - 60.0 - 45.0 - 300.0);
        let cash = view
            .account_balances
            .iter()
            .find(|b| b.account_id == CASH_ACCOUNT_ID)
            .unwrap();
        assert_eq!(cash.balance, -20.0);
    }

    #[test]
    fn budget_band_boundaries() {
        assert_eq!(BudgetBand::classify(79.99), BudgetBand::Normal);
        assert_eq!(BudgetBand::classify(80.0), BudgetBand::Warning);
        assert_eq!(BudgetBand::classify(80.0001), BudgetBand::Warning);
        assert_eq!(BudgetBand::classify(100.0), BudgetBand::Warning);
        assert_eq!(BudgetBand::classify(100.0001), BudgetBand::Over);
    }

    #[test]
    fn budget_progress_uses_category_cap_and_all_accounts() {
        let (transactions, _) = sample();
        let mut budgets = Budgets::default();
        budgets.categories.insert("Cibo".into(), 100.0);

        let progress = SummaryService::budget_progress(&transactions, &budgets, "Cibo", 3, 2024);
        assert_eq!(progress.spent, 80.0);
        assert_eq!(progress.percentage, Some(80.0));
        assert_eq!(progress.band, Some(BudgetBand::Warning));

        let unset = SummaryService::budget_progress(&transactions, &budgets, "Auto", 2, 2024);
        assert_eq!(unset.spent, 45.0);
        assert_eq!(unset.percentage, None);
        assert_eq!(unset.band, None);
    }

    #[test]
    fn total_budget_progress_reports_over_band() {
        let (transactions, _) = sample();
        let budgets = Budgets {
            total: 50.0,
            ..Budgets::default()
        };
        let progress = SummaryService::total_budget_progress(&transactions, &budgets, 3, 2024);
        assert_eq!(progress.band, Some(BudgetBand::Over));
        assert_eq!(progress.remaining(), -30.0);
    }
}
