use chrono::{DateTime, TimeZone, Utc};

use crate::{
    account_service::AccountService, category_service::CategoryService,
    recurrence_service::RecurrenceService, summary_service::SummaryService,
    taxonomy::TaxonomyReconciler, transaction_service::TransactionService, AggregateFilter,
    BudgetBand,
};
use spese_domain::{
    AccountDraft, Budgets, Category, Document, Frequency, PersistedCategory, RecurringDraft,
    TransactionDraft, CASH_ACCOUNT_ID, DEFAULT_CATEGORY, WITHDRAWAL_CATEGORY,
};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
}

fn populated() -> (Document, String, String) {
    let mut doc = Document::new();
    let main = AccountService::save(&mut doc, &AccountDraft::new("ING", "IT11", "Principale"), None)
        .expect("add main account");
    let card = AccountService::save(&mut doc, &AccountDraft::new("N26", "DE22", "Carta"), None)
        .expect("add card account");

    for (amount, desc, category, account) in [
        (1800.0, "Stipendio", "Lavoro", main.as_str()),
        (42.0, "Spesa", "Cibo", main.as_str()),
        (19.9, "Abbonamento", "Tempo Libero", card.as_str()),
        (8.0, "Gelato", "Cibo", CASH_ACCOUNT_ID),
    ] {
        let draft = if category == "Lavoro" {
            TransactionDraft::income(amount, desc, category, account, at(2024, 5, 3))
        } else {
            TransactionDraft::expense(amount, desc, category, account, at(2024, 5, 4))
        };
        TransactionService::save(&mut doc, &draft, None).expect("add transaction");
    }
    RecurrenceService::create(
        &mut doc,
        &RecurringDraft::new(
            TransactionDraft::expense(9.99, "Streaming", "Tempo Libero", &card, at(2024, 1, 10)),
            Frequency::Monthly,
            1,
            12,
        ),
    )
    .expect("add recurring");
    RecurrenceService::materialize_due(&mut doc, at(2024, 5, 31)).expect("materialize");
    (doc, main, card)
}

#[test]
fn deleting_an_account_leaves_other_data_untouched() {
    let (mut doc, main, card) = populated();
    let others_before: Vec<_> = doc
        .transactions
        .iter()
        .filter(|txn| txn.account_id != card)
        .cloned()
        .collect();

    AccountService::delete(&mut doc, &card).expect("delete card");

    assert!(doc.transactions.iter().all(|txn| txn.account_id != card));
    assert!(doc.recurring_transactions.iter().all(|t| t.account_id != card));
    assert_eq!(doc.transactions, others_before);
    assert!(doc.account(&main).is_some());
}

#[test]
fn withdrawal_conserves_money() {
    let (mut doc, main, _) = populated();
    let before = SummaryService::aggregate(&doc.transactions, &doc.accounts, &AggregateFilter::total());
    let balance_of = |view: &crate::AggregateView, id: &str| {
        view.account_balances
            .iter()
            .find(|b| b.account_id == id)
            .map(|b| b.balance)
            .unwrap_or_default()
    };

    TransactionService::save(
        &mut doc,
        &TransactionDraft::expense(50.0, "Prelievo ATM", WITHDRAWAL_CATEGORY, &main, at(2024, 5, 20)),
        None,
    )
    .expect("withdraw");
    let after = SummaryService::aggregate(&doc.transactions, &doc.accounts, &AggregateFilter::total());

    assert_eq!(balance_of(&after, &main), balance_of(&before, &main) - 50.0);
    assert_eq!(
        balance_of(&after, CASH_ACCOUNT_ID),
        balance_of(&before, CASH_ACCOUNT_ID) + 50.0
    );
    assert!((after.balance - before.balance).abs() < 1e-9);
}

#[test]
fn deleting_a_category_reassigns_every_reference() {
    let (mut doc, _, _) = populated();
    CategoryService::create_subcategory(&mut doc, "Tempo Libero", "Cinema").unwrap();
    if let Some(txn) = doc
        .transactions
        .iter_mut()
        .find(|txn| txn.category == "Tempo Libero" && !txn.is_recurring)
    {
        txn.subcategory = "Cinema".into();
    }

    CategoryService::delete(&mut doc, "Tempo Libero").expect("delete category");

    assert!(doc.category("Tempo Libero").is_none());
    assert!(doc.transactions.iter().all(|txn| txn.category != "Tempo Libero"));
    let moved: Vec<_> = doc
        .transactions
        .iter()
        .filter(|txn| txn.category == DEFAULT_CATEGORY)
        .collect();
    assert!(!moved.is_empty());
    assert!(moved.iter().all(|txn| txn.subcategory.is_empty()));
    assert!(doc
        .recurring_transactions
        .iter()
        .all(|t| t.category == DEFAULT_CATEGORY));
}

#[test]
fn budget_band_boundaries_follow_percentage() {
    let mut budgets = Budgets::default();
    budgets.categories.insert("Cibo".into(), 100.0);
    let cases = [
        (80.0, BudgetBand::Warning),
        (80.0001, BudgetBand::Warning),
        (100.0, BudgetBand::Warning),
        (100.0001, BudgetBand::Over),
        (12.0, BudgetBand::Normal),
    ];

    for (spent, expected) in cases {
        let mut doc = Document::new();
        TransactionService::save(
            &mut doc,
            &TransactionDraft::expense(spent, "Spesa", "Cibo", CASH_ACCOUNT_ID, at(2024, 3, 3)),
            None,
        )
        .unwrap();
        let progress = SummaryService::budget_progress(&doc.transactions, &budgets, "Cibo", 3, 2024);
        assert_eq!(progress.band, Some(expected), "spent {spent}");
    }
}

#[test]
fn reconciling_is_ordered_and_idempotent() {
    let builtins = vec![Category::new("Cibo"), Category::new("Altro")];
    let first = TaxonomyReconciler::reconcile(
        vec![PersistedCategory::Current(Category::new("Cibo"))],
        &builtins,
    );
    let names: Vec<_> = first.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Cibo", "Altro"]);

    let second = TaxonomyReconciler::reconcile_categories(&first, &builtins);
    assert_eq!(second, first);
}

#[test]
fn recurring_expansion_feeds_aggregation() {
    let (doc, _, card) = populated();
    let may = SummaryService::aggregate(
        &doc.transactions,
        &doc.accounts,
        &AggregateFilter::month(2024, 5).for_account(card.as_str()),
    );
    // Manual subscription plus the May streaming occurrence.
    assert_eq!(may.transaction_count, 2);
    assert!((may.total_expenses - (19.9 + 9.99)).abs() < 1e-9);

    let template = &doc.recurring_transactions[0];
    assert_eq!(template.generated_count, 5);
    assert_eq!(template.next_due_date, at(2024, 6, 10));
}
