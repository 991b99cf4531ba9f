use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::tempdir;

use spese_core::{expand, AggregateFilter, DocumentService, RecurrenceService, SummaryService};
use spese_domain::{
    Account, Document, Frequency, RecurringDraft, RecurringTemplate, Transaction,
    TransactionDraft, CASH_ACCOUNT_ID,
};
use spese_storage_json::{load_snapshot_from_path, save_document_to_path};

fn build_sample_document(txn_count: usize) -> Document {
    let mut document = DocumentService::create();
    let account = Account::new("Fineco", "IT00", "Conto");
    let account_id = account.id.clone();
    document.accounts.push(account);

    let start = Utc.with_ymd_and_hms(2022, 1, 1, 9, 0, 0).unwrap();
    let categories = ["Cibo", "Casa", "Auto", "Salute", "Tempo Libero"];
    for idx in 0..txn_count {
        let timestamp = start + Duration::hours((idx * 7) as i64);
        let draft = if idx % 10 == 0 {
            TransactionDraft::income(1500.0, "Stipendio", "Altro", &account_id, timestamp)
        } else {
            let owner = if idx % 3 == 0 { CASH_ACCOUNT_ID } else { account_id.as_str() };
            TransactionDraft::expense(
                5.0 + (idx % 90) as f64,
                "Spesa",
                categories[idx % categories.len()],
                owner,
                timestamp,
            )
        };
        document
            .transactions
            .push(Transaction::from_draft(format!("txn-{idx}"), &draft));
    }
    document.sort_transactions();
    document
}

fn sample_templates(count: usize) -> Vec<RecurringTemplate> {
    let start = Utc.with_ymd_and_hms(2020, 1, 31, 8, 0, 0).unwrap();
    (0..count)
        .map(|idx| {
            let frequency = match idx % 4 {
                0 => Frequency::Daily,
                1 => Frequency::Weekly,
                2 => Frequency::Monthly,
                _ => Frequency::Yearly,
            };
            let draft = RecurringDraft::new(
                TransactionDraft::expense(10.0, "Abbonamento", "Casa", CASH_ACCOUNT_ID, start),
                frequency,
                1,
                120,
            );
            RecurringTemplate::from_draft(format!("tpl-{idx}"), &draft)
        })
        .collect()
}

fn bench_recurrence(c: &mut Criterion) {
    let templates = sample_templates(200);
    let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();

    c.bench_function("expand_200_templates", |b| {
        b.iter(|| black_box(expand(black_box(&templates), now)))
    });

    c.bench_function("materialize_200_templates", |b| {
        b.iter_batched(
            || {
                let mut document = DocumentService::create();
                document.recurring_transactions = templates.clone();
                document
            },
            |mut document| RecurrenceService::materialize_due(&mut document, now).map(black_box),
            BatchSize::SmallInput,
        )
    });
}

fn bench_aggregation(c: &mut Criterion) {
    let document = build_sample_document(20_000);

    c.bench_function("aggregate_total_20k", |b| {
        b.iter(|| {
            black_box(SummaryService::aggregate(
                &document.transactions,
                &document.accounts,
                &AggregateFilter::total(),
            ))
        })
    });

    c.bench_function("aggregate_month_account_20k", |b| {
        let filter = AggregateFilter::month(2023, 6).for_account(CASH_ACCOUNT_ID);
        b.iter(|| {
            black_box(SummaryService::aggregate(
                &document.transactions,
                &document.accounts,
                &filter,
            ))
        })
    });
}

fn bench_document_io(c: &mut Criterion) {
    let document = build_sample_document(10_000);
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("financeData.json");

    c.bench_function("document_save_10k", |b| {
        b.iter(|| save_document_to_path(&document, &path).expect("save document"))
    });

    save_document_to_path(&document, &path).expect("seed");
    c.bench_function("document_load_hydrate_10k", |b| {
        b.iter(|| {
            let snapshot = load_snapshot_from_path(&path)
                .expect("load document")
                .expect("document present");
            black_box(DocumentService::hydrate(snapshot).expect("hydrate"))
        })
    });
}

criterion_group!(benches, bench_recurrence, bench_aggregation, bench_document_io);
criterion_main!(benches);
