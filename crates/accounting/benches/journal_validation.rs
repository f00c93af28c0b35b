use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use tally_accounting::{NewJournalEntry, NewJournalLine};
use tally_core::AccountId;

/// Entry with `n` debit lines of 12.34 and one balancing credit line.
fn balanced_entry(n: usize) -> NewJournalEntry {
    let mut lines: Vec<NewJournalLine> = (0..n)
        .map(|_| NewJournalLine::debit(AccountId::new(), "12.34"))
        .collect();
    let total = rust_decimal::Decimal::new(1234, 2) * rust_decimal::Decimal::from(n as u64);
    lines.push(NewJournalLine::credit(AccountId::new(), total.to_string()));
    NewJournalEntry::new("BENCH", "bench entry", Utc::now(), lines)
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("journal_validate");

    for n in [2usize, 10, 100, 1_000] {
        let entry = balanced_entry(n);
        group.throughput(Throughput::Elements(n as u64 + 1));
        group.bench_with_input(BenchmarkId::from_parameter(n), &entry, |b, entry| {
            b.iter(|| {
                let validated = black_box(entry.clone()).validate();
                black_box(validated.is_ok())
            })
        });
    }

    group.finish();
}

fn bench_balance_deltas(c: &mut Criterion) {
    let mut group = c.benchmark_group("journal_balance_deltas");

    for n in [10usize, 1_000] {
        let validated = match balanced_entry(n).validate() {
            Ok(v) => v,
            Err(e) => panic!("bench entry must validate: {e}"),
        };
        group.bench_with_input(BenchmarkId::from_parameter(n), &validated, |b, v| {
            b.iter(|| black_box(v.balance_deltas()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validate, bench_balance_deltas);
criterion_main!(benches);
