use criterion::{black_box, criterion_group, criterion_main, Criterion};

use linquiz_core::grading::{grade, normalize};
use linquiz_core::model::Level;
use linquiz_core::parser::builtin_bank;
use linquiz_core::results::{Attempt, ResultSet};
use linquiz_core::summary::Summary;

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let short = "  ls   -la ";
    let long = "awk '{print $1}'   access.log |  sort | uniq -c\t| sort -rn |   head -n 10";

    group.bench_function("short", |b| b.iter(|| normalize(black_box(short))));
    group.bench_function("pipeline", |b| b.iter(|| normalize(black_box(long))));

    group.finish();
}

fn bench_grade(c: &mut Criterion) {
    let mut group = c.benchmark_group("grade");

    let accepted = [
        "tar -czvf logs.tar.gz logs",
        "tar -czf logs.tar.gz logs",
        "tar czvf logs.tar.gz logs",
        "tar czf logs.tar.gz logs",
    ];

    group.bench_function("hit_last", |b| {
        b.iter(|| grade(black_box("tar  czf logs.tar.gz  logs"), black_box(&accepted)))
    });

    group.bench_function("miss", |b| {
        b.iter(|| grade(black_box("tar -cf logs.tar logs"), black_box(&accepted)))
    });

    group.finish();
}

fn bench_summary(c: &mut Criterion) {
    let bank = builtin_bank(Level::Advanced).expect("builtin bank");
    let mut results = ResultSet::new();
    for q in bank.questions.iter().step_by(2) {
        results.record(Attempt::evaluate(q, q.canonical_answer()));
    }

    c.bench_function("summary_compute", |b| {
        b.iter(|| Summary::compute(black_box(&results), black_box(bank.question_count())))
    });
}

criterion_group!(benches, bench_normalize, bench_grade, bench_summary);
criterion_main!(benches);
