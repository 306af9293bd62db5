use biasshield_core::aggregate::OutcomeRecord;
use biasshield_core::trend::{MetricField, summarize_series};
use biasshield_core::{
    Noise, RemediationStrategy, apply_remediation, compute_group_metrics,
    generate_intersectional_data, generate_temporal_data, moving_average,
};
use chrono::NaiveDate;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn now() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap_or_default()
}

fn bench_synthesis(c: &mut Criterion) {
    c.bench_function("intersectional_no_noise", |b| {
        b.iter(|| generate_intersectional_data(black_box(&mut Noise::none())))
    });

    c.bench_function("intersectional_seeded_noise", |b| {
        b.iter(|| generate_intersectional_data(black_box(&mut Noise::seeded(7, 0.02))))
    });

    c.bench_function("temporal_all_attributes", |b| {
        b.iter(|| generate_temporal_data(black_box(now()), &mut Noise::seeded(7, 0.02)))
    });
}

fn bench_aggregation(c: &mut Criterion) {
    let groups = ["Male", "Female", "Non-binary"];
    let records: Vec<OutcomeRecord> = (0..10_000)
        .map(|i| OutcomeRecord::new(groups[i % 3], i % 4 != 0, i % 5 != 0))
        .collect();

    c.bench_function("group_metrics_10k", |b| {
        b.iter(|| compute_group_metrics(black_box(&records)))
    });
}

fn bench_remediation(c: &mut Criterion) {
    let values = [0.75, 0.62, 0.70, 0.65, 0.58];
    for strategy in RemediationStrategy::ALL {
        c.bench_function(&format!("remediate_{}", strategy.as_str()), |b| {
            b.iter(|| apply_remediation(black_box(&values), strategy, black_box(0.5)))
        });
    }
}

fn bench_trend(c: &mut Criterion) {
    let data = generate_temporal_data(now(), &mut Noise::none());
    let series: Vec<_> = data.values().next().cloned().unwrap_or_default();
    let values = MetricField::ApprovalDisparity.values(&series);

    c.bench_function("moving_average_24", |b| {
        b.iter(|| moving_average(black_box(&values), 3))
    });

    c.bench_function("summarize_series_24", |b| {
        b.iter(|| summarize_series(black_box(&series), MetricField::ApprovalDisparity, 3))
    });
}

criterion_group!(
    benches,
    bench_synthesis,
    bench_aggregation,
    bench_remediation,
    bench_trend
);
criterion_main!(benches);
