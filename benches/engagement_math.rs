//! 指标计算与可见性状态机性能基准测试

use std::hint::black_box;
use std::time::Duration;

use adtrack::analytics::{AdCounts, EventKind, ScopedAd, bucket_daily, compute_ad_metrics, compute_overall};
use adtrack::api::services::admin::render_metrics_csv;
use adtrack::tracker::{EngagementState, Thresholds};
use chrono::{FixedOffset, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn scoped_ads(n: usize) -> Vec<ScopedAd> {
    (0..n)
        .map(|i| ScopedAd {
            ad_id: format!("ad-{}", i),
            ad_name: format!("Campaign {}", i),
            placement: "sidebar".to_string(),
            is_active: i % 3 != 0,
            counts: AdCounts {
                impressions: 1_000 + i as u64 * 7,
                views: 400 + i as u64 * 3,
                clicks: 25 + i as u64,
                total_view_duration_ms: 400_000 + i as u64 * 1_500,
                unique_visitors: 800 + i as u64,
            },
        })
        .collect()
}

/// 单广告与汇总指标
fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");

    let ads = scoped_ads(1);
    group.bench_function("compute_ad_metrics", |b| {
        b.iter(|| compute_ad_metrics(black_box(&ads[0])));
    });

    for n in [10usize, 100, 1_000] {
        let ads = scoped_ads(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("compute_overall", n), &ads, |b, ads| {
            b.iter(|| compute_overall(black_box(ads)));
        });
    }

    let rows: Vec<_> = scoped_ads(100).iter().map(compute_ad_metrics).collect();
    group.bench_function("render_csv_100", |b| {
        b.iter(|| render_metrics_csv(black_box(&rows)));
    });

    group.finish();
}

/// 按天分桶
fn bench_bucketing(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeseries/bucket_daily");
    let offset = FixedOffset::east_opt(8 * 3600).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
    let today = now.with_timezone(&offset).date_naive();

    for n in [1_000usize, 100_000] {
        let events: Vec<_> = (0..n)
            .map(|i| {
                let kind = match i % 10 {
                    0 => EventKind::Click,
                    1..=4 => EventKind::View,
                    _ => EventKind::Impression,
                };
                (kind, now - chrono::Duration::minutes((i % (30 * 24 * 60)) as i64))
            })
            .collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("30_days", n), &events, |b, events| {
            b.iter(|| bucket_daily(black_box(events), today, 30, offset));
        });
    }

    group.finish();
}

/// 可见性状态机
fn bench_state_machine(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker/state");
    let ratios = [0.0, 0.02, 0.3, 0.6, 0.9, 0.4, 0.7, 0.1, 0.8, 0.0];

    group.throughput(Throughput::Elements(ratios.len() as u64));
    group.bench_function("visibility_sequence", |b| {
        let t0 = tokio::time::Instant::now();
        b.iter(|| {
            let mut state = EngagementState::new(Thresholds::default());
            for (i, ratio) in ratios.iter().enumerate() {
                let tr = state.on_visibility(*ratio, t0 + Duration::from_millis(i as u64 * 150));
                black_box(tr);
            }
            black_box(state.on_timer(t0 + Duration::from_secs(2)))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_metrics, bench_bucketing, bench_state_machine);
criterion_main!(benches);
