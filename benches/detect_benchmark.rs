use criterion::{Criterion, black_box, criterion_group, criterion_main};
use demo_prober::strategy::{StrategyConfig, Strategy, detect_application_type};

fn config_with(count: usize) -> StrategyConfig {
    let mut config = StrategyConfig::default();
    config.application_types.clear();
    for i in 0..count {
        config.application_types.insert(
            format!("strategy_{}", i),
            Strategy {
                file_patterns: vec![format!("*demo-{}-*", i), format!("*kind{}*", i)],
                content_keywords: vec![format!("keyword {}", i)],
                ..Default::default()
            },
        );
    }
    config
}

fn benchmark_detect(c: &mut Criterion) {
    let config = config_with(40);
    let content = "<html><body>".repeat(200) + "keyword 39";

    c.bench_function("detect_by_pattern", |b| {
        b.iter(|| detect_application_type(black_box(&config), black_box("demo-20-merge.html"), None))
    });

    c.bench_function("detect_by_keyword", |b| {
        b.iter(|| {
            detect_application_type(black_box(&config), black_box("unknown.html"), Some(black_box(content.as_str())))
        })
    });
}

criterion_group!(benches, benchmark_detect);
criterion_main!(benches);
