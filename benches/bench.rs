// Criterion benchmarks for Herd Match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use herd_match::core::{candidate_filter, compatibility_score, is_breeding_candidate};
use herd_match::models::{Animal, ScoringWeights, Sex};
use herd_match::services::store::{to_record, Record};

const BREEDS: [&str; 4] = ["Gir", "Sahiwal", "Tharparkar", "Red Sindhi"];

fn create_animal(id: usize) -> Animal {
    Animal {
        id: format!("cow-{}", id),
        name: format!("Cow {}", id),
        breed: BREEDS[id % BREEDS.len()].to_string(),
        age: 2.0 + (id % 10) as f64 * 0.5,
        sex: if id % 2 == 0 { Sex::Female } else { Sex::Male },
        health_status: if id % 7 == 0 { "sick" } else { "healthy" }.to_string(),
        milk_yield: if id % 2 == 0 { Some(8.0 + (id % 15) as f64) } else { None },
        genetic_history: None,
        location_lat: None,
        location_lng: None,
        owner_id: format!("farmer-{}", id % 25),
        created_at: None,
    }
}

fn source() -> Animal {
    Animal {
        owner_id: "farmer-source".to_string(),
        ..create_animal(0)
    }
}

fn bench_compatibility_score(c: &mut Criterion) {
    let weights = ScoringWeights::default();
    let a = source();
    let b = create_animal(1);

    c.bench_function("compatibility_score", |bench| {
        bench.iter(|| compatibility_score(black_box(&a), black_box(&b), black_box(&weights)))
    });
}

fn bench_candidate_screening(c: &mut Criterion) {
    let mut group = c.benchmark_group("candidate_screening");
    let weights = ScoringWeights::default();
    let source = source();

    for size in [100, 1000, 10000].iter() {
        let herd: Vec<Animal> = (1..=*size).map(create_animal).collect();

        group.bench_with_input(BenchmarkId::new("typed", size), &herd, |bench, herd| {
            bench.iter(|| {
                herd.iter()
                    .filter(|c| is_breeding_candidate(&source, c, "farmer-source"))
                    .map(|c| compatibility_score(&source, c, &weights))
                    .filter(|s| *s >= 0.7)
                    .count()
            })
        });

        let records: Vec<Record> = herd.iter().filter_map(|a| to_record(a).ok()).collect();
        let filter = candidate_filter(&source, "farmer-source");

        group.bench_with_input(BenchmarkId::new("record_filter", size), &records, |bench, records| {
            bench.iter(|| records.iter().filter(|r| filter.matches(r)).count())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compatibility_score, bench_candidate_screening);
criterion_main!(benches);
