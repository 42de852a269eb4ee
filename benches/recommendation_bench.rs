use criterion::{black_box, criterion_group, criterion_main, Criterion};
use neighborec::algorithms::*;
use neighborec::config::MissingValuePolicy;
use neighborec::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn dataset(n_users: u32, n_items: u32, density: f64) -> (Vec<User>, Vec<Item>, Vec<Rating>) {
    let mut rng = StdRng::seed_from_u64(42);
    let users = (1..=n_users).map(User::new).collect();
    let items = (1..=n_items).map(|i| Item::new(i, format!("Movie {i}"))).collect();
    let mut ratings = Vec::new();
    for user_id in 1..=n_users {
        for item_id in 1..=n_items {
            if rng.gen_bool(density) {
                ratings.push(Rating::new(user_id, item_id, rng.gen_range(1..=5)));
            }
        }
    }
    (users, items, ratings)
}

fn benchmark_matrix_build(c: &mut Criterion) {
    let (users, items, ratings) = dataset(1000, 2000, 0.05);

    c.bench_function("interaction_matrix_build", |b| {
        b.iter(|| black_box(InteractionMatrix::build(&users, &items, &ratings).unwrap()));
    });
}

fn benchmark_similarity(c: &mut Criterion) {
    let (users, items, ratings) = dataset(600, 600, 0.05);
    let matrix = InteractionMatrix::build(&users, &items, &ratings).unwrap();

    for policy in [MissingValuePolicy::ImputeZero, MissingValuePolicy::Exclude] {
        let engine = SimilarityEngine::new(Box::new(FirstK { k: 500 }), policy, num_cpus::get()).unwrap();
        c.bench_function(&format!("similarity_first_500_{:?}", policy), |b| {
            b.iter(|| black_box(engine.compute(&matrix)));
        });
    }
}

fn benchmark_recommend(c: &mut Criterion) {
    let (users, items, ratings) = dataset(500, 500, 0.05);
    let matrix = InteractionMatrix::build(&users, &items, &ratings).unwrap();
    let engine = SimilarityEngine::new(Box::new(FirstK { k: 500 }), MissingValuePolicy::ImputeZero, 1).unwrap();
    let similarity = engine.compute(&matrix);
    let catalog = Catalog::new(&items);
    let target = similarity.users()[0];

    c.bench_function("recommend_10_neighbors", |b| {
        b.iter(|| black_box(recommend(&matrix, &similarity, &ratings, &catalog, target, 10, 5).unwrap()));
    });

    c.bench_function("seen_items", |b| {
        b.iter(|| black_box(seen_items(&matrix, &catalog, target)));
    });
}

criterion_group!(
    benches,
    benchmark_matrix_build,
    benchmark_similarity,
    benchmark_recommend
);
criterion_main!(benches);
