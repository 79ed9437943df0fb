use criterion::{Criterion, criterion_group, criterion_main};
use drift_cache::{decode, encode};
use drift_query::{CountMode, SortDirection, TableQuery};

fn bench_encode(c: &mut Criterion) {
    let parsed = TableQuery::table("contact")
        .select("id,username,created_at")
        .ilike("username", "bench%")
        .gte("created_at", "2024-01-01")
        .order("username", SortDirection::Asc)
        .limit(50)
        .count(CountMode::Exact)
        .parse();

    c.bench_function("key/encode", |b| b.iter(|| encode(&parsed, true)));
}

fn bench_decode(c: &mut Criterion) {
    let parsed = TableQuery::table("contact")
        .select("id,username,created_at")
        .ilike("username", "bench%")
        .gte("created_at", "2024-01-01")
        .order("username", SortDirection::Asc)
        .limit(50)
        .count(CountMode::Exact)
        .parse();
    let key = encode(&parsed, true);

    c.bench_function("key/decode", |b| b.iter(|| decode(&key).unwrap()));
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
