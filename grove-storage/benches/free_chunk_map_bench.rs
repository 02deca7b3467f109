use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use grove_storage::FreeChunkMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEED: u64 = 0xC0FF_EE00_DADA_BEEF;
const N_RANGES: u32 = 4_096;

fn populated_map() -> FreeChunkMap {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut map = FreeChunkMap::new();
    let mut cursor = 0u32;
    for _ in 0..N_RANGES {
        let num_pages = rng.random_range(1..200u32);
        map.insert(cursor, num_pages);
        cursor += num_pages;
    }
    map
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("free_chunk_map");
    group.throughput(Throughput::Elements(u64::from(N_RANGES)));
    group.bench_function("insert_4k_ranges", |b| {
        let mut rng = StdRng::seed_from_u64(SEED);
        b.iter_batched(
            FreeChunkMap::new,
            |mut map| {
                let mut cursor = 0u32;
                for _ in 0..N_RANGES {
                    let num_pages = rng.random_range(1..200u32);
                    map.insert(cursor, num_pages);
                    cursor += num_pages;
                }
                map
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_take(c: &mut Criterion) {
    let mut group = c.benchmark_group("free_chunk_map");
    group.throughput(Throughput::Elements(u64::from(N_RANGES)));
    group.bench_function("take_until_empty", |b| {
        let mut rng = StdRng::seed_from_u64(SEED ^ 0x5a5a_5a5a_5a5a_5a5a);
        b.iter_batched(
            populated_map,
            |mut map| {
                while let Some(entry) = map.take(rng.random_range(1..200u32)) {
                    drop(entry);
                }
                map
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_take);
criterion_main!(benches);
