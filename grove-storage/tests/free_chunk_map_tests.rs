#![forbid(unsafe_code)]

use grove_storage::free_chunk_map::CHUNK_LEVEL_PAGE_LIMITS;
use grove_storage::serialization::Deserializer;
use grove_storage::{ChunkDescriptor, FreeChunkMap, Serializer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;

fn descriptors(map: &FreeChunkMap) -> Vec<(usize, ChunkDescriptor)> {
    map.entries()
}

fn round_trip(map: &FreeChunkMap) -> FreeChunkMap {
    let mut buf = Vec::new();
    let mut serializer = Serializer::new(&mut buf);
    map.serialize(&mut serializer).expect("serialize");
    let mut restored = FreeChunkMap::new();
    let mut deserializer = Deserializer::new(buf.as_slice());
    restored.deserialize(&mut deserializer).expect("deserialize");
    restored
}

#[test]
fn chunk_level_boundaries() {
    // Exclusive upper bounds: a range of k pages lands in the smallest
    // class whose bound strictly exceeds k.
    assert_eq!(FreeChunkMap::chunk_level(1), 0);
    assert_eq!(FreeChunkMap::chunk_level(2), 1);
    assert_eq!(FreeChunkMap::chunk_level(3), 1);
    assert_eq!(FreeChunkMap::chunk_level(4), 2);
    assert_eq!(FreeChunkMap::chunk_level(8), 3);
    assert_eq!(FreeChunkMap::chunk_level(16), 4);
    assert_eq!(FreeChunkMap::chunk_level(32), 5);
    assert_eq!(FreeChunkMap::chunk_level(64), 6);
    assert_eq!(FreeChunkMap::chunk_level(127), 6);
    assert_eq!(FreeChunkMap::chunk_level(128), 7);
    assert_eq!(FreeChunkMap::chunk_level(u32::MAX - 1), 7);
    assert_eq!(FreeChunkMap::chunk_level(u32::MAX), 7);
}

#[test]
fn insert_then_inspect() {
    // FCM empty; insert(100, 3): 3 pages classify below the bound of 4.
    let mut map = FreeChunkMap::new();
    map.insert(100, 3);

    assert!(map.contains(100));
    assert_eq!(map.max_avail_level(), Some(1));
    assert_eq!(descriptors(&map), vec![(1, ChunkDescriptor::new(100, 3))]);

    let restored = round_trip(&map);
    assert_eq!(restored, map);
}

#[test]
fn take_searches_upward_and_returns_whole_entries() {
    let mut map = FreeChunkMap::new();
    map.insert(200, 10); // class 3 (8 <= 10 < 16)
    map.insert(300, 4); // class 2 (4 < 8)

    assert_eq!(
        descriptors(&map),
        vec![
            (2, ChunkDescriptor::new(300, 4)),
            (3, ChunkDescriptor::new(200, 10)),
        ]
    );

    // A request for 5 starts at class 2; {300,4} does not fit, so the
    // scan advances and returns {200,10} whole.
    let entry = map.take(5).expect("a fitting entry exists");
    assert_eq!(entry.descriptor(), ChunkDescriptor::new(200, 10));
    assert!(!map.contains(200));

    // The caller owns the unused tail and re-inserts it.
    map.insert(205, 5);
    assert_eq!(
        descriptors(&map),
        vec![
            (2, ChunkDescriptor::new(300, 4)),
            (2, ChunkDescriptor::new(205, 5)),
        ]
    );
    assert_eq!(map.max_avail_level(), Some(2));
}

#[test]
fn take_is_first_fit_within_a_class() {
    let mut map = FreeChunkMap::new();
    map.insert(10, 5);
    map.insert(20, 7);
    map.insert(30, 6);

    // All three live in class 2; the head entry that fits wins.
    let entry = map.take(6).expect("fit exists");
    assert_eq!(entry.descriptor(), ChunkDescriptor::new(20, 7));
}

#[test]
fn take_zero_and_take_from_empty() {
    let mut map = FreeChunkMap::new();
    assert!(map.take(1).is_none());
    map.insert(5, 4);
    assert!(map.take(0).is_none());
    assert_eq!(descriptors(&map).len(), 1, "take(0) has no side effects");
}

#[test]
fn take_none_when_nothing_large_enough() {
    let mut map = FreeChunkMap::new();
    map.insert(0, 3);
    map.insert(10, 6);
    assert!(map.take(7).is_none());
    assert_eq!(descriptors(&map).len(), 2);
}

#[test]
fn max_avail_level_recomputes_downward() {
    let mut map = FreeChunkMap::new();
    map.insert(0, 3); // class 1
    map.insert(100, 40); // class 5
    assert_eq!(map.max_avail_level(), Some(5));

    let taken = map.take(33).expect("the class 5 entry fits");
    assert_eq!(taken.descriptor(), ChunkDescriptor::new(100, 40));
    assert_eq!(map.max_avail_level(), Some(1));

    let taken = map.take(1).expect("the class 1 entry fits");
    assert_eq!(taken.descriptor(), ChunkDescriptor::new(0, 3));
    assert_eq!(map.max_avail_level(), None);
    assert!(map.is_empty());
}

#[test]
fn persists_across_restart() {
    // Serialize, "shut down", deserialize into a fresh map, and the next
    // take observes the same free space.
    let mut map = FreeChunkMap::new();
    map.insert(1, 2);
    map.insert(7, 3);

    let mut restored = round_trip(&map);
    let entry = restored.take(2).expect("persisted entry fits");
    assert_eq!(entry.descriptor(), ChunkDescriptor::new(1, 2));
}

#[test]
fn empty_map_round_trips() {
    let map = FreeChunkMap::new();
    let restored = round_trip(&map);
    assert!(restored.is_empty());
    assert_eq!(restored.max_avail_level(), None);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "duplicate free chunk insert")]
fn duplicate_insert_asserts_in_debug() {
    let mut map = FreeChunkMap::new();
    map.insert(42, 3);
    map.insert(42, 5);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "free chunk insert rejected")]
fn zero_page_insert_asserts_in_debug() {
    let mut map = FreeChunkMap::new();
    map.insert(42, 0);
}

/// Reference model: the set of live free ranges.
#[derive(Default)]
struct ModelMap {
    ranges: Vec<ChunkDescriptor>,
}

impl ModelMap {
    fn insert(&mut self, desc: ChunkDescriptor) {
        self.ranges.push(desc);
    }

    fn any_fit(&self, num_pages: u32) -> bool {
        self.ranges.iter().any(|d| d.num_pages >= num_pages)
    }

    fn remove(&mut self, start: u32) {
        self.ranges.retain(|d| d.start_page_idx != start);
    }
}

fn assert_matches_model(map: &FreeChunkMap, model: &ModelMap) {
    let entries = map.entries();

    // Bijection between chain entries and the seen-set.
    let from_lists: FxHashSet<u32> = entries.iter().map(|(_, d)| d.start_page_idx).collect();
    let from_model: FxHashSet<u32> = model.ranges.iter().map(|d| d.start_page_idx).collect();
    assert_eq!(from_lists, from_model);
    for page in &from_lists {
        assert!(map.contains(*page));
    }
    assert_eq!(entries.len(), from_lists.len());

    // Size-class correctness and max-cache correctness.
    let mut observed_max = None;
    for (level, desc) in &entries {
        assert_eq!(FreeChunkMap::chunk_level(desc.num_pages), *level);
        assert!(desc.num_pages > 0);
        assert!(desc.num_pages < CHUNK_LEVEL_PAGE_LIMITS[*level]);
        observed_max = Some(observed_max.map_or(*level, |m: usize| m.max(*level)));
    }
    assert_eq!(map.max_avail_level(), observed_max);

    // No two live entries overlap.
    let mut sorted: Vec<_> = entries.iter().map(|(_, d)| *d).collect();
    sorted.sort_by_key(|d| d.start_page_idx);
    for pair in sorted.windows(2) {
        assert!(pair[0].end_page_idx() <= pair[1].start_page_idx);
    }
}

#[test]
fn random_histories_hold_all_invariants() {
    let mut rng = StdRng::seed_from_u64(0x6672_6565_6368_6E6B);
    for _ in 0..20 {
        let mut map = FreeChunkMap::new();
        let mut model = ModelMap::default();
        // Fresh ranges come off a cursor so they never overlap.
        let mut cursor: u32 = 0;

        for _ in 0..400 {
            if rng.random_range(0..3) < 2 {
                let num_pages = rng.random_range(1..200u32);
                map.insert(cursor, num_pages);
                model.insert(ChunkDescriptor::new(cursor, num_pages));
                cursor += num_pages + rng.random_range(0..4u32);
            } else {
                let request = rng.random_range(1..220u32);
                let had_fit = model.any_fit(request);
                match map.take(request) {
                    Some(entry) => {
                        // Fit soundness.
                        assert!(entry.num_pages >= request);
                        assert!(had_fit);
                        model.remove(entry.page_idx);
                        // Re-insert the unused tail like a real caller.
                        if entry.num_pages > request {
                            let tail_start = entry.page_idx + request;
                            let tail_pages = entry.num_pages - request;
                            map.insert(tail_start, tail_pages);
                            model.insert(ChunkDescriptor::new(tail_start, tail_pages));
                        }
                    }
                    // Fit completeness.
                    None => assert!(!had_fit),
                }
            }
            assert_matches_model(&map, &model);
        }

        // Round-trip persistence for the reachable end state.
        assert_eq!(round_trip(&map), map);
    }
}
