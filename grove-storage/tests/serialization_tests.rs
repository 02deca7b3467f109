#![forbid(unsafe_code)]

use grove_result::Error;
use grove_storage::serialization::{Deserializer, Serializer};
use grove_storage::FreeChunkMap;
use rustc_hash::FxHashSet;

#[test]
fn primitives_round_trip_little_endian() {
    let mut buf = Vec::new();
    let mut serializer = Serializer::new(&mut buf);
    serializer.write_u8(0xAB).expect("u8");
    serializer.write_u32(0xDEAD_BEEF).expect("u32");
    serializer.write_i32(-1).expect("i32");
    serializer.write_u64(u64::MAX - 1).expect("u64");

    // Spot-check the wire order of the u32.
    assert_eq!(&buf[1..5], &[0xEF, 0xBE, 0xAD, 0xDE]);

    let mut deserializer = Deserializer::new(buf.as_slice());
    assert_eq!(deserializer.read_u8().expect("u8"), 0xAB);
    assert_eq!(deserializer.read_u32().expect("u32"), 0xDEAD_BEEF);
    assert_eq!(deserializer.read_i32().expect("i32"), -1);
    assert_eq!(deserializer.read_u64().expect("u64"), u64::MAX - 1);
}

#[test]
fn sets_round_trip() {
    let mut set = FxHashSet::default();
    for page in [3u32, 99, 1024, u32::MAX - 1] {
        set.insert(page);
    }
    let mut buf = Vec::new();
    let mut serializer = Serializer::new(&mut buf);
    serializer.write_u32_set(&set).expect("set");

    let mut deserializer = Deserializer::new(buf.as_slice());
    assert_eq!(deserializer.read_u32_set().expect("set"), set);
}

#[test]
fn breadcrumbs_validate() {
    let mut buf = Vec::new();
    let mut serializer = Serializer::new(&mut buf);
    serializer.write_debugging_info("pageIdx").expect("label");

    let mut deserializer = Deserializer::new(buf.as_slice());
    deserializer.validate_debugging_info("pageIdx").expect("match");

    let mut deserializer = Deserializer::new(buf.as_slice());
    match deserializer.validate_debugging_info("numPages") {
        Err(Error::CorruptedMetadata(_)) => {}
        other => panic!("expected CorruptedMetadata, got {other:?}"),
    }
}

#[test]
fn corrupted_breadcrumb_refuses_the_map() {
    let mut map = FreeChunkMap::new();
    map.insert(10, 3);
    let mut buf = Vec::new();
    let mut serializer = Serializer::new(&mut buf);
    map.serialize(&mut serializer).expect("serialize");

    // Flip one byte inside the leading "maxAvailLevel" breadcrumb.
    buf[8] ^= 0x20;
    let mut restored = FreeChunkMap::new();
    let mut deserializer = Deserializer::new(buf.as_slice());
    match restored.deserialize(&mut deserializer) {
        Err(Error::CorruptedMetadata(_)) => {}
        other => panic!("expected CorruptedMetadata, got {other:?}"),
    }
}

#[test]
fn out_of_range_size_class_refuses_the_map() {
    let mut buf = Vec::new();
    let mut serializer = Serializer::new(&mut buf);
    serializer
        .write_debugging_info("maxAvailLevel")
        .expect("label");
    serializer.write_i32(9).expect("bad level");

    let mut restored = FreeChunkMap::new();
    let mut deserializer = Deserializer::new(buf.as_slice());
    match restored.deserialize(&mut deserializer) {
        Err(Error::CorruptedMetadata(message)) => {
            assert!(message.contains("size class"), "unexpected message: {message}");
        }
        other => panic!("expected CorruptedMetadata, got {other:?}"),
    }
}

#[test]
fn failed_deserialize_leaves_the_map_untouched() {
    let mut map = FreeChunkMap::new();
    map.insert(5, 4);

    let mut deserializer = Deserializer::new(&[][..]);
    assert!(map.deserialize(&mut deserializer).is_err());
    assert!(map.contains(5), "map must survive a rejected open");
}
