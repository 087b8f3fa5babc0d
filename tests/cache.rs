//! Integration tests for the stability-map file cache.

use ephemid::{CacheParams, MapCache, StabilityMap};

fn sample_map() -> StabilityMap {
    let mut map = StabilityMap::new();
    map.insert("Zq".to_string(), vec!["3f".to_string(), "9k".to_string()]);
    map.insert("Xw".to_string(), vec!["0a".to_string()]);
    map
}

#[test]
fn test_save_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let cache = MapCache::new(dir.path());
    let params = CacheParams {
        model: "cl100k_base",
        prefix: "",
        long: false,
    };

    let map = sample_map();
    cache.save(&params, &map).unwrap();

    let loaded = cache.load(&params).unwrap();
    assert_eq!(loaded, map);
}

#[test]
fn test_key_parameters_partition_entries() {
    let dir = tempfile::tempdir().unwrap();
    let cache = MapCache::new(dir.path());
    let params = CacheParams {
        model: "cl100k_base",
        prefix: "",
        long: false,
    };
    cache.save(&params, &sample_map()).unwrap();

    // Different prefix, mode, or model misses.
    for other in [
        CacheParams { model: "cl100k_base", prefix: "pv", long: false },
        CacheParams { model: "cl100k_base", prefix: "", long: true },
        CacheParams { model: "o200k_base", prefix: "", long: false },
    ] {
        assert!(cache.load(&other).is_none());
    }
}

#[test]
fn test_missing_file_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = MapCache::new(dir.path().join("never-created"));
    let params = CacheParams {
        model: "cl100k_base",
        prefix: "",
        long: false,
    };
    assert!(cache.load(&params).is_none());
}

#[test]
fn test_corrupt_file_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = MapCache::new(dir.path());
    let params = CacheParams {
        model: "cl100k_base",
        prefix: "",
        long: false,
    };

    std::fs::write(
        dir.path().join(MapCache::file_name(&params)),
        b"not json at all",
    )
    .unwrap();
    assert!(cache.load(&params).is_none());

    // A corrupt entry can be overwritten by a fresh save.
    cache.save(&params, &sample_map()).unwrap();
    assert_eq!(cache.load(&params).unwrap(), sample_map());
}

#[test]
fn test_on_disk_format_is_plain_json_object() {
    let dir = tempfile::tempdir().unwrap();
    let cache = MapCache::new(dir.path());
    let params = CacheParams {
        model: "m",
        prefix: "",
        long: false,
    };
    cache.save(&params, &sample_map()).unwrap();

    let raw = std::fs::read_to_string(dir.path().join(MapCache::file_name(&params))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["Zq"], serde_json::json!(["3f", "9k"]));
    assert_eq!(value["Xw"], serde_json::json!(["0a"]));
}
