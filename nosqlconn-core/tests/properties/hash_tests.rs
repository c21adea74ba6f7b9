//! Property tests for the content hash and log file naming

use nosqlconn_core::models::compiled_engines;
use nosqlconn_core::{ConnectionSettingsFactory, ConnectionSettingsPath, ConnectionType, crc64};
use proptest::prelude::*;
use std::path::PathBuf;

fn arb_engine() -> impl Strategy<Value = ConnectionType> {
    prop::sample::select(compiled_engines())
}

fn arb_path() -> impl Strategy<Value = ConnectionSettingsPath> {
    prop::collection::vec("[a-z0-9_-]{1,10}", 1..4)
        .prop_map(|segments| ConnectionSettingsPath::new(&format!("/{}", segments.join("/"))))
}

#[test]
fn crc64_check_value() {
    assert_eq!(crc64(0, b"123456789"), 0xe9c6_d914_c4b8_d9ca);
}

#[test]
fn logging_extensions_per_engine() {
    let expected = [
        (ConnectionType::Redis, ".red"),
        (ConnectionType::Memcached, ".mem"),
        (ConnectionType::Ssdb, ".ssdb"),
        (ConnectionType::LevelDb, ".leveldb"),
        (ConnectionType::RocksDb, ".rocksdb"),
        (ConnectionType::UnQLite, ".unq"),
        (ConnectionType::Lmdb, ".lmdb"),
        (ConnectionType::UpscaleDb, ".upscaledb"),
        (ConnectionType::ForestDb, ".forestdb"),
        (ConnectionType::Pika, ".pika"),
    ];
    let factory = ConnectionSettingsFactory::new("/var/log/nosqlconn");

    for (engine, extension) in expected {
        if !engine.is_compiled() {
            continue;
        }
        let settings = factory.create_from_type_connection(engine, "/p".into());
        let expected_path = PathBuf::from(format!(
            "/var/log/nosqlconn/{}{extension}",
            crc64(0, b"/p")
        ));
        assert_eq!(settings.logging_path(), expected_path, "{engine}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The hash is the decimal CRC-64 of the normalized path
    #[test]
    fn hash_is_crc_of_path(engine in arb_engine(), path in arb_path()) {
        let factory = ConnectionSettingsFactory::new("/logs");
        let settings = factory.create_from_type_connection(engine, path.clone());
        prop_assert_eq!(settings.hash(), crc64(0, path.as_str().as_bytes()).to_string());
    }

    /// Equal paths give equal hashes whatever the engine
    #[test]
    fn hash_depends_only_on_path(
        a in arb_engine(),
        b in arb_engine(),
        path in arb_path(),
    ) {
        let factory = ConnectionSettingsFactory::new("/logs");
        let first = factory.create_from_type_connection(a, path.clone());
        let second = factory.create_from_type_connection(b, path);
        prop_assert_eq!(first.hash(), second.hash());
    }

    /// Changing the path refreshes the hash
    #[test]
    fn rename_changes_hash(engine in arb_engine(), a in arb_path(), b in arb_path()) {
        prop_assume!(a != b);
        let factory = ConnectionSettingsFactory::new("/logs");
        let mut settings = factory.create_from_type_connection(engine, a);
        let before = settings.hash().to_string();
        settings.set_connection_path_and_update_hash(b.clone());

        prop_assert_eq!(settings.path(), &b);
        prop_assert_ne!(settings.hash(), before.as_str());
    }

    /// Chained digests equal the digest of the concatenation
    #[test]
    fn crc64_chains(a in prop::collection::vec(any::<u8>(), 0..64), b in prop::collection::vec(any::<u8>(), 0..64)) {
        let whole: Vec<u8> = a.iter().chain(&b).copied().collect();
        prop_assert_eq!(crc64(crc64(0, &a), &b), crc64(0, &whole));
    }
}
