//! Profile store persistence and its interplay with live servers

use std::sync::Arc;

use nosqlconn_core::{
    ConnectionSettingsFactory, ConnectionSettingsPath, ConnectionType, HostAndPort, ProfileStore,
    ServersManager, SkipReason, SshInfo,
};
use secrecy::SecretString;
use tempfile::TempDir;

fn factory(dir: &TempDir) -> ConnectionSettingsFactory {
    ConnectionSettingsFactory::new(dir.path().join("logs"))
}

fn populated_store(factory: &ConnectionSettingsFactory) -> ProfileStore {
    let mut store = ProfileStore::new();

    let mut redis = factory.create_remote_connection(
        ConnectionType::Redis,
        "/work/cache1".into(),
        HostAndPort::new("cache.internal", 6380),
    );
    redis.set_ssh_info(SshInfo::with_password(
        HostAndPort::new("bastion.internal", 2222),
        "ops",
        SecretString::from("hunter2"),
    ));
    store.add(redis).unwrap();

    store
        .add(factory.create_from_type_connection(ConnectionType::Memcached, "/work/sessions".into()))
        .unwrap();

    let mut lmdb = factory.create_from_type_connection(ConnectionType::Lmdb, "/local/env".into());
    lmdb.set_command_line("-f \"/data/my env\" -c -n users").unwrap();
    store.add(lmdb).unwrap();

    store
}

#[test]
fn profiles_survive_save_and_load() {
    let dir = TempDir::new().unwrap();
    let factory = factory(&dir);
    let file = dir.path().join("connections.txt");

    let store = populated_store(&factory);
    store.save(&file).unwrap();

    let mut loaded = ProfileStore::new();
    let skipped = loaded.load(&file, &factory).unwrap();
    assert!(skipped.is_empty());
    assert_eq!(loaded.len(), store.len());

    for (original, restored) in store.iter().zip(loaded.iter()) {
        assert_eq!(original.as_ref(), restored.as_ref());
    }

    let lmdb = loaded.get(&"/local/env".into()).unwrap();
    assert_eq!(lmdb.db_path(), Some("/data/my env"));
    assert_eq!(
        lmdb.logging_path().parent(),
        Some(dir.path().join("logs").as_path())
    );
}

#[test]
fn hand_edited_file_reports_bad_lines() {
    let dir = TempDir::new().unwrap();
    let factory = factory(&dir);
    let file = dir.path().join("connections.txt");
    std::fs::write(
        &file,
        "# exported profiles\n\
         0,/work/cache1,0,:,0,-h 127.0.0.1 -p 6379\n\
         7,/local/upscale\n\
         1,/work/mc,0,:,0,-h 10.0.0.1 -p 11211 -x 1\n\
         0,/work/cache1,0,:,0,-h 127.0.0.1 -p 6379\n",
    )
    .unwrap();

    let mut store = ProfileStore::new();
    let skipped = store.load(&file, &factory).unwrap();

    assert_eq!(store.len(), 1);
    let lines: Vec<usize> = skipped.iter().map(|s| s.line).collect();
    assert_eq!(lines, [3, 4, 5]);
    assert!(matches!(skipped[2].reason, SkipReason::Duplicate(_)));
    assert!(skipped[0].reason.to_string().contains("truncated"));
}

#[test]
fn editing_a_profile_does_not_touch_live_servers() {
    let dir = TempDir::new().unwrap();
    let factory = factory(&dir);
    let mut store = populated_store(&factory);
    let mut manager = ServersManager::new();

    let path = ConnectionSettingsPath::new("/work/cache1");
    let server = manager.create_server(Arc::clone(store.get(&path).unwrap()));

    store
        .update(&path, |s| s.set_host(HostAndPort::new("cache2.internal", 6379)))
        .unwrap();
    store.rename(&path, "/work/cache2".into()).unwrap();

    assert_eq!(server.settings().path(), &path);
    assert_eq!(
        server.settings().host(),
        Some(&HostAndPort::new("cache.internal", 6380))
    );
    assert!(store.get(&path).is_none());

    // The store now holds only the edited copy.
    let removed = store.remove(&"/work/cache2".into()).unwrap();
    assert_eq!(removed.host(), Some(&HostAndPort::new("cache2.internal", 6379)));
    assert!(manager.close_server(&server));
}
