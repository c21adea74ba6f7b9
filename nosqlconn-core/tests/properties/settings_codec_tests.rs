//! Property tests for the serialized settings line
//!
//! Every compiled engine must survive serialize → parse with its path,
//! namespace options, history interval, command-line payload and SSH info.

use nosqlconn_core::models::compiled_engines;
use nosqlconn_core::{
    ConnectionSettings, ConnectionSettingsFactory, ConnectionSettingsPath, ConnectionType,
    EngineConfig, HostAndPort, LocalConfig, NsDisplayStrategy, RedisConfig, RemoteConfig,
    SettingsError, SshAuthMethod, SshInfo,
};
use proptest::prelude::*;
use secrecy::SecretString;
use std::path::PathBuf;

// ============================================================================
// Strategies for generating test data
// ============================================================================

fn arb_engine() -> impl Strategy<Value = ConnectionType> {
    prop::sample::select(compiled_engines())
}

fn arb_path() -> impl Strategy<Value = ConnectionSettingsPath> {
    prop::collection::vec("[a-zA-Z0-9_ .-]{1,10}", 1..4)
        .prop_map(|segments| ConnectionSettingsPath::new(&format!("/{}", segments.join("/"))))
}

fn arb_host() -> impl Strategy<Value = HostAndPort> {
    ("[a-z][a-z0-9.-]{0,15}", 1u16..=65535).prop_map(|(host, port)| HostAndPort::new(host, port))
}

fn arb_separator() -> impl Strategy<Value = String> {
    "[:./|-]{1,3}"
}

fn arb_strategy() -> impl Strategy<Value = NsDisplayStrategy> {
    prop_oneof![Just(NsDisplayStrategy::FullKey), Just(NsDisplayStrategy::ShortKey)]
}

/// Secret without the field delimiter, may need quoting on the command line
fn arb_inline_secret() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 !@#$%^&*_+=\"\\\\-]{0,16}"
}

fn arb_ssh() -> impl Strategy<Value = SshInfo> {
    let password = ("[a-z][a-z0-9.]{0,10}", 1u16..=65535, "[a-z]{1,8}", "[a-zA-Z0-9!@#$%^&*]{1,12}")
        .prop_map(|(host, port, user, password)| {
            SshInfo::with_password(HostAndPort::new(host, port), user, SecretString::from(password))
        });
    let key = (
        "[a-z][a-z0-9.]{0,10}",
        1u16..=65535,
        "[a-z]{1,8}",
        "/home/[a-z]{1,8}/\\.ssh/id_[a-z]{2,7}",
        prop::option::of("[a-zA-Z0-9]{1,12}"),
    )
        .prop_map(|(host, port, user, key, passphrase)| {
            let mut info = SshInfo::with_private_key(HostAndPort::new(host, port), user, key.clone());
            info.public_key = Some(PathBuf::from(format!("{key}.pub")));
            info.passphrase = passphrase.map(SecretString::from);
            info
        });
    prop_oneof![Just(SshInfo::default()), password, key]
}

fn arb_redis_config() -> impl Strategy<Value = RedisConfig> {
    (
        arb_host(),
        prop::option::of("/tmp/[a-z]{1,8}\\.sock"),
        prop::option::of(arb_inline_secret()),
        0u32..16,
        arb_ssh(),
    )
        .prop_map(|(host, socket, password, db_num, ssh)| RedisConfig {
            host,
            unix_socket: socket.map(PathBuf::from),
            password: password.map(SecretString::from),
            db_num,
            ssh,
        })
}

fn arb_remote_config() -> impl Strategy<Value = RemoteConfig> {
    (
        arb_host(),
        prop::option::of("[a-z]{1,8}"),
        prop::option::of("[a-zA-Z0-9 ,;!@#_-]{0,16}"),
    )
        .prop_map(|(host, user, password)| RemoteConfig {
            host,
            user,
            password: password.map(SecretString::from),
        })
}

fn arb_local_config() -> impl Strategy<Value = LocalConfig> {
    (
        "[a-zA-Z0-9/_., ~-]{1,24}",
        any::<bool>(),
        any::<bool>(),
        prop::option::of("[a-z0-9_]{1,8}"),
    )
        .prop_map(|(path, create, read_only, name)| LocalConfig {
            db_name: name,
            ..LocalConfig::new(path)
                .with_create_if_missing(create)
                .with_read_only(read_only)
        })
}

fn arb_config(engine: ConnectionType) -> BoxedStrategy<EngineConfig> {
    match engine {
        ConnectionType::Redis => arb_redis_config().prop_map(EngineConfig::Redis).boxed(),
        ConnectionType::Pika => arb_redis_config().prop_map(EngineConfig::Pika).boxed(),
        ConnectionType::Memcached => arb_remote_config().prop_map(EngineConfig::Memcached).boxed(),
        ConnectionType::Ssdb => arb_remote_config().prop_map(EngineConfig::Ssdb).boxed(),
        ConnectionType::LevelDb => arb_local_config().prop_map(EngineConfig::LevelDb).boxed(),
        ConnectionType::RocksDb => arb_local_config().prop_map(EngineConfig::RocksDb).boxed(),
        ConnectionType::UnQLite => arb_local_config().prop_map(EngineConfig::UnQLite).boxed(),
        ConnectionType::Lmdb => arb_local_config().prop_map(EngineConfig::Lmdb).boxed(),
        ConnectionType::UpscaleDb => arb_local_config().prop_map(EngineConfig::UpscaleDb).boxed(),
        ConnectionType::ForestDb => arb_local_config().prop_map(EngineConfig::ForestDb).boxed(),
    }
}

fn arb_settings() -> impl Strategy<Value = ConnectionSettings> {
    arb_engine().prop_flat_map(|engine| {
        (
            arb_path(),
            arb_config(engine),
            any::<u32>(),
            arb_separator(),
            arb_strategy(),
        )
            .prop_map(move |(path, config, interval, separator, strategy)| {
                let mut settings = factory().create_from_type_connection(engine, path);
                settings.replace_config(config);
                settings.set_logging_interval_ms(interval);
                settings.set_ns_separator(separator);
                settings.set_ns_display_strategy(strategy);
                settings
            })
    })
}

fn factory() -> ConnectionSettingsFactory {
    ConnectionSettingsFactory::new("/var/log/nosqlconn")
}

// ============================================================================
// Round trip
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// serialize → parse gives back the same settings
    #[test]
    fn settings_line_round_trip(settings in arb_settings()) {
        let line = settings.to_settings_string();
        let parsed = factory().create_from_string_connection(&line);
        prop_assert!(parsed.is_ok(), "failed to parse {:?}: {:?}", line, parsed);
        let parsed = parsed.unwrap();

        prop_assert_eq!(parsed.connection_type(), settings.connection_type());
        prop_assert_eq!(parsed.path(), settings.path());
        prop_assert_eq!(parsed.hash(), settings.hash());
        prop_assert_eq!(parsed.command_line(), settings.command_line());
        prop_assert_eq!(parsed.ssh_info(), settings.ssh_info());
        prop_assert_eq!(&parsed, &settings);
        prop_assert_eq!(parsed.to_settings_string(), line);
    }

    /// The SSH blob is only written when SSH is enabled
    #[test]
    fn ssh_blob_only_when_enabled(settings in arb_settings()) {
        let line = settings.to_settings_string();
        let ssh_enabled = settings.ssh_info().is_some_and(SshInfo::is_enabled);
        prop_assert_eq!(line.contains(";method:"), ssh_enabled);
    }

    /// The command line alone also round-trips through the config
    #[test]
    fn command_line_round_trip(settings in arb_settings()) {
        let mut config = EngineConfig::default_for(settings.connection_type());
        config.set_command_line(&settings.command_line()).unwrap();
        prop_assert_eq!(config.command_line(), settings.command_line());
    }

    /// A bad interval keeps the default instead of failing
    #[test]
    fn invalid_interval_is_lenient(interval in "[a-z]{1,5}") {
        let line = format!("3,/local/db,{interval},:,1,-f /data/db");
        let settings = factory().create_from_string_connection(&line).unwrap();
        prop_assert_eq!(settings.logging_interval_ms(), 0);
        prop_assert_eq!(settings.ns_display_strategy(), NsDisplayStrategy::ShortKey);
    }

    /// Non-digit engine tags are rejected
    #[test]
    fn invalid_engine_tag(tag in "[a-zA-Z]{1,3}|[0-9]{2,3}") {
        let line = format!("{tag},/p,0,:,0,-h localhost -p 1");
        prop_assert_eq!(
            factory().create_from_string_connection(&line),
            Err(SettingsError::InvalidEngineTag(tag))
        );
    }

    /// Lines that stop before the payload are truncated
    #[test]
    fn truncated_lines(engine in arb_engine(), cut in 1usize..5) {
        let settings = factory().create_from_type_connection(engine, "/p".into());
        let line = settings.to_settings_string();
        let prefix: String = line.split(',').take(cut).collect::<Vec<_>>().join(",");
        let result = factory().create_from_string_connection(&prefix);
        prop_assert!(
            matches!(result, Err(SettingsError::Truncated { .. })),
            "{:?} gave {:?}", prefix, result
        );
    }
}

// ============================================================================
// Fixed examples and contract violations
// ============================================================================

#[test]
fn redis_example_line_is_exact() {
    let line = "0,/work/cache1,0,:,0,-h 127.0.0.1 -p 6379";
    let fresh = factory().create_from_type_connection(ConnectionType::Redis, "/work/cache1".into());
    assert_eq!(fresh.to_settings_string(), line);

    let parsed = factory().create_from_string_connection(line).unwrap();
    assert_eq!(parsed, fresh);
}

#[test]
fn ssh_line_parses() {
    let line = "9,/pika/main,100,::,1,-h 10.0.0.5 -p 9221 -a secret,\
                host:bastion:2222;user:ops;password:pw;public_key:;private_key:;passphrase:;method:1;";
    let settings = factory().create_from_string_connection(line).unwrap();

    let ssh = settings.ssh_info().unwrap();
    assert!(ssh.is_enabled());
    assert_eq!(ssh.host, HostAndPort::new("bastion", 2222));
    assert_eq!(ssh.method, SshAuthMethod::Password);
    assert_eq!(settings.host(), Some(&HostAndPort::new("10.0.0.5", 9221)));
    assert_eq!(settings.ns_separator(), "::");
    assert_eq!(settings.to_settings_string(), line);
}

#[test]
fn bad_payload_is_an_error() {
    let result = factory().create_from_string_connection("0,/r,0,:,0,-h localhost -p notaport");
    assert!(matches!(result, Err(SettingsError::InvalidCommandLine { .. })));

    let result =
        factory().create_from_string_connection("0,/r,0,:,0,-h localhost -p 6379,method:9;");
    assert!(matches!(result, Err(SettingsError::InvalidSshInfo(_))));
}

#[test]
#[should_panic(expected = "empty string")]
fn empty_line_panics() {
    let _ = factory().create_from_string_connection("");
}

#[test]
#[should_panic(expected = "not a compiled-in network engine")]
fn remote_constructor_rejects_embedded_engines() {
    let _ = factory().create_remote_connection(
        ConnectionType::LevelDb,
        "/l".into(),
        HostAndPort::localhost(1),
    );
}

#[test]
#[should_panic(expected = "does not support SSH")]
fn ssh_on_memcached_panics() {
    let mut settings =
        factory().create_from_type_connection(ConnectionType::Memcached, "/m".into());
    settings.set_ssh_info(SshInfo::default());
}

#[test]
#[cfg(not(feature = "rocksdb"))]
#[should_panic(expected = "not compiled in")]
fn uncompiled_engine_panics() {
    let _ = factory().create_from_type_connection(ConnectionType::RocksDb, "/r".into());
}

#[test]
#[cfg(not(feature = "rocksdb"))]
fn uncompiled_engine_tag_is_an_error() {
    assert_eq!(
        factory().create_from_string_connection("4,/r,0,:,0,-f /db"),
        Err(SettingsError::EngineNotCompiled(ConnectionType::RocksDb))
    );
}
