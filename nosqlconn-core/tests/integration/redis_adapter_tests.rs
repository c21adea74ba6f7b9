//! Connection tests and topology discovery against a fake Redis server

use std::time::Duration;

use nosqlconn_core::{
    ConnectionSettings, ConnectionSettingsFactory, ConnectionType, EngineError, HostAndPort,
    RedisConfig, ServerError, ServerRole, ServersManager, SshInfo,
};
use secrecy::SecretString;

use super::fake_redis::{FakeRedis, array, bulk, error, fields, simple};

fn manager() -> ServersManager {
    ServersManager::with_timeout(Duration::from_secs(2))
}

fn redis_settings(engine: ConnectionType, host: HostAndPort) -> ConnectionSettings {
    ConnectionSettingsFactory::new("/tmp/nosqlconn-logs").create_remote_connection(
        engine,
        "/fake".into(),
        host,
    )
}

fn config_mut(settings: &mut ConnectionSettings) -> &mut RedisConfig {
    settings
        .redis_config_mut()
        .expect("Redis-compatible settings")
}

fn pong_server() -> FakeRedis {
    FakeRedis::start(|cmd| match cmd[0].as_str() {
        "PING" => simple("PONG"),
        "AUTH" if cmd.get(1).map(String::as_str) == Some("secret") => simple("OK"),
        "AUTH" => error("WRONGPASS invalid username-password pair"),
        "SELECT" => simple("OK"),
        _ => error("ERR unknown command"),
    })
}

// ========== Connection tests ==========

#[test]
fn ping_succeeds() {
    let server = pong_server();
    let settings = redis_settings(ConnectionType::Redis, server.host());

    manager().test_connection(&settings).expect("ping should succeed");
    assert_eq!(server.commands(), vec![vec!["PING".to_string()]]);
}

#[test]
fn pika_uses_the_same_protocol() {
    let server = pong_server();
    let settings = redis_settings(ConnectionType::Pika, server.host());
    assert!(manager().test_connection(&settings).is_ok());
}

#[test]
fn auth_and_select_precede_ping() {
    let server = pong_server();
    let mut settings = redis_settings(ConnectionType::Redis, server.host());
    let cfg = config_mut(&mut settings);
    cfg.password = Some(SecretString::from("secret"));
    cfg.db_num = 3;

    manager().test_connection(&settings).expect("authenticated ping");
    let names: Vec<String> = server.commands().into_iter().map(|c| c.join(" ")).collect();
    assert_eq!(names, ["AUTH secret", "SELECT 3", "PING"]);
}

#[test]
fn wrong_password_is_auth_error() {
    let server = pong_server();
    let mut settings = redis_settings(ConnectionType::Redis, server.host());
    config_mut(&mut settings).password = Some(SecretString::from("nope"));

    let result = manager().test_connection(&settings);
    assert!(
        matches!(result, Err(ServerError::Adapter(EngineError::Auth(_)))),
        "{result:?}"
    );
}

#[test]
fn noauth_reply_is_auth_error() {
    let server = FakeRedis::start(|_| error("NOAUTH Authentication required."));
    let settings = redis_settings(ConnectionType::Redis, server.host());

    let result = manager().test_connection(&settings);
    assert!(matches!(result, Err(ServerError::Adapter(EngineError::Auth(_)))));
}

#[test]
fn unexpected_reply_is_protocol_error() {
    let server = FakeRedis::start(|_| simple("HELLO"));
    let settings = redis_settings(ConnectionType::Redis, server.host());

    let result = manager().test_connection(&settings);
    assert!(matches!(result, Err(ServerError::Adapter(EngineError::Protocol(_)))));
}

#[test]
fn oversized_bulk_reply_is_protocol_error() {
    let server = FakeRedis::start(|_| b"$9223372036854775807\r\n".to_vec());
    let settings = redis_settings(ConnectionType::Redis, server.host());

    let result = manager().test_connection(&settings);
    assert!(
        matches!(&result, Err(ServerError::Adapter(EngineError::Protocol(msg))) if msg.contains("too large")),
        "{result:?}"
    );
}

#[test]
fn endlessly_nested_reply_is_protocol_error() {
    let server = FakeRedis::start(|_| b"*1\r\n".repeat(100_000));
    let settings = redis_settings(ConnectionType::Redis, server.host());

    let result = manager().test_connection(&settings);
    assert!(
        matches!(&result, Err(ServerError::Adapter(EngineError::Protocol(msg))) if msg.contains("too deep")),
        "{result:?}"
    );
}

#[test]
fn ssh_enabled_probes_only_the_bastion() {
    let bastion = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let bastion_port = bastion.local_addr().unwrap().port();

    // Nothing listens on the Redis port; only the SSH endpoint is probed.
    let mut settings = redis_settings(ConnectionType::Redis, HostAndPort::new("10.255.255.1", 6379));
    settings.set_ssh_info(SshInfo::with_password(
        HostAndPort::localhost(bastion_port),
        "ops",
        SecretString::from("pw"),
    ));

    assert!(manager().test_connection(&settings).is_ok());
}

// ========== Discovery ==========

const NODES: &str = "\
07c37dfeb235213a872192d90877d0cd55635b91 127.0.0.1:30004@31004 slave e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 0 1426238317239 4 connected
67ed2db8d677e59ec4a4cefb06858cf2a1a89fa1 127.0.0.1:30002@31002 master - 0 1426238316232 2 connected 5461-10922
e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 127.0.0.1:30001@31001 myself,master - 0 0 1 connected 0-5460
";

#[test]
fn cluster_discovery_parses_nodes() {
    let server = FakeRedis::start(|cmd| {
        if cmd.join(" ") == "CLUSTER NODES" {
            bulk(NODES)
        } else {
            error("ERR unknown command")
        }
    });
    let settings = redis_settings(ConnectionType::Redis, server.host());

    let nodes = manager()
        .discovery_cluster_connection(&settings)
        .expect("cluster discovery");
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].role, ServerRole::Slave);
    assert_eq!(nodes[1].host, HostAndPort::new("127.0.0.1", 30002));
    assert!(nodes[2].is_self);
    assert!(nodes.iter().all(|n| n.connected));
}

#[test]
fn cluster_discovery_error_reply() {
    let server = FakeRedis::start(|_| error("ERR This instance has cluster support disabled"));
    let settings = redis_settings(ConnectionType::Redis, server.host());

    let result = manager().discovery_cluster_connection(&settings);
    assert!(matches!(result, Err(ServerError::Adapter(EngineError::Protocol(_)))));
}

#[test]
fn sentinel_discovery_lists_masters_and_replicas() {
    let server = FakeRedis::start(|cmd| match cmd.join(" ").as_str() {
        "SENTINEL MASTERS" => array(&[fields(&[
            ("name", "mymaster"),
            ("ip", "10.0.0.1"),
            ("port", "6379"),
            ("flags", "master"),
        ])]),
        "SENTINEL SLAVES mymaster" => array(&[
            fields(&[("name", "10.0.0.2:6379"), ("ip", "10.0.0.2"), ("port", "6379")]),
            fields(&[("name", "10.0.0.3:6380"), ("ip", "10.0.0.3"), ("port", "6380")]),
        ]),
        _ => error("ERR unknown command"),
    });
    let settings = redis_settings(ConnectionType::Redis, server.host());

    let servers = manager()
        .discovery_sentinel_connection(&settings)
        .expect("sentinel discovery");
    assert_eq!(servers.len(), 3);
    assert!(servers.iter().all(|s| s.master_name == "mymaster"));
    assert_eq!(servers[0].role, ServerRole::Master);
    assert_eq!(servers[0].host, HostAndPort::new("10.0.0.1", 6379));
    assert_eq!(servers[2].role, ServerRole::Slave);
    assert_eq!(servers[2].host, HostAndPort::new("10.0.0.3", 6380));
}

#[test]
fn discovery_through_ssh_is_unsupported() {
    let mut settings = redis_settings(ConnectionType::Redis, HostAndPort::localhost(6379));
    settings.set_ssh_info(SshInfo::with_password(
        HostAndPort::new("bastion", 22),
        "ops",
        SecretString::from("pw"),
    ));

    assert_eq!(
        manager().discovery_cluster_connection(&settings),
        Err(ServerError::Adapter(EngineError::Unsupported(
            "discovery through an SSH tunnel"
        )))
    );
}
