use mongo_topology::connstring::{self, ClusterSettings, ServerAddress, DEFAULT_PORT};
use mongo_topology::topology::server::{ServerConnectionState, ServerDescription, ServerType};
use mongo_topology::topology::{ClusterConnectionMode, ClusterType};
use mongo_topology::Error;

#[test]
fn parse_host() {
    let address = connstring::parse_host("LocalHost:27018").unwrap();
    assert_eq!("localhost", address.host());
    assert_eq!(27018, address.port());

    let address: ServerAddress = "loc".parse().unwrap();
    assert_eq!(ServerAddress::new("loc", DEFAULT_PORT), address);
}

#[test]
fn parse_ipv6_host() {
    let address = connstring::parse_host("[::1]:27019").unwrap();
    assert_eq!("::1", address.host());
    assert_eq!(27019, address.port());
    assert_eq!("[::1]:27019", address.to_string());

    let address = connstring::parse_host("[fe80::1]").unwrap();
    assert_eq!(DEFAULT_PORT, address.port());
}

#[test]
fn parse_host_errors() {
    assert!(connstring::parse_host("").is_err());
    assert!(connstring::parse_host(":27017").is_err());
    assert!(connstring::parse_host("loc:port").is_err());
    assert!(connstring::parse_host("loc:70000").is_err());
    assert!(connstring::parse_host("::1").is_err());
    assert!(connstring::parse_host("[::1").is_err());
    assert!(connstring::parse_host("[::1]x").is_err());
    assert!(connstring::parse_host("a?replicaSet=rs0").is_err());
    assert!(connstring::parse_host("a/admin").is_err());
    assert!(connstring::parse_host("user@a").is_err());
}

#[test]
fn default_address() {
    let address = ServerAddress::default();
    assert_eq!("localhost:27017", address.to_string());
}

#[test]
fn addresses_order_by_host_then_port() {
    let mut addresses = vec![
        ServerAddress::new("b", 1),
        ServerAddress::new("a", 27018),
        ServerAddress::new("a", 27017),
    ];
    addresses.sort();
    assert_eq!(
        vec![ServerAddress::new("a", 27017), ServerAddress::new("a", 27018), ServerAddress::new("b", 1)],
        addresses
    );
}

#[test]
fn parse_single_host() {
    let settings = connstring::parse("mongodb://localhost").unwrap();
    assert_eq!(&[ServerAddress::default()][..], settings.hosts());
    assert_eq!(ClusterConnectionMode::Single, settings.mode());
    assert_eq!(None, settings.required_replica_set_name());
}

#[test]
fn parse_replica_set() {
    let settings =
        connstring::parse("mongodb://user:pwd@a:27017,b:27018/admin?replicaSet=rs0&w=majority").unwrap();
    assert_eq!(
        &[ServerAddress::new("a", 27017), ServerAddress::new("b", 27018)][..],
        settings.hosts()
    );
    assert_eq!(ClusterConnectionMode::Discovering, settings.mode());
    assert_eq!(Some("rs0"), settings.required_replica_set_name());

    let settings = connstring::parse("mongodb://a/?replicaSet=rs0").unwrap();
    assert_eq!(ClusterConnectionMode::Discovering, settings.mode());
}

#[test]
fn parse_options_without_path() {
    let settings = connstring::parse("mongodb://a?replicaSet=rs0").unwrap();
    assert_eq!(&[ServerAddress::new("a", DEFAULT_PORT)][..], settings.hosts());
    assert_eq!(ClusterConnectionMode::Discovering, settings.mode());
    assert_eq!(Some("rs0"), settings.required_replica_set_name());

    let settings = connstring::parse("mongodb://a:27017,b:27018?replicaSet=rs0&connect=automatic").unwrap();
    assert_eq!(2, settings.hosts().len());
    assert_eq!(Some("rs0"), settings.required_replica_set_name());

    let settings = connstring::parse("mongodb://a:27017/admin").unwrap();
    assert_eq!(ClusterConnectionMode::Single, settings.mode());
    assert_eq!(None, settings.required_replica_set_name());
}

#[test]
fn parse_connect_option() {
    let settings = connstring::parse("mongodb://a:27017/?connect=automatic").unwrap();
    assert_eq!(ClusterConnectionMode::Discovering, settings.mode());

    let settings = connstring::parse("mongodb://a:27017/?replicaSet=rs0;connect=direct").unwrap();
    assert_eq!(ClusterConnectionMode::Single, settings.mode());

    assert!(connstring::parse("mongodb://a,b/?connect=direct").is_err());
    assert!(connstring::parse("mongodb://a/?connect=sometimes").is_err());
}

#[test]
fn parse_errors() {
    match connstring::parse("localhost:27017") {
        Err(Error::ArgumentError(msg)) => assert!(msg.contains("mongodb://")),
        other => panic!("expected argument error, got {:?}", other),
    }

    assert!(connstring::parse("mongodb://").is_err());
    assert!(connstring::parse("mongodb://a,,b").is_err());
    assert!(connstring::parse("mongodb://a/?replicaSet=").is_err());
    assert!(connstring::parse("mongodb://a/?replicaSet").is_err());
}

#[test]
fn builder_validation() {
    assert!(ClusterSettings::builder().build().is_err());

    let settings = ClusterSettings::builder()
        .host(ServerAddress::new("a", 27017))
        .host(ServerAddress::new("b", 27017))
        .build()
        .unwrap();
    assert_eq!(ClusterConnectionMode::Discovering, settings.mode());

    let err = ClusterSettings::builder()
        .hosts(vec![ServerAddress::new("a", 27017), ServerAddress::new("b", 27017)])
        .mode(ClusterConnectionMode::Single)
        .build();
    assert!(err.is_err());
}

#[test]
fn settings_describe_members() {
    let settings = ClusterSettings::builder()
        .host(ServerAddress::new("loc", 27017))
        .required_replica_set_name("rs0")
        .build()
        .unwrap();

    let member = ServerDescription::builder()
        .address(ServerAddress::new("loc", 27017))
        .state(ServerConnectionState::Connected)
        .server_type(ServerType::ReplicaSetPrimary)
        .set_name("rs1")
        .build()
        .unwrap();

    let description = settings.description(vec![member]);
    assert_eq!(ClusterConnectionMode::Discovering, description.mode());
    assert_eq!(Some("rs0"), description.required_replica_set_name());
    assert_eq!(ClusterType::Mixed, description.cluster_type());
}
