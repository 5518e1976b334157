use mongo_topology::connstring::ServerAddress;
use mongo_topology::topology::server::{ServerConnectionState, ServerDescription, ServerType};
use mongo_topology::topology::{ClusterConnectionMode, ClusterDescription, ClusterType};

use serde_derive::Deserialize;
use tracing_subscriber::EnvFilter;

use std::fs::File;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub address: String,
    pub state: ServerConnectionState,
    #[serde(rename = "type", default)]
    pub stype: ServerType,
    #[serde(default)]
    pub set_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    #[serde(rename = "type")]
    pub ttype: ClusterType,
    #[serde(default)]
    pub set_name: Option<String>,
    pub is_connecting: bool,
    /// Expected member order, as `host:port` strings.
    pub order: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suite {
    pub description: String,
    pub mode: ClusterConnectionMode,
    #[serde(default)]
    pub required_set_name: Option<String>,
    pub servers: Vec<Server>,
    pub outcome: Outcome,
}

impl Server {
    fn to_description(&self) -> Result<ServerDescription, String> {
        let address: ServerAddress = self.address.parse().map_err(|e| format!("{}", e))?;
        let mut builder = ServerDescription::builder()
            .address(address)
            .state(self.state)
            .server_type(self.stype);

        if let Some(ref name) = self.set_name {
            builder = builder.set_name(name.as_str());
        }

        builder.build().map_err(|e| format!("{}", e))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn load_suite(file: &str) -> Suite {
    let reader = File::open(file).unwrap_or_else(|_| panic!("Unable to open file: {}", file));
    serde_json::from_reader(reader).unwrap_or_else(|e| panic!("Invalid suite {}: {}", file, e))
}

pub fn run_suite(file: &str) {
    init_tracing();

    let suite = load_suite(file);
    let members: Vec<ServerDescription> = suite
        .servers
        .iter()
        .map(|server| server.to_description().unwrap())
        .collect();

    let description =
        ClusterDescription::with_required_set_name(members.clone(), suite.mode, suite.required_set_name.clone());

    let context = format!("{} ({})", suite.description, file);
    assert_eq!(suite.mode, description.mode(), "{}", context);
    assert_eq!(suite.outcome.ttype, description.cluster_type(), "{}", context);
    assert_eq!(suite.outcome.set_name.as_ref().map(String::as_str),
               description.replica_set_name(), "{}", context);
    assert_eq!(suite.outcome.is_connecting, description.is_connecting(), "{}", context);

    let order: Vec<String> = description.members().iter().map(|m| m.address().to_string()).collect();
    assert_eq!(suite.outcome.order, order, "{}", context);

    // The same snapshot supplied in reverse must describe the same cluster.
    let reversed = ClusterDescription::with_required_set_name(
        members.into_iter().rev(),
        suite.mode,
        suite.required_set_name,
    );
    assert_eq!(description, reversed, "{}", context);
    assert_eq!(description.cluster_type(), reversed.cluster_type(), "{}", context);
}
