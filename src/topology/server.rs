use crate::connstring::ServerAddress;
use crate::error::{Error, Result};

use bson::oid;
use semver::Version;
use serde_derive::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use super::ClusterType;

/// The last known reachability of a single server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServerConnectionState {
    /// A connection attempt is in progress.
    Connecting,
    /// The server answered its most recent check.
    Connected,
    /// The server could not be reached.
    Unconnected,
}

/// Describes the server role within a server set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServerType {
    /// Standalone server.
    StandAlone,
    /// Replica set primary.
    ReplicaSetPrimary,
    /// Replica set secondary.
    ReplicaSetSecondary,
    /// Replica set arbiter.
    ReplicaSetArbiter,
    /// Replica set member of some other type.
    ReplicaSetOther,
    /// Replica set member that has not yet been configured.
    ReplicaSetGhost,
    /// Shard router.
    ShardRouter,
    /// Server type is currently unknown.
    Unknown,
}

impl Default for ServerType {
    fn default() -> ServerType {
        ServerType::Unknown
    }
}

impl ServerType {
    /// The kind of cluster a server of this type is evidence for.
    pub fn cluster_type(self) -> ClusterType {
        match self {
            ServerType::StandAlone => ClusterType::StandAlone,
            ServerType::ReplicaSetPrimary
            | ServerType::ReplicaSetSecondary
            | ServerType::ReplicaSetArbiter
            | ServerType::ReplicaSetOther
            | ServerType::ReplicaSetGhost => ClusterType::ReplicaSet,
            ServerType::ShardRouter => ClusterType::Sharded,
            ServerType::Unknown => ClusterType::Unknown,
        }
    }

    pub fn is_replica_set_member(self) -> bool {
        self.cluster_type() == ClusterType::ReplicaSet
    }
}

impl FromStr for ServerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "StandAlone" => ServerType::StandAlone,
            "ReplicaSetPrimary" => ServerType::ReplicaSetPrimary,
            "ReplicaSetSecondary" => ServerType::ReplicaSetSecondary,
            "ReplicaSetArbiter" => ServerType::ReplicaSetArbiter,
            "ReplicaSetOther" => ServerType::ReplicaSetOther,
            "ReplicaSetGhost" => ServerType::ReplicaSetGhost,
            "ShardRouter" => ServerType::ShardRouter,
            _ => ServerType::Unknown,
        })
    }
}

/// Server information gathered from one monitoring observation.
///
/// Descriptions are immutable; a newer observation produces a new value.
/// Equality, hashing and ordering cover every field. Descriptions order by
/// address first, then by state, type and set name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServerDescription {
    address: ServerAddress,
    state: ServerConnectionState,
    server_type: ServerType,
    set_name: Option<String>,
    hosts: Vec<ServerAddress>,
    passives: Vec<ServerAddress>,
    arbiters: Vec<ServerAddress>,
    primary: Option<ServerAddress>,
    tags: BTreeMap<String, String>,
    version: Option<Version>,
    min_wire_version: i32,
    max_wire_version: i32,
    election_id: Option<oid::ObjectId>,
    round_trip_time: Option<Duration>,
}

impl ServerDescription {
    pub fn builder() -> ServerDescriptionBuilder {
        ServerDescriptionBuilder::default()
    }

    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    pub fn state(&self) -> ServerConnectionState {
        self.state
    }

    pub fn server_type(&self) -> ServerType {
        self.server_type
    }

    /// The replica set name reported by the server, if any.
    pub fn set_name(&self) -> Option<&str> {
        self.set_name.as_ref().map(String::as_str)
    }

    /// All hosts in the replica set known by this server.
    pub fn hosts(&self) -> &[ServerAddress] {
        &self.hosts
    }

    /// All passive members of the replica set known by this server.
    pub fn passives(&self) -> &[ServerAddress] {
        &self.passives
    }

    /// All arbiters in the replica set known by this server.
    pub fn arbiters(&self) -> &[ServerAddress] {
        &self.arbiters
    }

    /// The server's opinion of who the primary is.
    pub fn primary(&self) -> Option<&ServerAddress> {
        self.primary.as_ref()
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn min_wire_version(&self) -> i32 {
        self.min_wire_version
    }

    pub fn max_wire_version(&self) -> i32 {
        self.max_wire_version
    }

    /// The server's election id, if it believes it is a primary.
    pub fn election_id(&self) -> Option<&oid::ObjectId> {
        self.election_id.as_ref()
    }

    pub fn round_trip_time(&self) -> Option<Duration> {
        self.round_trip_time
    }

    pub fn is_connected(&self) -> bool {
        self.state == ServerConnectionState::Connected
    }

    /// Whether the server is connected and its role is known.
    pub fn is_ok(&self) -> bool {
        self.is_connected() && self.server_type != ServerType::Unknown
    }

    pub fn is_primary(&self) -> bool {
        self.is_connected() && self.server_type == ServerType::ReplicaSetPrimary
    }

    pub fn is_secondary(&self) -> bool {
        self.is_connected() && self.server_type == ServerType::ReplicaSetSecondary
    }

    /// Whether every given tag is present on this server with the same value.
    pub fn has_tags(&self, tags: &BTreeMap<String, String>) -> bool {
        tags.iter().all(|(key, val)| self.tags.get(key) == Some(val))
    }

    /// Whether the server's wire version range overlaps `[min, max]`.
    pub fn is_compatible_with(&self, min_wire_version: i32, max_wire_version: i32) -> bool {
        self.min_wire_version <= max_wire_version && self.max_wire_version >= min_wire_version
    }
}

impl Ord for ServerDescription {
    fn cmp(&self, other: &ServerDescription) -> Ordering {
        self.address
            .cmp(&other.address)
            .then(self.state.cmp(&other.state))
            .then(self.server_type.cmp(&other.server_type))
            .then_with(|| self.set_name.cmp(&other.set_name))
            .then_with(|| self.hosts.cmp(&other.hosts))
            .then_with(|| self.passives.cmp(&other.passives))
            .then_with(|| self.arbiters.cmp(&other.arbiters))
            .then_with(|| self.primary.cmp(&other.primary))
            .then_with(|| self.tags.cmp(&other.tags))
            .then_with(|| self.version.cmp(&other.version))
            .then(self.min_wire_version.cmp(&other.min_wire_version))
            .then(self.max_wire_version.cmp(&other.max_wire_version))
            .then_with(|| {
                let id = |desc: &ServerDescription| desc.election_id.as_ref().map(oid::ObjectId::to_hex);
                id(self).cmp(&id(other))
            })
            .then(self.round_trip_time.cmp(&other.round_trip_time))
    }
}

impl PartialOrd for ServerDescription {
    fn partial_cmp(&self, other: &ServerDescription) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Incrementally assembles a `ServerDescription`.
///
/// `address` and `state` are required; everything else has a safe default.
#[derive(Clone, Debug, Default)]
pub struct ServerDescriptionBuilder {
    address: Option<ServerAddress>,
    state: Option<ServerConnectionState>,
    server_type: ServerType,
    set_name: Option<String>,
    hosts: Vec<ServerAddress>,
    passives: Vec<ServerAddress>,
    arbiters: Vec<ServerAddress>,
    primary: Option<ServerAddress>,
    tags: BTreeMap<String, String>,
    version: Option<Version>,
    min_wire_version: i32,
    max_wire_version: i32,
    election_id: Option<oid::ObjectId>,
    round_trip_time: Option<Duration>,
}

impl ServerDescriptionBuilder {
    pub fn address(mut self, address: ServerAddress) -> Self {
        self.address = Some(address);
        self
    }

    pub fn state(mut self, state: ServerConnectionState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn server_type(mut self, server_type: ServerType) -> Self {
        self.server_type = server_type;
        self
    }

    pub fn set_name<S: Into<String>>(mut self, set_name: S) -> Self {
        self.set_name = Some(set_name.into());
        self
    }

    pub fn hosts(mut self, hosts: Vec<ServerAddress>) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn passives(mut self, passives: Vec<ServerAddress>) -> Self {
        self.passives = passives;
        self
    }

    pub fn arbiters(mut self, arbiters: Vec<ServerAddress>) -> Self {
        self.arbiters = arbiters;
        self
    }

    pub fn primary(mut self, primary: ServerAddress) -> Self {
        self.primary = Some(primary);
        self
    }

    pub fn tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn min_wire_version(mut self, min_wire_version: i32) -> Self {
        self.min_wire_version = min_wire_version;
        self
    }

    pub fn max_wire_version(mut self, max_wire_version: i32) -> Self {
        self.max_wire_version = max_wire_version;
        self
    }

    pub fn election_id(mut self, election_id: oid::ObjectId) -> Self {
        self.election_id = Some(election_id);
        self
    }

    pub fn round_trip_time(mut self, round_trip_time: Duration) -> Self {
        self.round_trip_time = Some(round_trip_time);
        self
    }

    /// Finishes the description, failing if the address or state was never set.
    pub fn build(self) -> Result<ServerDescription> {
        let address = self.address.ok_or(Error::MissingField("address"))?;
        let state = self.state.ok_or(Error::MissingField("state"))?;

        Ok(ServerDescription {
            address,
            state,
            server_type: self.server_type,
            set_name: self.set_name,
            hosts: self.hosts,
            passives: self.passives,
            arbiters: self.arbiters,
            primary: self.primary,
            tags: self.tags,
            version: self.version,
            min_wire_version: self.min_wire_version,
            max_wire_version: self.max_wire_version,
            election_id: self.election_id,
            round_trip_time: self.round_trip_time,
        })
    }
}
