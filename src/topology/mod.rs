//! Cluster-level views assembled from individual server observations.
//!
//! A `ClusterDescription` is a frozen snapshot: it is built once from the
//! server descriptions gathered during one discovery cycle and is superseded,
//! never updated, by the description built for the next cycle.
pub mod server;

use crate::connstring::ServerAddress;
use crate::error::{Error, Result};

use serde_derive::{Deserialize, Serialize};
use tracing::{debug, trace};

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use self::server::{ServerConnectionState, ServerDescription};

/// The oldest wire protocol version this driver can speak.
pub const DRIVER_MIN_WIRE_VERSION: i32 = 0;
/// The newest wire protocol version this driver can speak.
pub const DRIVER_MAX_WIRE_VERSION: i32 = 3;

/// How the members of a cluster are located.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterConnectionMode {
    /// Connect to exactly the configured server.
    Single,
    /// Discover every member of the cluster from the seed list.
    Discovering,
}

/// Describes the type of deployment formed by a set of servers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterType {
    StandAlone,
    ReplicaSet,
    Sharded,
    /// The connected servers disagree about what they belong to.
    Mixed,
    /// No connected server has reported a role yet.
    Unknown,
}

impl FromStr for ClusterConnectionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Single" => Ok(ClusterConnectionMode::Single),
            "Discovering" => Ok(ClusterConnectionMode::Discovering),
            _ => Err(Error::ArgumentError(format!("Unknown cluster connection mode '{}'.", s))),
        }
    }
}

impl fmt::Display for ClusterConnectionMode {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, fmt)
    }
}

impl FromStr for ClusterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "StandAlone" => ClusterType::StandAlone,
            "ReplicaSet" => ClusterType::ReplicaSet,
            "Sharded" => ClusterType::Sharded,
            "Mixed" => ClusterType::Mixed,
            _ => ClusterType::Unknown,
        })
    }
}

impl fmt::Display for ClusterType {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, fmt)
    }
}

/// An immutable view of a cluster at one point in time.
///
/// Members are kept in ascending address order; observations sharing an
/// address are ordered by the rest of their fields. Two descriptions are
/// equal when their modes, required replica set names, and member
/// collections match, regardless of the order members were supplied in.
#[derive(Clone, Debug)]
pub struct ClusterDescription {
    mode: ClusterConnectionMode,
    members: Vec<ServerDescription>,
    required_replica_set_name: Option<String>,
    cluster_type: ClusterType,
    replica_set_name: Option<String>,
}

impl ClusterDescription {
    /// Describes the given members without a required replica set name.
    pub fn new<I>(members: I, mode: ClusterConnectionMode) -> ClusterDescription
    where
        I: IntoIterator<Item = ServerDescription>,
    {
        ClusterDescription::with_required_set_name(members, mode, None)
    }

    /// Describes the given members, expecting every replica set member to
    /// belong to `required_replica_set_name` when one is given.
    ///
    /// Never fails: inconsistent evidence yields `ClusterType::Mixed`, and an
    /// absence of evidence yields `ClusterType::Unknown`.
    pub fn with_required_set_name<I>(
        members: I,
        mode: ClusterConnectionMode,
        required_replica_set_name: Option<String>,
    ) -> ClusterDescription
    where
        I: IntoIterator<Item = ServerDescription>,
    {
        let mut members: Vec<ServerDescription> = members.into_iter().collect();
        members.sort();

        trace!(members = members.len(), %mode, "building cluster description");

        let (cluster_type, replica_set_name) =
            classify(&members, required_replica_set_name.as_ref().map(String::as_str));

        ClusterDescription {
            mode,
            members,
            required_replica_set_name,
            cluster_type,
            replica_set_name,
        }
    }

    /// The connection mode the description was built under.
    pub fn mode(&self) -> ClusterConnectionMode {
        self.mode
    }

    /// The kind of deployment the connected members add up to.
    pub fn cluster_type(&self) -> ClusterType {
        self.cluster_type
    }

    /// The name every replica set member agrees on. Absent unless the cluster
    /// is a replica set whose members reported a consistent name.
    pub fn replica_set_name(&self) -> Option<&str> {
        self.replica_set_name.as_ref().map(String::as_str)
    }

    pub fn required_replica_set_name(&self) -> Option<&str> {
        self.required_replica_set_name.as_ref().map(String::as_str)
    }

    /// Whether any member is still in the middle of connecting.
    pub fn is_connecting(&self) -> bool {
        self.members
            .iter()
            .any(|member| member.state() == ServerConnectionState::Connecting)
    }

    /// All members, in ascending address order.
    pub fn members(&self) -> &[ServerDescription] {
        &self.members
    }

    /// The first observation for `address` in member order.
    pub fn member(&self, address: &ServerAddress) -> Option<&ServerDescription> {
        self.members.iter().find(|member| member.address() == address)
    }

    /// Connected members, in ascending address order.
    pub fn connected(&self) -> Vec<&ServerDescription> {
        self.members.iter().filter(|member| member.is_connected()).collect()
    }

    /// Connected replica set primaries, in ascending address order.
    pub fn primaries(&self) -> Vec<&ServerDescription> {
        self.members.iter().filter(|member| member.is_primary()).collect()
    }

    /// Connected replica set secondaries, in ascending address order.
    pub fn secondaries(&self) -> Vec<&ServerDescription> {
        self.members.iter().filter(|member| member.is_secondary()).collect()
    }

    /// Connected secondaries carrying every one of the given tags.
    pub fn secondaries_with_tags(&self, tags: &BTreeMap<String, String>) -> Vec<&ServerDescription> {
        self.members
            .iter()
            .filter(|member| member.is_secondary() && member.has_tags(tags))
            .collect()
    }

    /// Whether every connected server of known type speaks a wire version
    /// this driver supports.
    pub fn is_compatible_with_driver(&self) -> bool {
        self.compatibility_error().is_none()
    }

    /// Describes the first connected server whose wire versions fall outside
    /// the range this driver supports.
    pub fn compatibility_error(&self) -> Option<String> {
        self.members
            .iter()
            .filter(|member| member.is_ok())
            .find(|member| !member.is_compatible_with(DRIVER_MIN_WIRE_VERSION, DRIVER_MAX_WIRE_VERSION))
            .map(|member| {
                if member.min_wire_version() > DRIVER_MAX_WIRE_VERSION {
                    format!(
                        "Server at {} requires wire version {}, but this driver only supports up to {}.",
                        member.address(),
                        member.min_wire_version(),
                        DRIVER_MAX_WIRE_VERSION
                    )
                } else {
                    format!(
                        "Server at {} reports wire version {}, but this driver requires at least {}.",
                        member.address(),
                        member.max_wire_version(),
                        DRIVER_MIN_WIRE_VERSION
                    )
                }
            })
    }
}

// Derives the cluster type and agreed replica set name from the members that
// are connected with a known role. Any disagreement between them, in role or
// in reported set name, collapses the result to `Mixed`.
fn classify(
    members: &[ServerDescription],
    required_set_name: Option<&str>,
) -> (ClusterType, Option<String>) {
    let mut cluster_type = None;
    let mut set_name: Option<&str> = None;

    for member in members.iter().filter(|member| member.is_ok()) {
        let member_type = member.server_type().cluster_type();
        match cluster_type {
            None => cluster_type = Some(member_type),
            Some(seen) if seen != member_type => {
                debug!(address = %member.address(), %seen, found = %member_type,
                       "cluster members report conflicting roles");
                return (ClusterType::Mixed, None);
            }
            Some(_) => (),
        }

        // Set names are checked for every role, so routers or standalones
        // reporting different names are `Mixed` too.
        if let Some(name) = member.set_name() {
            if let Some(required) = required_set_name {
                if name != required {
                    debug!(address = %member.address(), set_name = name, required,
                           "member set name does not match the required replica set name");
                    return (ClusterType::Mixed, None);
                }
            }

            match set_name {
                None => set_name = Some(name),
                Some(agreed) if agreed != name => {
                    debug!(address = %member.address(), set_name = name, agreed,
                           "cluster members report different set names");
                    return (ClusterType::Mixed, None);
                }
                Some(_) => (),
            }
        }
    }

    match cluster_type {
        None => (ClusterType::Unknown, None),
        Some(ClusterType::ReplicaSet) => (ClusterType::ReplicaSet, set_name.map(str::to_owned)),
        Some(other) => (other, None),
    }
}

// Members are sorted by their total order, so equal collections are
// element-wise equal whatever order they were supplied in.
impl PartialEq for ClusterDescription {
    fn eq(&self, other: &ClusterDescription) -> bool {
        self.mode == other.mode
            && self.required_replica_set_name == other.required_replica_set_name
            && self.members == other.members
    }
}

impl Eq for ClusterDescription {}

impl Hash for ClusterDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mode.hash(state);
        self.required_replica_set_name.hash(state);
        self.members.hash(state);
    }
}

impl fmt::Display for ClusterDescription {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "ClusterDescription {{ mode: {}, type: {}, replica_set_name: {:?}, \
             required_replica_set_name: {:?}, members: [",
            self.mode, self.cluster_type, self.replica_set_name, self.required_replica_set_name
        )?;

        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                fmt.write_str(", ")?;
            }
            write!(fmt, "{} ({:?}, {:?})", member.address(), member.state(), member.server_type())?;
        }

        fmt.write_str("] }")
    }
}
