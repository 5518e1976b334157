//! Cluster topology descriptions for MongoDB server discovery.
//!
//! Server monitors observe individual nodes and record what they see as
//! `ServerDescription` values. Once per discovery cycle those observations are
//! folded into a `ClusterDescription`, which classifies the deployment as a
//! standalone server, a replica set, a sharded cluster, a mix of these, or not
//! yet known, and which server selection then consults to pick targets.
//!
//! ```
//! use mongo_topology::connstring::ServerAddress;
//! use mongo_topology::topology::{ClusterConnectionMode, ClusterDescription, ClusterType};
//! use mongo_topology::topology::server::{ServerConnectionState, ServerDescription, ServerType};
//!
//! let primary = ServerDescription::builder()
//!     .address(ServerAddress::new("db1.example.com", 27017))
//!     .state(ServerConnectionState::Connected)
//!     .server_type(ServerType::ReplicaSetPrimary)
//!     .set_name("rs0")
//!     .build()
//!     .unwrap();
//!
//! let description = ClusterDescription::new(vec![primary], ClusterConnectionMode::Discovering);
//! assert_eq!(ClusterType::ReplicaSet, description.cluster_type());
//! assert_eq!(Some("rs0"), description.replica_set_name());
//! ```
pub mod connstring;
pub mod error;
pub mod topology;

pub use crate::error::{Error, Result};
