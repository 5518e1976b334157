//! Server addresses and cluster settings.
//!
//! Settings are usually read from a MongoDB connection string as defined by
//! [the manual](http://docs.mongodb.org/manual/reference/connection-string/);
//! only the parts that shape a cluster description (hosts, `replicaSet`,
//! `connect`) are interpreted here.
use crate::error::Error::ArgumentError;
use crate::error::Result;
use crate::topology::server::ServerDescription;
use crate::topology::{ClusterConnectionMode, ClusterDescription};

use serde_derive::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
pub const URI_SCHEME: &str = "mongodb://";

/// Encapsulates the hostname and port of a server.
///
/// Addresses order by host name, then by port.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    /// Creates an address from a host name and port. The host name is lowercased.
    pub fn new(host: &str, port: u16) -> ServerAddress {
        ServerAddress {
            host: host.to_ascii_lowercase(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for ServerAddress {
    fn default() -> ServerAddress {
        ServerAddress::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.host.contains(':') {
            write!(fmt, "[{}]:{}", self.host, self.port)
        } else {
            write!(fmt, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for ServerAddress {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_host(s)
    }
}

// Parses a literal IPv6 host entity of the form [host] or [host]:port
fn parse_ipv6_literal_host(entity: &str) -> Result<ServerAddress> {
    let end = match entity.find(']') {
        Some(idx) => idx,
        None => {
            return Err(ArgumentError(
                "An IPv6 address must be enclosed in '[' and ']' according to RFC 2732.".to_owned(),
            ))
        }
    };

    let host = &entity[1..end];
    let rest = &entity[end + 1..];

    if rest.is_empty() {
        Ok(ServerAddress::new(host, DEFAULT_PORT))
    } else if rest.starts_with(':') {
        Ok(ServerAddress::new(host, parse_port(&rest[1..])?))
    } else {
        Err(ArgumentError(format!("Unexpected characters after IPv6 literal: '{}'.", rest)))
    }
}

fn parse_port(port: &str) -> Result<u16> {
    port.parse::<u16>()
        .map_err(|_| ArgumentError(format!("Port must be an unsigned 16-bit integer, got '{}'.", port)))
}

/// Parses a host entity of the form host or host:port, and redirects IPv6 entities.
/// All host names are lowercased.
pub fn parse_host(entity: &str) -> Result<ServerAddress> {
    if entity.is_empty() {
        return Err(ArgumentError("The empty string is not a valid host.".to_owned()));
    }

    if let Some(c) = entity.chars().find(|c| "/?@,".contains(*c)) {
        return Err(ArgumentError(format!("Invalid character '{}' in host '{}'.", c, entity)));
    }

    if entity.starts_with('[') {
        return parse_ipv6_literal_host(entity);
    }

    let (host, port) = partition(entity, ":");
    if host.is_empty() {
        return Err(ArgumentError(format!("Missing host name in '{}'.", entity)));
    }

    if !entity.contains(':') {
        return Ok(ServerAddress::new(host, DEFAULT_PORT));
    }

    if port.contains(':') {
        return Err(ArgumentError(
            "Reserved characters such as ':' must be escaped according to RFC 2396. \
             An IPv6 address literal must be enclosed in '[' and ']' according to RFC 2732."
                .to_owned(),
        ));
    }

    Ok(ServerAddress::new(host, parse_port(port)?))
}

// Splits and parses comma-separated hosts.
fn split_hosts(host_str: &str) -> Result<Vec<ServerAddress>> {
    host_str
        .split(',')
        .map(|entity| {
            if entity.is_empty() {
                Err(ArgumentError("Empty host, or extra comma in host list.".to_owned()))
            } else {
                parse_host(entity)
            }
        })
        .collect()
}

// Determines the option delimiter and collects key=value pairs. Keys are lowercased.
fn split_options(opts: &str) -> Result<BTreeMap<String, String>> {
    let delim = match (opts.contains('&'), opts.contains(';')) {
        (true, true) => {
            return Err(ArgumentError("Cannot mix '&' and ';' for option separators.".to_owned()))
        }
        (true, false) => '&',
        _ => ';',
    };

    let mut options = BTreeMap::new();
    for opt in opts.split(delim).filter(|opt| !opt.is_empty()) {
        if !opt.contains('=') {
            return Err(ArgumentError(format!(
                "InvalidURI: MongoDB URI options are key=value pairs, got '{}'.",
                opt
            )));
        }
        let (key, val) = partition(opt, "=");
        options.insert(key.to_ascii_lowercase(), val.to_owned());
    }

    Ok(options)
}

// Partitions a string around the left-most occurrence of the separator, if it exists.
fn partition<'a>(string: &'a str, sep: &str) -> (&'a str, &'a str) {
    match string.find(sep) {
        Some(idx) => (&string[..idx], &string[idx + sep.len()..]),
        None => (string, ""),
    }
}

// Partitions a string around the right-most occurrence of the separator, if it exists.
fn rpartition<'a>(string: &'a str, sep: &str) -> (&'a str, &'a str) {
    match string.rfind(sep) {
        Some(idx) => (&string[..idx], &string[idx + sep.len()..]),
        None => (string, ""),
    }
}

/// Configuration shared by every description produced for one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSettings {
    hosts: Vec<ServerAddress>,
    mode: ClusterConnectionMode,
    required_replica_set_name: Option<String>,
}

impl ClusterSettings {
    pub fn builder() -> ClusterSettingsBuilder {
        ClusterSettingsBuilder::default()
    }

    /// The seed list of hosts.
    pub fn hosts(&self) -> &[ServerAddress] {
        &self.hosts
    }

    pub fn mode(&self) -> ClusterConnectionMode {
        self.mode
    }

    pub fn required_replica_set_name(&self) -> Option<&str> {
        self.required_replica_set_name.as_ref().map(String::as_str)
    }

    /// Builds a description of the given member snapshot under these settings.
    pub fn description<I>(&self, members: I) -> ClusterDescription
    where
        I: IntoIterator<Item = ServerDescription>,
    {
        ClusterDescription::with_required_set_name(
            members,
            self.mode,
            self.required_replica_set_name.clone(),
        )
    }
}

/// Incrementally assembles `ClusterSettings`.
#[derive(Debug, Clone, Default)]
pub struct ClusterSettingsBuilder {
    hosts: Vec<ServerAddress>,
    mode: Option<ClusterConnectionMode>,
    required_replica_set_name: Option<String>,
}

impl ClusterSettingsBuilder {
    pub fn host(mut self, address: ServerAddress) -> Self {
        self.hosts.push(address);
        self
    }

    pub fn hosts<I>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = ServerAddress>,
    {
        self.hosts.extend(addresses);
        self
    }

    /// Overrides the mode otherwise inferred from the host list.
    pub fn mode(mut self, mode: ClusterConnectionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn required_replica_set_name<S: Into<String>>(mut self, name: S) -> Self {
        self.required_replica_set_name = Some(name.into());
        self
    }

    /// Validates the collected values. A single seed host without a required
    /// replica set name defaults to `Single`; anything else to `Discovering`.
    pub fn build(self) -> Result<ClusterSettings> {
        if self.hosts.is_empty() {
            return Err(ArgumentError("At least one host is required.".to_owned()));
        }

        let mode = match self.mode {
            Some(mode) => mode,
            None if self.hosts.len() == 1 && self.required_replica_set_name.is_none() => {
                ClusterConnectionMode::Single
            }
            None => ClusterConnectionMode::Discovering,
        };

        if mode == ClusterConnectionMode::Single && self.hosts.len() > 1 {
            return Err(ArgumentError(format!(
                "Single connection mode requires exactly one host, got {}.",
                self.hosts.len()
            )));
        }

        Ok(ClusterSettings {
            hosts: self.hosts,
            mode,
            required_replica_set_name: self.required_replica_set_name,
        })
    }
}

/// Parses a MongoDB connection string into cluster settings.
///
/// Credentials and the database path are accepted but ignored. The
/// `replicaSet` option sets the required replica set name; `connect=direct`
/// and `connect=automatic` force `Single` and `Discovering` respectively.
pub fn parse(address: &str) -> Result<ClusterSettings> {
    if !address.starts_with(URI_SCHEME) {
        return Err(ArgumentError(
            "MongoDB connection string must start with 'mongodb://'.".to_owned(),
        ));
    }

    // Options may follow the host list directly, as in `mongodb://host?opts`.
    let addr = &address[URI_SCHEME.len()..];
    let (location, opts) = partition(addr, "?");
    let (before_path, _) = partition(location, "/");
    let (_, host_str) = if before_path.contains('@') {
        rpartition(before_path, "@")
    } else {
        ("", before_path)
    };

    if host_str.is_empty() {
        return Err(ArgumentError("No host specified in connection string.".to_owned()));
    }

    let mut builder = ClusterSettings::builder().hosts(split_hosts(host_str)?);

    if !opts.is_empty() {
        let options = split_options(opts)?;

        if let Some(name) = options.get("replicaset") {
            if name.is_empty() {
                return Err(ArgumentError("The replicaSet option requires a value.".to_owned()));
            }
            builder = builder.required_replica_set_name(name.as_str());
        }

        match options.get("connect").map(|val| val.to_ascii_lowercase()) {
            Some(ref val) if val == "direct" => builder = builder.mode(ClusterConnectionMode::Single),
            Some(ref val) if val == "automatic" => {
                builder = builder.mode(ClusterConnectionMode::Discovering)
            }
            Some(val) => {
                return Err(ArgumentError(format!(
                    "Unknown value '{}' for the connect option.",
                    val
                )))
            }
            None => (),
        }
    }

    builder.build()
}
