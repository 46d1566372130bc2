use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Path namespace under which immutable content is addressed.
const IPFS_PREFIX: &str = "/ipfs/";

/// Address of an immutable content tree on the node (a CID).
///
/// Always holds the bare address; `/ipfs/` paths returned by the name
/// service are normalised on construction via [`ContentAddress::from_path`].
/// Never empty when built from a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentAddress(String);

impl ContentAddress {
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    /// Parses either a bare address or an `/ipfs/<cid>` path.
    ///
    /// Trailing path segments after the root address are dropped. Returns
    /// `None` for other namespaces (`/ipns/...`, `/ipld/...`) and for paths
    /// with no address in them.
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        let bare = match trimmed.strip_prefix(IPFS_PREFIX) {
            Some(rest) => rest,
            None if trimmed.starts_with('/') => return None,
            None => trimmed,
        };
        let root = bare.split('/').next().unwrap_or(bare);
        if root.is_empty() {
            return None;
        }
        Some(Self(root.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `/ipfs/<cid>` form expected by the name service.
    pub fn to_path(&self) -> String {
        format!("{IPFS_PREFIX}{}", self.0)
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Node-internal identifier of a signing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signing key known to the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub name: String,
    pub id: KeyId,
}

impl Key {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: KeyId::new(id),
        }
    }
}

/// The node's self-reported identity, used as a liveness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub id: String,
    pub agent_version: Option<String>,
}

/// A mutable name pointer binding a key to a content address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    pub key: KeyId,
    pub address: ContentAddress,
    /// How long the record itself stays valid.
    pub validity: Duration,
    /// How long resolvers may cache the record.
    pub ttl: Duration,
    /// Whether the node must confirm the record resolves before accepting it.
    pub verify_resolvable: bool,
}
