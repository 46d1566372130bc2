//! In-memory node for exercising the publish workflow without a network.
//!
//! `MemoryNode` keeps keys, content, pins and name records in memory,
//! records every call it receives in order, and can be told to fail any
//! operation with a chosen [`ApiError`].

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use sitepin_core::{
    ApiError, ContentAddress, ContentStore, Key, KeyId, KeyStore, NameRecord, NameService,
    NameServiceError, NodeIdentity, NodeInfo, StoreError,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

/// Node operations, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Identity,
    ListKeys,
    AddDirectory,
    Pin,
    Unpin,
    Remove,
    Resolve,
    Publish,
}

/// A call received by the node, with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Identity,
    ListKeys,
    AddDirectory(PathBuf),
    Pin(ContentAddress),
    Unpin(ContentAddress),
    Remove {
        address: ContentAddress,
        recursive: bool,
    },
    Resolve(KeyId),
    Publish(NameRecord),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Self::Identity => Op::Identity,
            Self::ListKeys => Op::ListKeys,
            Self::AddDirectory(_) => Op::AddDirectory,
            Self::Pin(_) => Op::Pin,
            Self::Unpin(_) => Op::Unpin,
            Self::Remove { .. } => Op::Remove,
            Self::Resolve(_) => Op::Resolve,
            Self::Publish(_) => Op::Publish,
        }
    }
}

#[derive(Debug)]
pub struct MemoryNode {
    id: String,
    keys: Vec<Key>,
    content: DashSet<ContentAddress>,
    pins: DashSet<ContentAddress>,
    records: DashMap<KeyId, ContentAddress>,
    failures: DashMap<Op, ApiError>,
    calls: Mutex<Vec<Call>>,
}

impl MemoryNode {
    /// Creates an empty node reporting `id` as its identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keys: Vec::new(),
            content: DashSet::new(),
            pins: DashSet::new(),
            records: DashMap::new(),
            failures: DashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_key(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.keys.push(Key::new(name, id));
        self
    }

    /// Seeds a previous publish: `address` is stored, pinned, and published
    /// under `key`.
    pub fn with_record(self, key: impl Into<String>, address: impl Into<String>) -> Self {
        let address = ContentAddress::new(address);
        self.content.insert(address.clone());
        self.pins.insert(address.clone());
        self.records.insert(KeyId::new(key), address);
        self
    }

    /// Makes every subsequent call of `op` fail with `error`.
    pub fn fail(&self, op: Op, error: ApiError) {
        self.failures.insert(op, error);
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.calls().iter().map(Call::op).collect()
    }

    pub fn contains(&self, address: &ContentAddress) -> bool {
        self.content.contains(address)
    }

    pub fn is_pinned(&self, address: &ContentAddress) -> bool {
        self.pins.contains(address)
    }

    /// Address currently published under `key`, if any.
    pub fn record(&self, key: &KeyId) -> Option<ContentAddress> {
        self.records.get(key).map(|entry| entry.value().clone())
    }

    fn enter(&self, call: Call) -> Result<(), ApiError> {
        let op = call.op();
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
        match self.failures.get(&op) {
            Some(error) => Err(error.value().clone()),
            None => Ok(()),
        }
    }
}

/// Derives a deterministic address from the names, kinds and bytes of
/// everything under `root`.
fn hash_tree(root: &Path) -> Result<ContentAddress, StoreError> {
    if !root.exists() {
        return Err(ApiError::NotFound(format!("{} does not exist", root.display())));
    }
    if !root.is_dir() {
        return Err(ApiError::Local(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut hasher = blake3::Hasher::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ApiError::Local(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| ApiError::Local(e.to_string()))?;
        hasher.update(relative.to_string_lossy().as_bytes());
        hasher.update(&[0]);
        if entry.file_type().is_file() {
            let bytes = std::fs::read(entry.path())
                .map_err(|e| ApiError::Local(format!("{}: {e}", entry.path().display())))?;
            hasher.update(b"f");
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        } else {
            hasher.update(b"d");
        }
    }
    Ok(ContentAddress::new(format!("b3{}", hasher.finalize().to_hex())))
}

#[async_trait]
impl NodeInfo for MemoryNode {
    async fn identity(&self) -> Result<NodeIdentity, ApiError> {
        self.enter(Call::Identity)?;
        Ok(NodeIdentity {
            id: self.id.clone(),
            agent_version: Some("sitepin-memory".to_owned()),
        })
    }
}

#[async_trait]
impl KeyStore for MemoryNode {
    async fn list_keys(&self) -> Result<Vec<Key>, ApiError> {
        self.enter(Call::ListKeys)?;
        Ok(self.keys.clone())
    }
}

#[async_trait]
impl ContentStore for MemoryNode {
    async fn add_directory(&self, path: &Path) -> Result<ContentAddress, StoreError> {
        self.enter(Call::AddDirectory(path.to_path_buf()))?;
        let address = hash_tree(path)?;
        self.content.insert(address.clone());
        Ok(address)
    }

    async fn pin(&self, address: &ContentAddress) -> Result<(), StoreError> {
        self.enter(Call::Pin(address.clone()))?;
        if !self.content.contains(address) {
            return Err(ApiError::NotFound(format!("{address} is not stored")));
        }
        self.pins.insert(address.clone());
        Ok(())
    }

    async fn unpin(&self, address: &ContentAddress) -> Result<(), StoreError> {
        self.enter(Call::Unpin(address.clone()))?;
        if self.pins.remove(address).is_none() {
            return Err(ApiError::Remote {
                status: 500,
                message: format!("{address} is not pinned"),
            });
        }
        Ok(())
    }

    async fn remove(&self, address: &ContentAddress, recursive: bool) -> Result<(), StoreError> {
        self.enter(Call::Remove {
            address: address.clone(),
            recursive,
        })?;
        if self.content.remove(address).is_none() {
            return Err(ApiError::NotFound(format!("{address} does not exist")));
        }
        Ok(())
    }
}

#[async_trait]
impl NameService for MemoryNode {
    async fn resolve(&self, key: &KeyId) -> Result<ContentAddress, NameServiceError> {
        self.enter(Call::Resolve(key.clone()))?;
        self.record(key)
            .ok_or_else(|| ApiError::NotFound(format!("could not resolve name {key}")))
    }

    async fn publish(&self, record: &NameRecord) -> Result<NameRecord, NameServiceError> {
        self.enter(Call::Publish(record.clone()))?;
        if !self.keys.iter().any(|key| key.id == record.key) {
            return Err(ApiError::NotFound(format!("no key with id {}", record.key)));
        }
        if record.verify_resolvable && !self.content.contains(&record.address) {
            return Err(ApiError::Remote {
                status: 500,
                message: format!("{} is not resolvable", record.address),
            });
        }
        self.records
            .insert(record.key.clone(), record.address.clone());
        Ok(record.clone())
    }
}
