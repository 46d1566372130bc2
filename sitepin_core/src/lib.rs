//! Core sitepin types and traits.
//!
//! This crate defines what every other sitepin crate agrees on:
//!
//! - The data model of a publish: node identities, named signing keys,
//!   content addresses and name records (`types`)
//! - The capabilities a storage node exposes, split into small traits
//!   (`NodeInfo`, `KeyStore`, `ContentStore`, `NameService`) and bundled by
//!   the umbrella `Node` trait (`node`)
//! - The shared error type for node calls (`error::ApiError`)
//! - Key name resolution (`keys`)
//! - Structured progress events and the `Report` sink (`report`)
//!
//! Backends live in their own crates (`sitepin_backend_http`,
//! `sitepin_backend_memory`); the publish workflow lives in
//! `sitepin_publish`.

pub mod error;
pub mod keys;
pub mod node;
pub mod report;
pub mod types;

pub use error::{ApiError, NameServiceError, StoreError};
pub use keys::{KeyResolveError, resolve_key};
pub use node::{ContentStore, KeyStore, NameService, Node, NodeInfo};
pub use report::{PublishEvent, RecordingReport, Report, TeardownStep};
pub use types::{ContentAddress, Key, KeyId, NameRecord, NodeIdentity};
