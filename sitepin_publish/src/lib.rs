//! Publishes a directory as a pinned snapshot and points a name at it.
//!
//! A run moves linearly through [`PublishState`]:
//!
//! 1. ask the node for its identity (liveness check)
//! 2. resolve the operator's key name to the node's key id
//! 3. tear down the snapshot the key currently points at, best effort
//! 4. add the target directory
//! 5. pin the new root
//! 6. publish the new root under the key
//!
//! Step 3 never aborts the run: an unresolvable previous record (including
//! a key that never published) skips cleanup, and a failed unpin or remove
//! is reported and left behind. Every other step is fatal and surfaces as a
//! [`PublishError`]. Nothing is retried or rolled back.
//!
//! Runs assume a single writer per key. Two concurrent runs against the
//! same key are not coordinated; the last publish wins and the loser's
//! snapshot may be left pinned.

mod error;
mod phases;

pub use error::PublishError;
pub use phases::Teardown;

use sitepin_core::{ContentAddress, Key, NameRecord, Node, NodeIdentity, Report};
use std::path::PathBuf;
use std::time::Duration;

/// Validity of published records.
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache lifetime advertised for published records.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PublishState {
    Init,
    IdentityChecked,
    KeyResolved,
    TeardownAttempted,
    ContentIngested,
    ContentPinned,
    Published,
    Done,
}

/// Parameters of one publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishJob {
    /// Name of the node key to publish under.
    pub key_name: String,
    /// Directory to publish.
    pub target: PathBuf,
    pub validity: Duration,
    pub ttl: Duration,
    pub verify_resolvable: bool,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub node: NodeIdentity,
    pub key: Key,
    pub teardown: Teardown,
    pub address: ContentAddress,
    pub record: NameRecord,
}

impl PublishJob {
    pub fn new(key_name: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            key_name: key_name.into(),
            target: target.into(),
            validity: DEFAULT_VALIDITY,
            ttl: DEFAULT_TTL,
            verify_resolvable: true,
        }
    }

    #[tracing::instrument(skip_all, fields(key = %self.key_name, dir = %self.target.display()))]
    pub async fn run<N, R>(&self, node: &N, report: &R) -> Result<PublishOutcome, PublishError>
    where
        N: Node + ?Sized,
        R: Report + ?Sized,
    {
        let identity = phases::check_identity(node, report).await?;
        advance(PublishState::IdentityChecked);

        let key = phases::select_key(node, &self.key_name, report).await?;
        advance(PublishState::KeyResolved);

        let teardown = phases::tear_down_previous(node, &key, report).await;
        advance(PublishState::TeardownAttempted);

        let address = phases::ingest(node, &self.target, report).await?;
        advance(PublishState::ContentIngested);

        phases::pin(node, &address, report).await?;
        advance(PublishState::ContentPinned);

        let record = NameRecord {
            key: key.id.clone(),
            address: address.clone(),
            validity: self.validity,
            ttl: self.ttl,
            verify_resolvable: self.verify_resolvable,
        };
        let record = phases::publish(node, &record, &key.name, report).await?;
        advance(PublishState::Published);

        advance(PublishState::Done);
        Ok(PublishOutcome {
            node: identity,
            key,
            teardown,
            address,
            record,
        })
    }
}

fn advance(state: PublishState) {
    tracing::debug!(?state, "publish state");
}
