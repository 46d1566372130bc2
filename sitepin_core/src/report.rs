//! Structured progress events of a publish run.
//!
//! The workflow only ever emits [`PublishEvent`]s; turning them into text
//! (or anything else) is up to the [`Report`] implementation supplied by
//! the caller.

use crate::types::{ContentAddress, KeyId, NameRecord};
use std::path::PathBuf;
use std::sync::Mutex;

/// Which teardown call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    Unpin,
    Remove,
}

impl TeardownStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpin => "unpin",
            Self::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishEvent {
    /// The node answered the identity query.
    NodeIdentified { id: String },
    /// The operator's key name was found on the node.
    KeyResolved { name: String, id: KeyId },
    /// The key has no record yet (or it expired); nothing to tear down.
    NoPreviousRecord { key: KeyId, error: String },
    /// Resolving the previous record failed for another reason; teardown is
    /// skipped all the same.
    PreviousResolveFailed { key: KeyId, error: String },
    /// The key currently points at `address`.
    PreviousSnapshot { address: ContentAddress },
    /// Cleaning up the previous snapshot failed; the run continues.
    TeardownFailed {
        step: TeardownStep,
        address: ContentAddress,
        error: String,
    },
    /// The previous snapshot was unpinned and removed.
    PreviousSnapshotRetired { address: ContentAddress },
    ContentIngested {
        path: PathBuf,
        address: ContentAddress,
    },
    ContentPinned { address: ContentAddress },
    Published { key_name: String, record: NameRecord },
}

/// Sink for [`PublishEvent`]s.
pub trait Report: Send + Sync {
    fn report(&self, event: &PublishEvent);
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingReport {
    events: Mutex<Vec<PublishEvent>>,
}

impl RecordingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PublishEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Report for RecordingReport {
    fn report(&self, event: &PublishEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
