use sitepin_core::{PublishEvent, Report};
use tracing::{info, warn};

/// Renders publish events as log lines on stderr.
pub struct LogReporter;

impl Report for LogReporter {
    fn report(&self, event: &PublishEvent) {
        let line = describe(event);
        match event {
            PublishEvent::PreviousResolveFailed { .. } | PublishEvent::TeardownFailed { .. } => {
                warn!("{line}")
            }
            _ => info!("{line}"),
        }
    }
}

pub fn describe(event: &PublishEvent) -> String {
    match event {
        PublishEvent::NodeIdentified { id } => format!("publishing through node {id}"),
        PublishEvent::KeyResolved { name, id } => format!("using key '{name}' ({id})"),
        PublishEvent::NoPreviousRecord { key, error } => {
            format!("nothing published under {key} yet, skipping cleanup ({error})")
        }
        PublishEvent::PreviousResolveFailed { key, error } => {
            format!("ignored error: could not resolve previous record of {key}, skipping cleanup: {error}")
        }
        PublishEvent::PreviousSnapshot { address } => format!("old CID: {address}"),
        PublishEvent::TeardownFailed {
            step,
            address,
            error,
        } => format!(
            "ignored error: {} of old CID {address} failed: {error}",
            step.as_str()
        ),
        PublishEvent::PreviousSnapshotRetired { address } => {
            format!("unpinned and removed old CID {address}")
        }
        PublishEvent::ContentIngested { path, address } => {
            format!("added {} as {address}", path.display())
        }
        PublishEvent::ContentPinned { address } => format!("pinned {address}"),
        PublishEvent::Published { key_name, record } => format!(
            "published {} under key '{key_name}' ({})",
            record.address, record.key
        ),
    }
}
