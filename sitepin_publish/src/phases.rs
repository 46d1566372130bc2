//! One function per workflow phase.
//!
//! Fatal phases return `Result<_, PublishError>`; the teardown phase cannot
//! fail and instead returns a [`Teardown`] describing how far it got.

use crate::PublishError;
use sitepin_core::{
    ApiError, ContentAddress, ContentStore, Key, KeyStore, NameRecord, NameService, NodeIdentity,
    NodeInfo, PublishEvent, Report, TeardownStep, resolve_key,
};
use std::path::Path;

/// What happened to the snapshot the key pointed at before this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Teardown {
    /// The previous record could not be resolved; nothing was touched.
    Skipped { error: ApiError },
    /// The previous snapshot was unpinned and removed.
    Retired { address: ContentAddress },
    /// Cleanup stopped at `step`; later steps were not attempted.
    Incomplete {
        address: ContentAddress,
        step: TeardownStep,
        error: ApiError,
    },
}

impl Teardown {
    /// Address of the previous snapshot, if it could be resolved.
    pub fn previous(&self) -> Option<&ContentAddress> {
        match self {
            Self::Skipped { .. } => None,
            Self::Retired { address } | Self::Incomplete { address, .. } => Some(address),
        }
    }
}

pub(crate) async fn check_identity<N, R>(node: &N, report: &R) -> Result<NodeIdentity, PublishError>
where
    N: NodeInfo + ?Sized,
    R: Report + ?Sized,
{
    let identity = node.identity().await.map_err(PublishError::Identity)?;
    report.report(&PublishEvent::NodeIdentified {
        id: identity.id.clone(),
    });
    Ok(identity)
}

pub(crate) async fn select_key<N, R>(node: &N, name: &str, report: &R) -> Result<Key, PublishError>
where
    N: KeyStore + ?Sized,
    R: Report + ?Sized,
{
    let key = resolve_key(node, name).await?;
    report.report(&PublishEvent::KeyResolved {
        name: key.name.clone(),
        id: key.id.clone(),
    });
    Ok(key)
}

/// Best-effort unpin and removal of whatever `key` currently points at.
pub(crate) async fn tear_down_previous<N, R>(node: &N, key: &Key, report: &R) -> Teardown
where
    N: ContentStore + NameService + ?Sized,
    R: Report + ?Sized,
{
    let address = match node.resolve(&key.id).await {
        Ok(address) => address,
        Err(error) => {
            let event = if error.is_not_found() {
                tracing::debug!(key = %key.id, %error, "no previous record");
                PublishEvent::NoPreviousRecord {
                    key: key.id.clone(),
                    error: error.to_string(),
                }
            } else {
                tracing::debug!(key = %key.id, %error, "resolving previous record failed");
                PublishEvent::PreviousResolveFailed {
                    key: key.id.clone(),
                    error: error.to_string(),
                }
            };
            report.report(&event);
            return Teardown::Skipped { error };
        }
    };
    report.report(&PublishEvent::PreviousSnapshot {
        address: address.clone(),
    });

    if let Err(error) = node.unpin(&address).await {
        return teardown_failed(report, address, TeardownStep::Unpin, error);
    }
    if let Err(error) = node.remove(&address, true).await {
        return teardown_failed(report, address, TeardownStep::Remove, error);
    }

    report.report(&PublishEvent::PreviousSnapshotRetired {
        address: address.clone(),
    });
    Teardown::Retired { address }
}

fn teardown_failed<R: Report + ?Sized>(
    report: &R,
    address: ContentAddress,
    step: TeardownStep,
    error: ApiError,
) -> Teardown {
    tracing::debug!(%address, step = step.as_str(), %error, "teardown step failed");
    report.report(&PublishEvent::TeardownFailed {
        step,
        address: address.clone(),
        error: error.to_string(),
    });
    Teardown::Incomplete {
        address,
        step,
        error,
    }
}

pub(crate) async fn ingest<N, R>(node: &N, path: &Path, report: &R) -> Result<ContentAddress, PublishError>
where
    N: ContentStore + ?Sized,
    R: Report + ?Sized,
{
    let address = node
        .add_directory(path)
        .await
        .map_err(|source| PublishError::Ingest {
            path: path.to_path_buf(),
            source,
        })?;
    report.report(&PublishEvent::ContentIngested {
        path: path.to_path_buf(),
        address: address.clone(),
    });
    Ok(address)
}

pub(crate) async fn pin<N, R>(node: &N, address: &ContentAddress, report: &R) -> Result<(), PublishError>
where
    N: ContentStore + ?Sized,
    R: Report + ?Sized,
{
    node.pin(address).await.map_err(|source| PublishError::Pin {
        address: address.clone(),
        source,
    })?;
    report.report(&PublishEvent::ContentPinned {
        address: address.clone(),
    });
    Ok(())
}

pub(crate) async fn publish<N, R>(
    node: &N,
    record: &NameRecord,
    key_name: &str,
    report: &R,
) -> Result<NameRecord, PublishError>
where
    N: NameService + ?Sized,
    R: Report + ?Sized,
{
    let published = node
        .publish(record)
        .await
        .map_err(|source| PublishError::Publish {
            address: record.address.clone(),
            key: record.key.clone(),
            source,
        })?;
    report.report(&PublishEvent::Published {
        key_name: key_name.to_owned(),
        record: published.clone(),
    });
    Ok(published)
}
