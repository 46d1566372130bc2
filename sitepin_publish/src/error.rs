use crate::PublishState;
use sitepin_core::{ApiError, ContentAddress, KeyId, KeyResolveError};
use std::path::PathBuf;
use thiserror::Error;

/// A failure that aborts the publish run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PublishError {
    #[error("node identity check failed")]
    Identity(#[source] ApiError),

    #[error("could not list keys on the node")]
    KeyList(#[source] ApiError),

    #[error("no key named '{name}' exists on the node")]
    KeyNotFound { name: String },

    #[error("failed to add {} to the node", .path.display())]
    Ingest {
        path: PathBuf,
        #[source]
        source: ApiError,
    },

    #[error("failed to pin {address}")]
    Pin {
        address: ContentAddress,
        #[source]
        source: ApiError,
    },

    #[error("failed to publish {address} under key {key}")]
    Publish {
        address: ContentAddress,
        key: KeyId,
        #[source]
        source: ApiError,
    },
}

impl PublishError {
    /// The state the run was in when it aborted.
    pub fn state(&self) -> PublishState {
        match self {
            Self::Identity(_) => PublishState::Init,
            Self::KeyList(_) | Self::KeyNotFound { .. } => PublishState::IdentityChecked,
            Self::Ingest { .. } => PublishState::TeardownAttempted,
            Self::Pin { .. } => PublishState::ContentIngested,
            Self::Publish { .. } => PublishState::ContentPinned,
        }
    }
}

impl From<KeyResolveError> for PublishError {
    fn from(err: KeyResolveError) -> Self {
        match err {
            KeyResolveError::List(source) => Self::KeyList(source),
            KeyResolveError::KeyNotFound(name) => Self::KeyNotFound { name },
        }
    }
}
