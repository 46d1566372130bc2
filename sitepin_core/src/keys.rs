use crate::error::ApiError;
use crate::node::KeyStore;
use crate::types::Key;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyResolveError {
    #[error("failed to list keys on node")]
    List(#[source] ApiError),

    #[error("no key named '{0}' exists on the node")]
    KeyNotFound(String),
}

/// Looks up the key whose name exactly matches `name`.
///
/// If several keys share the name, the last one listed wins.
pub async fn resolve_key<K>(keys: &K, name: &str) -> Result<Key, KeyResolveError>
where
    K: KeyStore + ?Sized,
{
    let listed = keys.list_keys().await.map_err(KeyResolveError::List)?;
    tracing::debug!(count = listed.len(), "listed node keys");

    listed
        .into_iter()
        .rfind(|key| key.name == name)
        .ok_or_else(|| KeyResolveError::KeyNotFound(name.to_owned()))
}
