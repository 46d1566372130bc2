use crate::error::{RemoteError, classify, from_status, transport};
use crate::multipart::directory_form;
use async_trait::async_trait;
use reqwest::Response;
use reqwest::multipart::Form;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sitepin_core::{
    ApiError, ContentAddress, ContentStore, Key, KeyId, KeyStore, NameRecord, NameService,
    NameServiceError, NodeIdentity, NodeInfo, StoreError,
};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Client for a node's HTTP RPC API (`{shell_url}/api/v0/...`).
///
/// Every command is a `POST` with its arguments in the query string. The
/// `reqwest::Client` is supplied by the caller so transport concerns (TLS
/// client identity, proxies) stay outside this crate.
#[derive(Debug, Clone)]
pub struct HttpNode {
    client: reqwest::Client,
    api_url: Url,
}

impl HttpNode {
    pub fn new(client: reqwest::Client, shell_url: &Url) -> Result<Self, url::ParseError> {
        let mut base = shell_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let api_url = base.join("api/v0/")?;
        Ok(Self { client, api_url })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    async fn post(
        &self,
        command: &str,
        args: &[(&str, &str)],
        form: Option<Form>,
    ) -> Result<Response, ApiError> {
        tracing::debug!(command, ?args, "calling node");
        let mut request = self
            .client
            .post(format!("{}{command}", self.api_url))
            .query(args);
        if let Some(form) = form {
            request = request.multipart(form);
        }
        let res = request.send().await.map_err(transport)?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        Err(from_status(status.as_u16(), &body))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        command: &str,
        args: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let res = self.post(command, args, None).await?;
        let body = res.text().await.map_err(transport)?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{command}: {e}")))
    }

    /// Runs a command whose response body carries nothing we need.
    async fn call_discard(&self, command: &str, args: &[(&str, &str)]) -> Result<(), ApiError> {
        let res = self.post(command, args, None).await?;
        res.bytes().await.map_err(transport)?;
        Ok(())
    }
}

/// Renders a duration the way the node parses it.
fn duration_arg(duration: Duration) -> String {
    format!("{}s", duration.as_secs())
}

fn bool_arg(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Accepts only `/ipfs/<cid>`: a resolution that stopped at another name
/// (`/ipns/...`) or another namespace names nothing that can be unpinned.
fn resolved_address(path: &str) -> Result<ContentAddress, ApiError> {
    path.trim()
        .starts_with("/ipfs/")
        .then(|| ContentAddress::from_path(path))
        .flatten()
        .ok_or_else(|| ApiError::Decode(format!("name/resolve: {path:?} is not an /ipfs/ path")))
}

/// Picks the root entry out of the newline-delimited `add` response.
///
/// The root is reported last, so a body without it is a cut-short upload.
fn parse_add_response(body: &str, root_name: &str) -> Result<ContentAddress, ApiError> {
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Ok(err) = serde_json::from_str::<RemoteError>(line)
            && err.is_error()
        {
            return Err(classify(500, err.message));
        }
        let entry: AddEntry =
            serde_json::from_str(line).map_err(|e| ApiError::Decode(format!("add: {e}")))?;
        let Some(hash) = entry.hash else {
            continue;
        };
        if entry.name == root_name {
            return Ok(ContentAddress::new(hash));
        }
    }
    Err(ApiError::Decode(format!("add: root entry {root_name:?} missing")))
}

#[async_trait]
impl NodeInfo for HttpNode {
    async fn identity(&self) -> Result<NodeIdentity, ApiError> {
        let res: IdResponse = self.call("id", &[]).await?;
        Ok(NodeIdentity {
            id: res.id,
            agent_version: res.agent_version,
        })
    }
}

#[async_trait]
impl KeyStore for HttpNode {
    async fn list_keys(&self) -> Result<Vec<Key>, ApiError> {
        let res: KeyListResponse = self.call("key/list", &[]).await?;
        Ok(res
            .keys
            .into_iter()
            .map(|key| Key::new(key.name, key.id))
            .collect())
    }
}

#[async_trait]
impl ContentStore for HttpNode {
    async fn add_directory(&self, path: &Path) -> Result<ContentAddress, StoreError> {
        let (form, root_name) = directory_form(path).await?;
        let res = self
            .post(
                "add",
                &[("recursive", "true"), ("pin", "false"), ("progress", "false")],
                Some(form),
            )
            .await?;
        let body = res.text().await.map_err(transport)?;
        parse_add_response(&body, &root_name)
    }

    async fn pin(&self, address: &ContentAddress) -> Result<(), StoreError> {
        self.call_discard("pin/add", &[("arg", address.as_str()), ("recursive", "true")])
            .await
    }

    async fn unpin(&self, address: &ContentAddress) -> Result<(), StoreError> {
        self.call_discard("pin/rm", &[("arg", address.as_str()), ("recursive", "true")])
            .await
    }

    async fn remove(&self, address: &ContentAddress, recursive: bool) -> Result<(), StoreError> {
        self.call_discard(
            "files/rm",
            &[("arg", address.as_str()), ("recursive", bool_arg(recursive))],
        )
        .await
    }
}

#[async_trait]
impl NameService for HttpNode {
    async fn resolve(&self, key: &KeyId) -> Result<ContentAddress, NameServiceError> {
        let res: ResolveResponse = self.call("name/resolve", &[("arg", key.as_str())]).await?;
        resolved_address(&res.path)
    }

    async fn publish(&self, record: &NameRecord) -> Result<NameRecord, NameServiceError> {
        let path = record.address.to_path();
        let lifetime = duration_arg(record.validity);
        let ttl = duration_arg(record.ttl);
        let res: PublishResponse = self
            .call(
                "name/publish",
                &[
                    ("arg", path.as_str()),
                    ("key", record.key.as_str()),
                    ("lifetime", lifetime.as_str()),
                    ("ttl", ttl.as_str()),
                    ("resolve", bool_arg(record.verify_resolvable)),
                ],
            )
            .await?;
        Ok(NameRecord {
            key: KeyId::new(res.name),
            address: ContentAddress::from_path(&res.value)
                .unwrap_or_else(|| record.address.clone()),
            ..record.clone()
        })
    }
}

// -- Wire types ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IdResponse {
    #[serde(rename = "ID")]
    id: String,
    #[serde(default)]
    agent_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyListResponse {
    #[serde(default)]
    keys: Vec<KeyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyEntry {
    name: String,
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    hash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResolveResponse {
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PublishResponse {
    name: String,
    value: String,
}
