//! An HTTP-based implementation of [`DagStore`] against a Kubo-compatible
//! RPC API (`/api/v0/...`).
//!
//! Listings are requested with `resolve-type=false` so that no per-entry
//! type resolution happens on the store side; kinds the store cannot report
//! for free come back as `None` and are confirmed via `files/stat` only when
//! an engine asks.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::export::archive::{self, ArchiveRef};
use crate::model::{ContentId, DirectoryEntry, EntryKind};

use super::dag_store::{DagStore, RawChild, Result, StoreError};

/// HTTP client store for a Kubo-compatible RPC endpoint.
pub struct HttpDagStore {
    client: Client,
    base_url: String,
}

impl HttpDagStore {
    /// Create a new store client pointing at the given RPC base URL
    /// (for example `http://127.0.0.1:5009`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a new store client with a custom reqwest client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/v0/{}", self.base_url, endpoint)
    }

    /// Translate an RPC error response into a `StoreError`.
    async fn error_from_response(
        cid: &ContentId,
        response: reqwest::Response,
    ) -> StoreError {
        let status = response.status();
        let message = match response.json::<RpcError>().await {
            Ok(err) => err.message,
            Err(_) => format!("unexpected status code: {}", status),
        };
        let lowered = message.to_ascii_lowercase();
        if lowered.contains("not a directory") || lowered.contains("not a dir") {
            StoreError::NotDirectory { cid: cid.clone() }
        } else if status == StatusCode::NOT_FOUND
            || lowered.contains("not found")
            || lowered.contains("no link named")
        {
            StoreError::NotFound { cid: cid.clone() }
        } else {
            StoreError::Unavailable(message)
        }
    }

    async fn post_bytes(&self, cid: &ContentId, url: String) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(cid, response).await);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// RPC Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(rename = "Message")]
    message: String,
}

#[derive(Debug, Deserialize)]
struct LsResponse {
    #[serde(rename = "Objects")]
    objects: Vec<LsObject>,
}

#[derive(Debug, Deserialize)]
struct LsObject {
    #[serde(rename = "Links")]
    links: Vec<LsLink>,
}

#[derive(Debug, Deserialize)]
struct LsLink {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Type")]
    type_code: i32,
}

#[derive(Debug, Deserialize)]
struct FilesStatResponse {
    #[serde(rename = "Type")]
    type_name: String,
}

#[derive(Debug, Deserialize)]
struct DagPutResponse {
    #[serde(rename = "Cid")]
    cid: CidRef,
}

#[derive(Debug, Deserialize)]
struct CidRef {
    #[serde(rename = "/")]
    cid: String,
}

/// Link type codes as reported by `ls`.
fn kind_from_type_code(code: i32) -> Option<EntryKind> {
    match code {
        1 => Some(EntryKind::Directory),
        2 => Some(EntryKind::File),
        _ => None,
    }
}

// =============================================================================
// DagStore Implementation
// =============================================================================

#[async_trait]
impl DagStore for HttpDagStore {
    async fn list_children(&self, cid: &ContentId) -> Result<Vec<RawChild>> {
        let url = format!(
            "{}?arg={}&resolve-type=false&size=false",
            self.api_url("ls"),
            cid
        );
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(cid, response).await);
        }

        let listing: LsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed {
                cid: cid.clone(),
                message: e.to_string(),
            })?;

        let object = listing
            .objects
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound { cid: cid.clone() })?;

        debug!(cid = %cid, children = object.links.len(), "listed directory");
        Ok(object
            .links
            .into_iter()
            .map(|link| RawChild {
                name: link.name,
                cid: link.hash,
                kind: kind_from_type_code(link.type_code),
            })
            .collect())
    }

    async fn entry_kind(&self, cid: &ContentId) -> Result<EntryKind> {
        let url = format!("{}?arg=/ipfs/{}", self.api_url("files/stat"), cid);
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(cid, response).await);
        }

        let stat: FilesStatResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed {
                cid: cid.clone(),
                message: e.to_string(),
            })?;

        match stat.type_name.as_str() {
            "directory" => Ok(EntryKind::Directory),
            _ => Ok(EntryKind::File),
        }
    }

    async fn put_directory(&self, entries: &[DirectoryEntry]) -> Result<ContentId> {
        // dag-json form of a UnixFS directory node: links only, entries
        // sorted by name so identical entry sets hash identically.
        let mut sorted: Vec<&DirectoryEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let links: Vec<serde_json::Value> = sorted
            .iter()
            .map(|e| {
                serde_json::json!({
                    "Name": e.name,
                    "Hash": { "/": e.cid },
                })
            })
            .collect();
        let node = serde_json::json!({
            "Data": { "/": { "bytes": "CAE" } },
            "Links": links,
        });
        let body = serde_json::to_vec(&node)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let url = format!(
            "{}?store-codec=dag-pb&input-codec=dag-json&pin=true",
            self.api_url("dag/put")
        );
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(body));
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(&String::new(), response).await);
        }

        let put: DagPutResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed {
                cid: String::new(),
                message: e.to_string(),
            })?;
        debug!(cid = %put.cid.cid, entries = entries.len(), "materialized directory");
        Ok(put.cid.cid)
    }

    async fn fetch_file(&self, root: &ContentId, path: &str) -> Result<Vec<u8>> {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|seg| utf8_percent_encode(seg, NON_ALPHANUMERIC).to_string())
            .collect();
        let url = format!(
            "{}?arg=/ipfs/{}/{}",
            self.api_url("cat"),
            root,
            encoded.join("/")
        );
        self.post_bytes(root, url).await
    }

    async fn export_archive(&self, root: &ContentId, included: &[ContentId]) -> Result<Vec<u8>> {
        let children = self.list_children(root).await?;

        // Reference records need kinds; confirm the ones the listing could
        // not report.
        let mut refs = Vec::with_capacity(children.len());
        for child in children {
            let kind = match child.kind {
                Some(kind) => kind,
                None => self.entry_kind(&child.cid).await?,
            };
            refs.push(ArchiveRef {
                name: child.name,
                cid: child.cid,
                kind: kind.label().to_string(),
            });
        }

        let mut blocks = Vec::with_capacity(included.len());
        for cid in included {
            let url = format!("{}?arg={}", self.api_url("block/get"), cid);
            let data = self.post_bytes(cid, url).await?;
            blocks.push((cid.clone(), data));
        }

        archive::encode(root, refs, blocks).map_err(|e| StoreError::Malformed {
            cid: root.clone(),
            message: e.to_string(),
        })
    }
}
