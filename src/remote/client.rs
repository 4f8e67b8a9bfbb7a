use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::RemoteConfig;
use crate::crl::{CrlCursor, CrlDelta, UvciHash};
use crate::rules::RuleSetting;

use super::errors::{RemoteError, RemoteResult};
use super::{CrlChunk, CrlSource, CrlUpdate, ResourceSource};

const RESUME_TOKEN_HEADER: &str = "X-RESUME-TOKEN";
const KID_HEADER: &str = "X-KID";
/// Guards against a gateway that never stops paging.
const MAX_SIGNER_PAGES: usize = 10_000;

/// Answer of `GET /drl/check`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DrlCheck {
    pub version: u64,
    #[serde(default = "one")]
    pub total_chunk: u64,
}

fn one() -> u64 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DrlDelta {
    #[serde(default)]
    pub insertions: Vec<String>,
    #[serde(default)]
    pub deletions: Vec<String>,
}

/// Answer of `GET /drl`. Either a full snapshot or a delta.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DrlChunk {
    pub version: u64,
    pub chunk: u64,
    pub last_chunk: u64,
    #[serde(default)]
    pub revoked_ucvi: Option<Vec<String>>,
    #[serde(default)]
    pub delta: Option<DrlDelta>,
}

/// Decides whether the feed has anything to offer before downloading a chunk.
pub(crate) fn plan(cursor: CrlCursor, check: &DrlCheck) -> Option<CrlUpdate> {
    if cursor.chunk > check.total_chunk {
        return Some(CrlUpdate::Restart);
    }
    if cursor.is_in_progress() {
        // Partial progress only continues towards the version it started on
        return (cursor.target != Some(check.version)).then_some(CrlUpdate::Restart);
    }
    (check.version == cursor.version).then_some(CrlUpdate::NoUpdate)
}

/// Maps a downloaded chunk to the delta the engine applies.
pub(crate) fn to_update(cursor: CrlCursor, check: &DrlCheck, chunk: DrlChunk) -> CrlUpdate {
    let moved = cursor.target.is_some_and(|target| target != chunk.version);
    if moved || chunk.chunk != cursor.chunk || chunk.version != check.version {
        warn!(
            "Chunk {} of version {} does not match cursor {} and feed version {}",
            chunk.chunk, chunk.version, cursor, check.version
        );
        return CrlUpdate::Restart;
    }

    let (added, removed) = match (chunk.revoked_ucvi, chunk.delta) {
        // A snapshot replaces the whole set and only applies on top of an empty one
        (Some(_), _) if cursor.version != 0 => return CrlUpdate::Restart,
        (Some(revoked), _) => (revoked, Vec::new()),
        (None, Some(delta)) => (delta.insertions, delta.deletions),
        (None, None) => (Vec::new(), Vec::new()),
    };

    let next = if chunk.chunk >= chunk.last_chunk {
        CrlCursor::new(1, chunk.version)
    } else {
        CrlCursor::downloading(chunk.chunk + 1, cursor.version, chunk.version)
    };

    CrlUpdate::Chunk(CrlChunk {
        version: chunk.version,
        chunk: chunk.chunk,
        last_chunk: chunk.last_chunk,
        delta: CrlDelta::new(
            added.into_iter().map(UvciHash::from_encoded).collect(),
            removed.into_iter().map(UvciHash::from_encoded).collect(),
            next,
        ),
    })
}

/// HTTP client for the DGC gateway.
#[derive(Debug, Clone)]
pub struct DgcClient {
    http_client: Client,
    base_url: String,
}

impl DgcClient {
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("dgc-verifier/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                url: response.url().to_string(),
                status,
            });
        }
        Ok(response)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, u64)],
    ) -> RemoteResult<T> {
        let request = self.http_client.get(self.url(path)).query(query);
        let body = self.send(request).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl CrlSource for DgcClient {
    #[instrument(skip_all, fields(cursor = %cursor))]
    async fn fetch_next_chunk(&self, cursor: CrlCursor) -> RemoteResult<CrlUpdate> {
        let check: DrlCheck = self
            .get_json("drl/check", &[("version", cursor.version)])
            .await?;
        if let Some(update) = plan(cursor, &check) {
            debug!("Revocation feed at version {}: {:?}", check.version, update);
            return Ok(update);
        }

        let chunk: DrlChunk = self
            .get_json(
                "drl",
                &[("version", cursor.version), ("chunk", cursor.chunk)],
            )
            .await?;
        Ok(to_update(cursor, &check, chunk))
    }
}

#[async_trait]
impl ResourceSource for DgcClient {
    async fn fetch_rule_table(&self) -> RemoteResult<Vec<RuleSetting>> {
        self.get_json("settings", &[]).await
    }

    async fn fetch_signature_list_index(&self) -> RemoteResult<Vec<String>> {
        self.get_json("signercertificate/status", &[]).await
    }

    /// Pages through the signer certificates until the gateway has none left.
    async fn fetch_trust_list(&self) -> RemoteResult<BTreeMap<String, String>> {
        let mut certificates = BTreeMap::new();
        let mut resume_token: Option<String> = None;

        for _ in 0..MAX_SIGNER_PAGES {
            let mut request = self.http_client.get(self.url("signercertificate/update"));
            if let Some(token) = &resume_token {
                request = request.header(RESUME_TOKEN_HEADER, token);
            }

            let response = self.send(request).await?;
            if response.status() == StatusCode::NO_CONTENT {
                break;
            }

            let headers = response.headers();
            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
            };
            let (Some(kid), Some(token)) = (header(KID_HEADER), header(RESUME_TOKEN_HEADER)) else {
                break;
            };

            let certificate = response.text().await?;
            certificates.insert(kid, certificate.trim().to_string());
            resume_token = Some(token);
        }

        info!("Downloaded {} signer certificates", certificates.len());
        Ok(certificates)
    }
}
