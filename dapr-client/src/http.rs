//! [`StateApi`] and [`SecretApi`] over the sidecar's HTTP/JSON interface.
//!
//! ```text
//! GET    /v1.0/state/{store}/{key}?consistency=..      -> value, ETag header
//! POST   /v1.0/state/{store}                           <- [item, ...]
//! DELETE /v1.0/state/{store}/{key}?concurrency=..      If-Match: etag
//! GET    /v1.0/secrets/{store}/{name}?metadata.k=v     -> {"k": "v", ...}
//! ```

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::{header, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;

use crate::{
    api::{
        DeleteStateRequest, GetStateRequest, GetStateResponse, Metadata, SaveStateRequest,
        SecretApi, StateApi, StateItem,
    },
    config::SidecarConfig,
    error::{Error, Result},
    options::StateOptions,
};

const API_VERSION: &str = "v1.0";

pub struct HttpSidecar {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpSidecar {
    pub fn new(config: &SidecarConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(HttpSidecar {
            base_url,
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// `{base}/v1.0/{segments...}?{query...}`, with every segment escaped.
fn endpoint(base: &Url, segments: &[&str], query: &[(String, String)]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .push(API_VERSION)
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

fn option_query(options: Option<&StateOptions>) -> Vec<(String, String)> {
    let Some(options) = options else {
        return Vec::new();
    };
    let mut query = vec![
        ("concurrency".to_string(), options.concurrency.to_string()),
        ("consistency".to_string(), options.consistency.to_string()),
    ];
    if let Some(retry) = &options.retry {
        query.push((
            "retryInterval".to_string(),
            retry.interval.as_millis().to_string(),
        ));
        query.push(("retryPattern".to_string(), retry.mode.to_string()));
        query.push(("retryThreshold".to_string(), retry.threshold.to_string()));
    }
    query
}

fn metadata_query(metadata: &Metadata) -> Vec<(String, String)> {
    metadata
        .iter()
        .map(|(k, v)| (format!("metadata.{}", k), v.clone()))
        .collect()
}

/// JSON shape of one save item.
#[derive(Serialize)]
struct WireItem<'a> {
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    etag: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a StateOptions>,
}

impl<'a> WireItem<'a> {
    fn from_item(item: &'a StateItem) -> Result<Self> {
        Ok(WireItem {
            key: &item.key,
            value: item
                .value
                .as_deref()
                .map(serde_json::from_slice)
                .transpose()?,
            etag: item.etag.as_deref(),
            metadata: item.metadata.as_ref(),
            options: item.options.as_ref(),
        })
    }
}

/// Pass successful responses through, turn the rest into `RemoteFault`.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), body = %message, "sidecar returned an error");
    Err(Error::RemoteFault {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl StateApi for HttpSidecar {
    async fn get_state(&self, request: GetStateRequest) -> Result<GetStateResponse> {
        let query = match request.consistency {
            Some(c) => vec![("consistency".to_string(), c.to_string())],
            None => Vec::new(),
        };
        let url = endpoint(
            &self.base_url,
            &["state", &request.store, &request.key],
            &query,
        )?;
        let response = check(self.client.get(url).send().await?).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(GetStateResponse::default());
        }
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;
        Ok(GetStateResponse {
            data: if body.is_empty() {
                None
            } else {
                Some(body.to_vec())
            },
            etag,
        })
    }

    async fn save_state(&self, request: SaveStateRequest) -> Result<()> {
        let url = endpoint(&self.base_url, &["state", &request.store], &[])?;
        let body = request
            .requests
            .iter()
            .map(WireItem::from_item)
            .collect::<Result<Vec<_>>>()?;
        check(self.client.post(url).json(&body).send().await?).await?;
        Ok(())
    }

    async fn delete_state(&self, request: DeleteStateRequest) -> Result<()> {
        let url = endpoint(
            &self.base_url,
            &["state", &request.store, &request.key],
            &option_query(request.options.as_ref()),
        )?;
        let mut builder = self.client.delete(url);
        if let Some(etag) = &request.etag {
            builder = builder.header(header::IF_MATCH, etag.as_str());
        }
        check(builder.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl SecretApi for HttpSidecar {
    async fn get_secret(
        &self,
        store: &str,
        name: &str,
        metadata: &Metadata,
    ) -> Result<IndexMap<String, String>> {
        let url = endpoint(
            &self.base_url,
            &["secrets", store, name],
            &metadata_query(metadata),
        )?;
        let response = check(self.client.get(url).send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
