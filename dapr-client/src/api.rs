//! The request/response model of the sidecar state and secret APIs, and the
//! transport traits the clients are written against.
//!
//! Values travel as opaque bytes at this layer; encoding them is the job of
//! [`crate::state::StateClient`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::{
    error::Result,
    options::{ConsistencyMode, StateOptions},
};

/// Flat string metadata passed through to the sidecar verbatim.
pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetStateRequest {
    pub store: String,
    pub key: String,
    pub consistency: Option<ConsistencyMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetStateResponse {
    /// `None` when the store holds nothing under the key.
    pub data: Option<Vec<u8>>,
    pub etag: Option<String>,
}

/// One item of a save batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateItem {
    pub key: String,
    /// `None` clears the item.
    pub value: Option<Vec<u8>>,
    pub etag: Option<String>,
    pub metadata: Option<Metadata>,
    pub options: Option<StateOptions>,
}

/// Saves are batch-shaped on the wire, even when there is a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveStateRequest {
    pub store: String,
    pub requests: Vec<StateItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStateRequest {
    pub store: String,
    pub key: String,
    pub etag: Option<String>,
    pub options: Option<StateOptions>,
}

/// State operations offered by the sidecar.
///
/// Implementations report a non-success status as
/// [`crate::Error::RemoteFault`].
#[async_trait]
pub trait StateApi: Send + Sync {
    async fn get_state(&self, request: GetStateRequest) -> Result<GetStateResponse>;
    async fn save_state(&self, request: SaveStateRequest) -> Result<()>;
    async fn delete_state(&self, request: DeleteStateRequest) -> Result<()>;
}

/// Read access to the sidecar secret stores.
#[async_trait]
pub trait SecretApi: Send + Sync {
    /// Fetch one secret. The result keeps the order of the response: a
    /// single-valued secret usually comes back under the `_default` key,
    /// a multi-valued one under its own sub-keys.
    async fn get_secret(
        &self,
        store: &str,
        name: &str,
        metadata: &Metadata,
    ) -> Result<IndexMap<String, String>>;
}

#[async_trait]
impl<T: StateApi + ?Sized> StateApi for std::sync::Arc<T> {
    async fn get_state(&self, request: GetStateRequest) -> Result<GetStateResponse> {
        (**self).get_state(request).await
    }
    async fn save_state(&self, request: SaveStateRequest) -> Result<()> {
        (**self).save_state(request).await
    }
    async fn delete_state(&self, request: DeleteStateRequest) -> Result<()> {
        (**self).delete_state(request).await
    }
}

#[async_trait]
impl<T: SecretApi + ?Sized> SecretApi for std::sync::Arc<T> {
    async fn get_secret(
        &self,
        store: &str,
        name: &str,
        metadata: &Metadata,
    ) -> Result<IndexMap<String, String>> {
        (**self).get_secret(store, name, metadata).await
    }
}
