//! Typed state store operations on top of a [`StateApi`] transport.
//!
//! Values are stored as JSON. Each operation is one independent request; the
//! only thing carried between requests is the etag, which callers keep
//! themselves or through a [`StateEntry`].

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug_span, Instrument as _};

use crate::{
    api::{
        DeleteStateRequest, GetStateRequest, Metadata, SaveStateRequest, StateApi, StateItem,
    },
    entry::StateEntry,
    error::{require, Result},
    options::{ConsistencyMode, StateOptions},
};

/// Everything a single-item save needs.
pub(crate) struct WriteRequest<'a, T: ?Sized> {
    pub(crate) store: &'a str,
    pub(crate) key: &'a str,
    pub(crate) value: Option<&'a T>,
    pub(crate) etag: Option<&'a str>,
    pub(crate) options: Option<StateOptions>,
    pub(crate) metadata: Option<Metadata>,
}

/// Typed access to the state stores behind a [`StateApi`].
///
/// Store and key must be non-empty; violations fail with
/// [`crate::Error::InvalidArgument`] before anything is sent.
pub struct StateClient<A> {
    api: A,
}

impl<A: StateApi> StateClient<A> {
    pub fn new(api: A) -> Self {
        StateClient { api }
    }

    /// The underlying transport.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Read the value stored under `key`, or `None` if there is none.
    pub async fn get_state<T: DeserializeOwned>(
        &self,
        store: &str,
        key: &str,
        consistency: Option<ConsistencyMode>,
    ) -> Result<Option<T>> {
        let (value, _etag) = self.get_state_and_etag(store, key, consistency).await?;
        Ok(value)
    }

    /// Read the value stored under `key` along with its current etag.
    pub async fn get_state_and_etag<T: DeserializeOwned>(
        &self,
        store: &str,
        key: &str,
        consistency: Option<ConsistencyMode>,
    ) -> Result<(Option<T>, Option<String>)> {
        require("store", store)?;
        require("key", key)?;

        let response = self
            .api
            .get_state(GetStateRequest {
                store: store.to_string(),
                key: key.to_string(),
                consistency,
            })
            .instrument(debug_span!("get state", store, key))
            .await?;

        let value = match response.data {
            // a cleared item may come back as `null`
            Some(bytes) if !bytes.is_empty() => serde_json::from_slice::<Option<T>>(&bytes)?,
            _ => None,
        };
        tracing::debug!(
            store,
            key,
            found = value.is_some(),
            etag = response.etag.as_deref(),
            "read state"
        );
        Ok((value, response.etag))
    }

    /// Read `key` into a [`StateEntry`] that remembers where it came from.
    pub async fn get_state_entry<T: DeserializeOwned>(
        &self,
        store: &str,
        key: &str,
        consistency: Option<ConsistencyMode>,
    ) -> Result<StateEntry<T>> {
        let (value, etag) = self.get_state_and_etag(store, key, consistency).await?;
        Ok(StateEntry::new(
            store.to_string(),
            key.to_string(),
            value,
            etag,
        ))
    }

    /// Overwrite `key` unconditionally. `None` clears it.
    pub async fn save_state<T: Serialize + ?Sized>(
        &self,
        store: &str,
        key: &str,
        value: Option<&T>,
        options: Option<StateOptions>,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        self.write(WriteRequest {
            store,
            key,
            value,
            etag: None,
            options,
            metadata,
        })
        .await
    }

    /// Overwrite `key` only if its etag still matches.
    ///
    /// Returns `false` when the sidecar rejects the etag. Any other failure is
    /// an error.
    pub async fn try_save_state<T: Serialize + ?Sized>(
        &self,
        store: &str,
        key: &str,
        value: Option<&T>,
        etag: Option<&str>,
        options: Option<StateOptions>,
        metadata: Option<Metadata>,
    ) -> Result<bool> {
        Self::soften(
            self.write(WriteRequest {
                store,
                key,
                value,
                etag,
                options,
                metadata,
            })
            .await,
        )
    }

    /// Save several pre-encoded items in one request.
    pub async fn save_bulk_state(&self, store: &str, items: Vec<StateItem>) -> Result<()> {
        require("store", store)?;
        for item in &items {
            require("key", &item.key)?;
        }
        let count = items.len();
        self.api
            .save_state(SaveStateRequest {
                store: store.to_string(),
                requests: items,
            })
            .instrument(debug_span!("save bulk state", store, count))
            .await
    }

    /// Delete `key` unconditionally.
    pub async fn delete_state(
        &self,
        store: &str,
        key: &str,
        options: Option<StateOptions>,
    ) -> Result<()> {
        self.remove(store, key, None, options).await
    }

    /// Delete `key` only if its etag still matches; `false` on a mismatch.
    pub async fn try_delete_state(
        &self,
        store: &str,
        key: &str,
        etag: Option<&str>,
        options: Option<StateOptions>,
    ) -> Result<bool> {
        Self::soften(self.remove(store, key, etag, options).await)
    }

    pub(crate) async fn write<T: Serialize + ?Sized>(
        &self,
        request: WriteRequest<'_, T>,
    ) -> Result<()> {
        require("store", request.store)?;
        require("key", request.key)?;

        let value = request.value.map(serde_json::to_vec).transpose()?;
        let item = StateItem {
            key: request.key.to_string(),
            value,
            etag: request.etag.map(str::to_string),
            metadata: request.metadata,
            options: request.options,
        };
        self.api
            .save_state(SaveStateRequest {
                store: request.store.to_string(),
                requests: vec![item],
            })
            .instrument(debug_span!(
                "save state",
                store = request.store,
                key = request.key,
                etag = request.etag
            ))
            .await
    }

    pub(crate) async fn remove(
        &self,
        store: &str,
        key: &str,
        etag: Option<&str>,
        options: Option<StateOptions>,
    ) -> Result<()> {
        require("store", store)?;
        require("key", key)?;

        self.api
            .delete_state(DeleteStateRequest {
                store: store.to_string(),
                key: key.to_string(),
                etag: etag.map(str::to_string),
                options,
            })
            .instrument(debug_span!("delete state", store, key, etag))
            .await
    }

    /// Turn an etag conflict into `Ok(false)`.
    pub(crate) fn soften(result: Result<()>) -> Result<bool> {
        match result {
            Ok(()) => Ok(true),
            Err(e) if e.is_precondition_failed() => {
                tracing::debug!("etag mismatch: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
