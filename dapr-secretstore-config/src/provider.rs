//! Loading secrets into a [`ConfigurationSnapshot`].
//!
//! Each configured secret is fetched in turn and every key/value pair of the
//! response becomes one configuration entry. Secrets with a single value come
//! back under the `_default` key; that entry is stored under the secret's own
//! name instead. Secrets with several values (say, a JSON document with
//! sub-fields) contribute one entry per sub-key.
//!
//! A key that resolves twice fails the whole load: a silently overwritten
//! configuration value is harder to track down than a startup failure.

use std::sync::Arc;

use dapr_client::SecretApi;
use tracing::{debug_span, Instrument as _};

use crate::{
    descriptor::SecretDescriptor,
    error::{Error, Result},
    manager::SecretStoreManager,
    snapshot::{ConfigurationSnapshot, SnapshotBuilder},
};

/// The key under which a secret store returns a single-valued secret.
pub const DEFAULT_SECRET_KEY: &str = "_default";

/// Which secrets to load.
#[derive(Clone)]
pub enum Secrets {
    /// Fetch exactly these, and use the returned keys as they are.
    Descriptors(Vec<SecretDescriptor>),
    /// Fetch these names, with metadata and key naming supplied by `manager`.
    Names {
        names: Vec<String>,
        manager: Arc<dyn SecretStoreManager>,
    },
}

impl Secrets {
    fn descriptors(&self) -> Vec<SecretDescriptor> {
        match self {
            Secrets::Descriptors(descriptors) => descriptors.clone(),
            Secrets::Names { names, manager } => names
                .iter()
                .map(|name| SecretDescriptor::with_metadata(name.clone(), manager.metadata(name)))
                .collect(),
        }
    }

    fn map_key(&self, key: String) -> String {
        match self {
            Secrets::Descriptors(_) => key,
            Secrets::Names { manager, .. } => manager.get_key(&key),
        }
    }

    fn len(&self) -> usize {
        match self {
            Secrets::Descriptors(descriptors) => descriptors.len(),
            Secrets::Names { names, .. } => names.len(),
        }
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Secrets::Descriptors(d) => f.debug_tuple("Descriptors").field(d).finish(),
            Secrets::Names { names, .. } => f.debug_struct("Names").field("names", names).finish(),
        }
    }
}

#[derive(Debug, Clone)]
enum LoadState {
    Unloaded,
    Loading,
    Loaded(Arc<ConfigurationSnapshot>),
    Failed,
}

/// A configuration provider backed by a secret store.
///
/// It loads once. After a successful or failed [`load`](Self::load) the
/// provider is done; load again with a new provider.
pub struct SecretStoreConfigurationProvider<C> {
    store: String,
    secrets: Secrets,
    client: C,
    state: LoadState,
}

impl<C: SecretApi> SecretStoreConfigurationProvider<C> {
    pub fn new(store: impl Into<String>, secrets: Secrets, client: C) -> Result<Self> {
        let store = store.into();
        if store.is_empty() {
            return Err(Error::InvalidArgument("store must not be empty"));
        }
        Ok(SecretStoreConfigurationProvider {
            store,
            secrets,
            client,
            state: LoadState::Unloaded,
        })
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    /// The published snapshot, once loading has succeeded.
    pub fn snapshot(&self) -> Option<Arc<ConfigurationSnapshot>> {
        match &self.state {
            LoadState::Loaded(snapshot) => Some(snapshot.clone()),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match &self.state {
            LoadState::Loaded(snapshot) => snapshot.get(key),
            _ => None,
        }
    }

    /// Fetch all secrets and publish the resulting snapshot.
    pub async fn load(&mut self) -> Result<Arc<ConfigurationSnapshot>> {
        if !matches!(self.state, LoadState::Unloaded) {
            return Err(Error::AlreadyLoaded);
        }
        self.state = LoadState::Loading;

        let span = debug_span!(
            "loading secret store configuration",
            store = self.store.as_str(),
            secrets = self.secrets.len()
        );
        match self.fetch_all().instrument(span).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                tracing::info!(
                    store = self.store.as_str(),
                    keys = snapshot.len(),
                    "loaded secret store configuration"
                );
                self.state = LoadState::Loaded(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                self.state = LoadState::Failed;
                Err(e)
            }
        }
    }

    async fn fetch_all(&self) -> Result<ConfigurationSnapshot> {
        let mut data = SnapshotBuilder::default();
        for descriptor in self.secrets.descriptors() {
            let result = self
                .client
                .get_secret(&self.store, &descriptor.name, &descriptor.metadata)
                .await
                .inspect_err(|e| {
                    tracing::warn!(
                        secret = descriptor.name.as_str(),
                        "fetching secret failed: {}",
                        e
                    )
                })?;
            tracing::debug!(
                secret = descriptor.name.as_str(),
                keys = result.len(),
                "fetched secret"
            );

            for (returned_key, value) in result {
                let key = if returned_key == DEFAULT_SECRET_KEY {
                    descriptor.name.clone()
                } else {
                    returned_key
                };
                data.insert(self.secrets.map_key(key), value)?;
            }
        }
        Ok(data.freeze())
    }
}
