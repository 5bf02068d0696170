use std::sync::Arc;

use dapr_client::SecretApi;

use crate::{
    descriptor::SecretDescriptor,
    error::{Error, Result},
    manager::{DefaultSecretStoreManager, SecretStoreManager},
    provider::{SecretStoreConfigurationProvider, Secrets},
};

/// Collects the settings of a [`SecretStoreConfigurationProvider`].
///
/// Secrets are given either as descriptors, or as plain names whose metadata
/// and configuration keys come from a [`SecretStoreManager`]. The two styles
/// don't mix.
pub struct SecretStoreConfigurationSource<C> {
    store: Option<String>,
    descriptors: Vec<SecretDescriptor>,
    names: Vec<String>,
    manager: Option<Arc<dyn SecretStoreManager>>,
    client: Option<C>,
}

impl<C> Default for SecretStoreConfigurationSource<C> {
    fn default() -> Self {
        SecretStoreConfigurationSource {
            store: None,
            descriptors: Vec::new(),
            names: Vec::new(),
            manager: None,
            client: None,
        }
    }
}

impl<C: SecretApi> SecretStoreConfigurationSource<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    pub fn client(mut self, client: C) -> Self {
        self.client = Some(client);
        self
    }

    pub fn descriptor(mut self, descriptor: impl Into<SecretDescriptor>) -> Self {
        self.descriptors.push(descriptor.into());
        self
    }

    pub fn descriptors(mut self, descriptors: impl IntoIterator<Item = SecretDescriptor>) -> Self {
        self.descriptors.extend(descriptors);
        self
    }

    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Replaces [`DefaultSecretStoreManager`] for secrets given by name.
    pub fn manager(mut self, manager: Arc<dyn SecretStoreManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Validates the settings and returns a provider that has not loaded yet.
    pub fn build(self) -> Result<SecretStoreConfigurationProvider<C>> {
        let store = match self.store {
            Some(store) if !store.is_empty() => store,
            _ => return Err(Error::InvalidArgument("store must not be empty")),
        };
        let client = self
            .client
            .ok_or(Error::InvalidArgument("a secret store client is required"))?;

        let secrets = match (self.descriptors.is_empty(), self.names.is_empty()) {
            (false, false) => {
                return Err(Error::InvalidArgument(
                    "secrets can be given as descriptors or as names, not both",
                ))
            }
            (false, true) => {
                if self.manager.is_some() {
                    return Err(Error::InvalidArgument(
                        "a secret store manager only applies to secrets given by name",
                    ));
                }
                Secrets::Descriptors(self.descriptors)
            }
            (true, false) => Secrets::Names {
                names: self.names,
                manager: self
                    .manager
                    .unwrap_or_else(|| Arc::new(DefaultSecretStoreManager)),
            },
            (true, true) => Secrets::Descriptors(Vec::new()),
        };

        SecretStoreConfigurationProvider::new(store, secrets, client)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use dapr_client::Metadata;
    use indexmap::IndexMap;

    use super::*;

    struct Echo;

    #[async_trait]
    impl SecretApi for Echo {
        async fn get_secret(
            &self,
            _store: &str,
            name: &str,
            metadata: &Metadata,
        ) -> dapr_client::Result<IndexMap<String, String>> {
            let mut r = IndexMap::new();
            r.insert("_default".to_string(), name.to_string());
            for (k, v) in metadata {
                r.insert(format!("{}.{}", name, k), v.clone());
            }
            Ok(r)
        }
    }

    fn invalid(r: Result<SecretStoreConfigurationProvider<Echo>>) -> &'static str {
        match r {
            Err(Error::InvalidArgument(m)) => m,
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_missing_store() {
        let m = invalid(SecretStoreConfigurationSource::new().client(Echo).build());
        assert!(m.contains("store"));
        let m = invalid(
            SecretStoreConfigurationSource::new()
                .store("")
                .client(Echo)
                .build(),
        );
        assert!(m.contains("store"));
    }

    #[test]
    fn test_missing_client() {
        let m = invalid(
            SecretStoreConfigurationSource::<Echo>::new()
                .store("vault")
                .names(["a"])
                .build(),
        );
        assert!(m.contains("client"));
    }

    #[test]
    fn test_mixed_styles_rejected() {
        invalid(
            SecretStoreConfigurationSource::new()
                .store("vault")
                .client(Echo)
                .descriptor("a")
                .names(["b"])
                .build(),
        );
        invalid(
            SecretStoreConfigurationSource::new()
                .store("vault")
                .client(Echo)
                .descriptor("a")
                .manager(Arc::new(DefaultSecretStoreManager))
                .build(),
        );
    }

    #[tokio::test]
    async fn test_names_default_to_default_manager() {
        let mut p = SecretStoreConfigurationSource::new()
            .store("vault")
            .client(Echo)
            .names(["Db--Password", "Plain"])
            .build()
            .unwrap();
        assert!(!p.is_loaded());
        assert_eq!(p.store(), "vault");
        let s = p.load().await.unwrap();
        assert_eq!(s.get("Db:Password"), Some("Db--Password"));
        assert_eq!(s.get("plain"), Some("Plain"));
    }

    #[tokio::test]
    async fn test_descriptors_keep_metadata() {
        let metadata = Metadata::from([("version".to_string(), "2".to_string())]);
        let mut p = SecretStoreConfigurationSource::new()
            .store("vault")
            .client(Echo)
            .descriptors([SecretDescriptor::with_metadata("a--b", metadata)])
            .build()
            .unwrap();
        let s = p.load().await.unwrap();
        // descriptor keys are taken verbatim
        assert_eq!(s.get("a--b"), Some("a--b"));
        assert_eq!(s.get("a--b.version"), Some("2"));
    }
}
