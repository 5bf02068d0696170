use dapr_client::Metadata;

use crate::snapshot::KEY_DELIMITER;

/// Controls how secrets loaded by name are fetched and named.
pub trait SecretStoreManager: Send + Sync {
    /// The configuration key to store a secret under.
    fn get_key(&self, secret: &str) -> String;

    /// Metadata to send along when fetching `secret`.
    fn metadata(&self, secret: &str) -> Metadata;
}

/// Fetches every secret without metadata, and turns `--` in secret names
/// into the configuration path delimiter, so that `Database--Password`
/// lands in the `Database` section.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSecretStoreManager;

impl SecretStoreManager for DefaultSecretStoreManager {
    fn get_key(&self, secret: &str) -> String {
        secret.replace("--", KEY_DELIMITER)
    }

    fn metadata(&self, _secret: &str) -> Metadata {
        Metadata::new()
    }
}
