use dapr_client::Metadata;

/// A secret to fetch, with store-specific hints for fetching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretDescriptor {
    pub name: String,
    pub metadata: Metadata,
}

impl SecretDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_metadata(name, Metadata::new())
    }

    pub fn with_metadata(name: impl Into<String>, metadata: Metadata) -> Self {
        SecretDescriptor {
            name: name.into(),
            metadata,
        }
    }
}

impl From<&str> for SecretDescriptor {
    fn from(name: &str) -> Self {
        SecretDescriptor::new(name)
    }
}
