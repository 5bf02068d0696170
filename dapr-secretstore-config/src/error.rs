/// Errors of the secret store configuration provider.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required setting was missing, empty or contradictory.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Two secrets, or two keys of one secret, resolved to the same
    /// configuration key. Nothing is published when this happens.
    #[error("a duplicate key '{0}' was found")]
    DuplicateKey(String),

    /// The provider already finished loading, successfully or not.
    #[error("the secret store configuration was already loaded")]
    AlreadyLoaded,

    /// Fetching a secret failed; the client error is passed on as is.
    #[error(transparent)]
    Client(#[from] dapr_client::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
