/// Status codes the sidecar uses to report an etag mismatch.
const PRECONDITION_STATUSES: [u16; 2] = [409, 412];

/// Errors returned by the state and secret clients.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required identifier was missing or empty. Raised before any I/O.
    #[error("invalid argument: {0} must not be empty")]
    InvalidArgument(&'static str),

    /// The sidecar answered with a non-success status.
    #[error("remote call failed with status {status}: {message}")]
    RemoteFault { status: u16, message: String },

    /// A value could not be encoded to, or decoded from, its JSON payload.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The sidecar endpoint could not be turned into a URL.
    #[error("invalid sidecar endpoint: {0}")]
    InvalidEndpoint(String),

    /// A wire token did not name any known option.
    #[error("unknown {kind} token: {token}")]
    UnknownToken { kind: &'static str, token: String },
}

impl Error {
    /// Whether this is the remote side rejecting a write because the etag
    /// supplied with it no longer matches the stored item.
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Error::RemoteFault { status, .. } if PRECONDITION_STATUSES.contains(status))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reject empty identifiers up front, so that no request is issued for them.
pub(crate) fn require(name: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::InvalidArgument(name))
    } else {
        Ok(())
    }
}
