//! Application configuration from a Dapr secret store.
//!
//! Secrets are fetched once, at startup, through any [`dapr_client::SecretApi`]
//! and flattened into a [`ConfigurationSnapshot`]: an immutable map with
//! case-insensitive, `:`-delimited keys.
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use dapr_client::{HttpSidecar, SidecarConfig};
//! use dapr_secretstore_config::SecretStoreConfigurationSource;
//!
//! let mut provider = SecretStoreConfigurationSource::new()
//!     .store("vault")
//!     .client(HttpSidecar::new(&SidecarConfig::default())?)
//!     .names(["Database--Password"])
//!     .build()?;
//! let config = provider.load().await?;
//! let _password = config.section("Database").get("Password");
//! # Ok(())
//! # }
//! ```

pub mod descriptor;
pub mod error;
pub mod manager;
pub mod provider;
pub mod snapshot;
pub mod source;

pub use descriptor::SecretDescriptor;
pub use error::{Error, Result};
pub use manager::{DefaultSecretStoreManager, SecretStoreManager};
pub use provider::{SecretStoreConfigurationProvider, Secrets, DEFAULT_SECRET_KEY};
pub use snapshot::{ConfigurationSnapshot, KEY_DELIMITER};
pub use source::SecretStoreConfigurationSource;
