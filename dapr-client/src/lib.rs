//! Client for the state store and secret store building blocks of a Dapr
//! sidecar.
//!
//! [`StateClient`] encodes optimistic concurrency (etags), consistency and
//! concurrency modes and the retry policy into requests for a [`StateApi`]
//! transport. [`SecretApi`] is the read-only secret counterpart. Both are
//! implemented over HTTP by [`HttpSidecar`].

pub mod api;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod options;
pub mod state;

#[cfg(test)]
mod testing;

pub use api::{Metadata, SecretApi, StateApi, StateItem};
pub use config::SidecarConfig;
pub use entry::{delete_entry, save_entry, try_delete_entry, try_save_entry, StateEntry};
pub use error::{Error, Result};
pub use http::HttpSidecar;
pub use options::{ConcurrencyMode, ConsistencyMode, RetryMode, RetryOptions, StateOptions};
pub use state::StateClient;
