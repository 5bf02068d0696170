use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use clap::Subcommand;
use dapr_client::{
    ConcurrencyMode, ConsistencyMode, Metadata, RetryMode, RetryOptions, StateClient,
    StateOptions,
};

use crate::{parse_key_value, Options};

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Print a value and its etag as JSON
    Get {
        #[command(flatten)]
        target: Target,

        /// Read guarantee: eventual or strong
        #[arg(long)]
        consistency: Option<ConsistencyMode>,
    },

    /// Store a JSON value
    Save {
        #[command(flatten)]
        target: Target,

        /// The value, as a JSON document
        #[arg(long)]
        value_json: String,

        /// Only write if the stored value still has this etag
        #[arg(long)]
        etag: Option<String>,

        #[command(flatten)]
        options: WriteOptions,

        /// Metadata for the state store component, as key=value
        #[arg(long, value_parser = parse_key_value)]
        metadata: Vec<(String, String)>,
    },

    /// Delete a value
    Delete {
        #[command(flatten)]
        target: Target,

        /// Only delete if the stored value still has this etag
        #[arg(long)]
        etag: Option<String>,

        #[command(flatten)]
        options: WriteOptions,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct Target {
    /// Name of the state store component
    #[arg(long)]
    store: String,

    #[arg(long)]
    key: String,
}

#[derive(clap::Args, Debug)]
pub(crate) struct WriteOptions {
    /// Read guarantee: eventual or strong
    #[arg(long)]
    consistency: Option<ConsistencyMode>,

    /// Conflict policy: first-write or last-write
    #[arg(long)]
    concurrency: Option<ConcurrencyMode>,

    /// Have the sidecar retry with this pattern: linear or exponential
    #[arg(long, requires = "retry_threshold")]
    retry_pattern: Option<RetryMode>,

    /// Milliseconds between sidecar retries
    #[arg(long, default_value_t = 1000, requires = "retry_pattern")]
    retry_interval: u64,

    /// Number of sidecar retries
    #[arg(long, requires = "retry_pattern")]
    retry_threshold: Option<u32>,
}

impl WriteOptions {
    /// `None` unless a flag was given, so that the sidecar applies the
    /// component's own defaults.
    fn to_state_options(&self) -> Option<StateOptions> {
        let retry = match (self.retry_pattern, self.retry_threshold) {
            (Some(mode), Some(threshold)) => Some(RetryOptions {
                mode,
                interval: Duration::from_millis(self.retry_interval),
                threshold,
            }),
            _ => None,
        };
        if self.consistency.is_none() && self.concurrency.is_none() && retry.is_none() {
            return None;
        }
        Some(StateOptions {
            consistency: self.consistency.unwrap_or_default(),
            concurrency: self.concurrency.unwrap_or_default(),
            retry,
        })
    }
}

pub(crate) async fn run(options: &Options, command: &Commands) -> Result<()> {
    let client = StateClient::new(options.sidecar()?);
    match command {
        Commands::Get {
            target,
            consistency,
        } => {
            let (value, etag) = client
                .get_state_and_etag::<serde_json::Value>(&target.store, &target.key, *consistency)
                .await
                .with_context(|| format!("reading '{}'", target.key))?;
            let output = serde_json::json!({
                "key": target.key,
                "value": value,
                "etag": etag,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Commands::Save {
            target,
            value_json,
            etag,
            options,
            metadata,
        } => {
            let value: serde_json::Value =
                serde_json::from_str(value_json).context("parsing --value-json")?;
            let metadata = (!metadata.is_empty())
                .then(|| metadata.iter().cloned().collect::<Metadata>());
            match etag {
                None => client
                    .save_state(
                        &target.store,
                        &target.key,
                        Some(&value),
                        options.to_state_options(),
                        metadata,
                    )
                    .await
                    .with_context(|| format!("saving '{}'", target.key)),
                Some(etag) => {
                    let saved = client
                        .try_save_state(
                            &target.store,
                            &target.key,
                            Some(&value),
                            Some(etag.as_str()),
                            options.to_state_options(),
                            metadata,
                        )
                        .await
                        .with_context(|| format!("saving '{}'", target.key))?;
                    if !saved {
                        bail!("'{}' was not saved: etag {} is stale", target.key, etag);
                    }
                    Ok(())
                }
            }
        }
        Commands::Delete {
            target,
            etag,
            options,
        } => {
            let deleted = client
                .try_delete_state(
                    &target.store,
                    &target.key,
                    etag.as_deref(),
                    options.to_state_options(),
                )
                .await
                .with_context(|| format!("deleting '{}'", target.key))?;
            if !deleted {
                bail!(
                    "'{}' was not deleted: etag {} is stale",
                    target.key,
                    etag.as_deref().unwrap_or_default()
                );
            }
            Ok(())
        }
    }
}
