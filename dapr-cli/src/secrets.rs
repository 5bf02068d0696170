use anyhow::{Context as _, Result};
use clap::Subcommand;
use dapr_client::Metadata;
use dapr_secretstore_config::{SecretDescriptor, SecretStoreConfigurationSource};

use crate::Options;

const MASK: &str = "***";

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Load secrets into a configuration and print it as JSON
    Load(LoadArgs),
}

#[derive(clap::Args, Debug)]
pub(crate) struct LoadArgs {
    /// Name of the secret store component
    #[arg(long)]
    store: String,

    /// A secret to load, optionally with metadata: NAME or NAME=k:v,k2:v2
    #[arg(long = "secret", value_parser = parse_secret)]
    secrets: Vec<SecretDescriptor>,

    /// Secrets to load by name; `--` in a name becomes a section delimiter
    #[arg(long, num_args = 1.., conflicts_with = "secrets")]
    names: Vec<String>,

    /// Print secret values instead of masking them
    #[arg(long)]
    show_values: bool,
}

pub(crate) async fn run(options: &Options, command: &Commands) -> Result<()> {
    match command {
        Commands::Load(args) => load(options, args).await,
    }
}

async fn load(options: &Options, args: &LoadArgs) -> Result<()> {
    let mut provider = SecretStoreConfigurationSource::new()
        .store(args.store.clone())
        .client(options.sidecar()?)
        .descriptors(args.secrets.iter().cloned())
        .names(args.names.iter().cloned())
        .build()?;
    let snapshot = provider
        .load()
        .await
        .with_context(|| format!("loading secrets from store '{}'", args.store))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&to_json(snapshot.iter(), args.show_values))?
    );
    Ok(())
}

fn to_json<'a>(
    entries: impl Iterator<Item = (&'a str, &'a str)>,
    show_values: bool,
) -> serde_json::Value {
    entries
        .map(|(k, v)| {
            let v = if show_values { v } else { MASK };
            (k.to_string(), serde_json::Value::from(v))
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn parse_secret(s: &str) -> Result<SecretDescriptor, String> {
    let (name, metadata) = match s.split_once('=') {
        None => return non_empty(s).map(SecretDescriptor::new),
        Some((name, metadata)) => (non_empty(name)?, metadata),
    };
    let metadata = metadata
        .split(',')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once(':') {
            Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
            _ => Err(format!("expected metadata as key:value, got '{}'", pair)),
        })
        .collect::<Result<Metadata, String>>()?;
    Ok(SecretDescriptor::with_metadata(name, metadata))
}

fn non_empty(name: &str) -> Result<&str, String> {
    if name.is_empty() {
        Err("secret name must not be empty".to_string())
    } else {
        Ok(name)
    }
}
