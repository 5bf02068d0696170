mod logging;
mod secrets;
mod state;

use std::{io::IsTerminal as _, process::exit, time::Duration};

use anyhow::Result;
use clap::{CommandFactory as _, Parser, Subcommand};
use dapr_client::{
    config::{DEFAULT_HOST, DEFAULT_HTTP_PORT},
    HttpSidecar, SidecarConfig,
};

fn main() {
    let args = Args::parse();
    handle_result(run_args(args));
}

fn run_args(args: Args) -> Result<()> {
    match &args.command {
        Commands::Secrets(sub) => {
            set_up_logging(&args.options)?;
            block_on(secrets::run(&args.options, sub))
        }
        Commands::State(sub) => {
            set_up_logging(&args.options)?;
            block_on(state::run(&args.options, sub))
        }
        Commands::GenerateMan => (|| {
            let cmd = Args::command();
            let man = clap_mangen::Man::new(cmd);
            let mut buffer: Vec<u8> = Default::default();
            man.render(&mut buffer)?;
            println!("{}", String::from_utf8(buffer)?);
            Ok(())
        })(),
        Commands::GenerateMarkdown => {
            let opts = clap_markdown::MarkdownOptions::new().show_footer(false);
            let markdown: String = clap_markdown::help_markdown_custom::<Args>(&opts);
            println!("{}", markdown);
            Ok(())
        }
        Commands::GenerateCompletion { shell } => {
            let mut cmd = Args::command();
            clap_complete::generate(*shell, &mut cmd, "dapr-cli", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn set_up_logging(options: &Options) -> Result<()> {
    logging::set_up(&logging::Options {
        verbose: options.verbose,
        color: std::io::stderr().is_terminal(),
    })
}

fn block_on(f: impl std::future::Future<Output = Result<()>>) -> Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(f)
}

fn handle_result(r: Result<()>) {
    match r {
        Ok(()) => {}
        Err(e) => {
            eprintln!("dapr-cli error: {:#}", e);
            exit(1);
        }
    }
}

/// Talk to the state and secret stores of a Dapr sidecar
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: Options,
}

#[derive(Parser, Debug, Clone)]
struct Options {
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    /// Host of the sidecar's HTTP API
    #[arg(long, global = true, env = "DAPR_HOST", default_value = DEFAULT_HOST)]
    dapr_host: String,

    /// Port of the sidecar's HTTP API
    #[arg(long, global = true, env = "DAPR_HTTP_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    dapr_http_port: u16,

    /// Give up on a request after this many seconds
    #[arg(long, global = true, env = "DAPR_API_TIMEOUT_SECONDS")]
    timeout: Option<u64>,
}

impl Options {
    fn sidecar_config(&self) -> SidecarConfig {
        SidecarConfig {
            host: self.dapr_host.clone(),
            http_port: self.dapr_http_port,
            timeout: self.timeout.map(Duration::from_secs),
        }
    }

    pub(crate) fn sidecar(&self) -> Result<HttpSidecar> {
        Ok(HttpSidecar::new(&self.sidecar_config())?)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read secrets the way an application loads its configuration
    #[command(subcommand)]
    Secrets(secrets::Commands),

    /// Read, write and delete state
    #[command(subcommand)]
    State(state::Commands),

    /// Generate markdown documentation for dapr-cli
    #[command(hide = true)]
    GenerateMarkdown,

    /// Generate a manpage for dapr-cli
    #[command(hide = true)]
    GenerateMan,

    /// Generate shell completion for dapr-cli
    #[command(hide = true)]
    GenerateCompletion {
        /// The shell to generate completion for
        #[arg(long)]
        shell: clap_complete::Shell,
    },
}

/// Parse a `key=value` pair.
pub(crate) fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}
