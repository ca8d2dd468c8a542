//! `toggle-filter` CLI — prune feature-toggled sections out of JSON documents.
//!
//! ## Usage
//!
//! ```sh
//! # Everything gated by a marker is removed unless enabled (stdin → stdout)
//! cat openapi.json | toggle-filter filter
//!
//! # Enable some features, from file to file
//! toggle-filter filter --enable user-signup,billing -i openapi.json -o public.json
//!
//! # Take feature states from a bootstrap file, overriding one of them
//! toggle-filter filter --bootstrap flags.json --disable billing -i openapi.json
//!
//! # Resolve features against an Unleash-compatible server
//! UNLEASH_API_KEY=... toggle-filter remote --url https://flags.example.com/api \
//!     --app-name docs-publisher -i openapi.json --pretty
//!
//! # List the features a document references
//! toggle-filter toggles -i openapi.json
//! ```

use std::io::{self, Read};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use toggle_filter::{collect_toggles, filter_document, ToggleSet};
use toggle_provider::{
    load_bootstrap, FeatureDescriptor, ProviderConfig, ToggleEvent, ToggleProvider,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "toggle-filter",
    version,
    about = "Prune feature-toggled sections out of JSON documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter with feature states given on the command line or in a bootstrap file
    Filter {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Comma-separated features to enable
        #[arg(long)]
        enable: Option<String>,
        /// Comma-separated features to disable (wins over --enable and --bootstrap)
        #[arg(long)]
        disable: Option<String>,
        /// JSON file with feature states (`[{"name", "enabled"}]` or `{"features": [...]}`)
        #[arg(long)]
        bootstrap: Option<String>,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Resolve feature states against an Unleash-compatible server, then filter
    Remote {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Base URL of the flag server API
        #[arg(long, env = "UNLEASH_URL")]
        url: String,
        /// Application name reported to the flag server
        #[arg(long, env = "UNLEASH_APP_NAME")]
        app_name: String,
        /// Value sent in the Authorization header
        #[arg(long, env = "UNLEASH_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Environment reported to the flag server
        #[arg(long, env = "UNLEASH_ENVIRONMENT")]
        environment: Option<String>,
        /// Feature states to use until (or instead of, if unreachable) the server answers
        #[arg(long)]
        bootstrap: Option<String>,
        /// Do not register with the server or report usage metrics
        #[arg(long)]
        disable_metrics: bool,
        /// Request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
        /// Fail instead of falling back when the flag server reports an error
        #[arg(long)]
        strict: bool,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// List the features referenced by toggle markers, one per line
    Toggles {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Filter {
            input,
            output,
            enable,
            disable,
            bootstrap,
            pretty,
        } => {
            let document = read_document(input.as_deref())?;
            let toggles =
                build_toggle_set(bootstrap.as_deref(), enable.as_deref(), disable.as_deref())?;
            debug!(features = toggles.len(), "resolved static toggles");

            let filtered = filter_document(&document, |name| toggles.is_enabled(name));
            write_document(output.as_deref(), &filtered, pretty)?;
        }
        Commands::Remote {
            input,
            output,
            url,
            app_name,
            api_key,
            environment,
            bootstrap,
            disable_metrics,
            timeout_secs,
            strict,
            pretty,
        } => {
            let document = read_document(input.as_deref())?;
            let seed = bootstrap.as_deref().map(read_bootstrap).transpose()?;

            let mut config = ProviderConfig::new(url, app_name)
                .with_metrics_disabled(disable_metrics)
                .with_request_timeout(Duration::from_secs(timeout_secs));
            if let Some(api_key) = api_key {
                config = config.with_credentials(api_key);
            }
            if let Some(environment) = environment {
                config = config.with_environment(environment);
            }

            let filtered = filter_remote(config, seed, &document, strict).await?;
            write_document(output.as_deref(), &filtered, pretty)?;
        }
        Commands::Toggles { input } => {
            let document = read_document(input.as_deref())?;
            for name in collect_toggles(&document) {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only the document. `RUST_LOG`
/// overrides the default `warn` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Run one provider lifecycle around a single filter pass.
async fn filter_remote(
    config: ProviderConfig,
    seed: Option<Vec<FeatureDescriptor>>,
    document: &Value,
    strict: bool,
) -> Result<Value> {
    let mut provider =
        ToggleProvider::connect(config).context("Invalid flag server configuration")?;
    let mut events = provider.subscribe();

    provider
        .init(seed)
        .await
        .context("Failed to initialize toggles")?;

    let mut backend_error = None;
    while let Ok(event) = events.try_recv() {
        if let ToggleEvent::Error(message) = event {
            warn!(error = %message, "flag server problem; using fallback toggles");
            if backend_error.is_none() {
                backend_error = Some(message);
            }
        }
    }
    if let (true, Some(message)) = (strict, backend_error) {
        provider.destroy().await;
        anyhow::bail!("Flag server error (--strict): {}", message);
    }

    let toggles = provider.toggles()?;
    let filtered = filter_document(document, |name| toggles.is_enabled(name));
    provider.destroy().await;
    Ok(filtered)
}

/// Merge feature states from `--bootstrap`, `--enable` and `--disable`, in
/// that order, so later sources win.
///
/// - `--enable a,b` produces `{a: true, b: true}`
/// - `--disable` always has the last word
/// - Empty list items are ignored
fn build_toggle_set(
    bootstrap: Option<&str>,
    enable: Option<&str>,
    disable: Option<&str>,
) -> Result<ToggleSet> {
    let mut toggles = ToggleSet::new();

    if let Some(path) = bootstrap {
        toggles.extend(
            read_bootstrap(path)?
                .into_iter()
                .map(|feature| (feature.name, feature.enabled)),
        );
    }
    toggles.extend(split_list(enable).map(|name| (name, true)));
    toggles.extend(split_list(disable).map(|name| (name, false)));

    Ok(toggles)
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.into_iter()
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

fn read_bootstrap(path: &str) -> Result<Vec<FeatureDescriptor>> {
    load_bootstrap(path).with_context(|| format!("Failed to load bootstrap file: {}", path))
}

fn read_document(path: Option<&str>) -> Result<Value> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).context("Failed to parse input document as JSON")
}

fn write_document(path: Option<&str>, document: &Value, pretty: bool) -> Result<()> {
    let mut rendered = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    rendered.push('\n');
    write_output(path, &rendered)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
