use std::{path::PathBuf, str::FromStr};

use clap::{
    Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use snippet_runner::{
    client::Client,
    errors::RunnerError,
    snippet::{self, check_arguments},
};
use tracing::{debug, info};

mod runtime;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the snippet runner
#[derive(Debug, Parser)]
#[command(
    version,
    styles = STYLES,
    about = "Snippet runner - run GraphQL snippets with validated JSON arguments",
    disable_help_subcommand = true,
)]
struct Args {
    /// Path to a YAML config file; values set in the environment take priority
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Extra headers to send to the endpoint, as `Name: value`
    #[arg(long = "header", global = true, action = clap::ArgAction::Append)]
    headers: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the available snippets
    List,

    /// Validate the JSON arguments against the snippet's variables and run it
    Run {
        /// The snippet to run
        snippet: String,

        /// A JSON object of variables, e.g. '{"input": {"name": "x"}}'
        #[arg(default_value = "{}")]
        arguments: String,
    },

    /// Print the JSON schema the snippet's arguments must satisfy
    Peek {
        /// The snippet to inspect
        snippet: String,
    },

    /// Print the README of a snippet
    Help {
        /// The snippet to describe
        snippet: String,
    },

    /// Print the JSON schema of the config file
    ConfigSchema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Command::ConfigSchema = args.command {
        let schema = schemars::schema_for!(runtime::Config);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => runtime::read_config(path)?,
        None => runtime::read_config_from_env()?,
    };

    let _guard = runtime::setup_logging(&config.logging)?;
    debug!(?config, "loaded configuration");

    let snippet_root = config.snippet_path()?;

    match args.command {
        Command::List => {
            for snippet in snippet::discover(&snippet_root)? {
                println!("{}", snippet.name);
            }
        }
        Command::Help { snippet } => {
            let found = snippet::find(&snippet_root, &snippet)?;
            match found.readme()? {
                Some(readme) => println!("{readme}"),
                None => println!("No README.md found for snippet '{snippet}'"),
            }
        }
        Command::Peek { snippet } => {
            let client = config.client(parse_headers(args.headers)?)?;
            let loaded = snippet::find(&snippet_root, &snippet)?.load()?;
            let schema = loaded
                .input_schema(&client, config.introspection.max_concurrent_fetches)
                .await?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Command::Run { snippet, arguments } => {
            let arguments: Value =
                serde_json::from_str(&arguments).map_err(RunnerError::InvalidArguments)?;
            let client = config.client(parse_headers(args.headers)?)?;
            let result = run(
                &client,
                &snippet_root,
                &snippet,
                arguments,
                config.introspection.max_concurrent_fetches,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        // Printed before any config is read
        Command::ConfigSchema => {}
    }

    Ok(())
}

/// Build the snippet's input schema, check the arguments against it and execute
async fn run(
    client: &Client,
    snippet_root: &std::path::Path,
    name: &str,
    arguments: Value,
    max_concurrent_fetches: usize,
) -> Result<Value, RunnerError> {
    let loaded = snippet::find(snippet_root, name)?.load()?;
    let schema = loaded
        .input_schema(client, max_concurrent_fetches)
        .await?;

    check_arguments(&schema, &arguments)?;

    info!(snippet = name, endpoint = %client.endpoint(), "Running snippet");
    client.execute(&loaded, arguments).await
}

fn parse_headers(headers: Vec<String>) -> Result<HeaderMap, RunnerError> {
    let mut default_headers = HeaderMap::new();
    for header in headers {
        let parts: Vec<&str> = header.splitn(2, ':').map(|s| s.trim()).collect();
        match (parts.first(), parts.get(1)) {
            (Some(key), Some(value)) => {
                default_headers.append(HeaderName::from_str(key)?, HeaderValue::from_str(value)?);
            }
            _ => return Err(RunnerError::Header(header)),
        }
    }
    Ok(default_headers)
}
