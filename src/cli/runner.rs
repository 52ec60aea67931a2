//! CLI runner - executes commands

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::cli::commands::{Cli, Commands};
use crate::engine::{FeedCompletion, FeedRunner};
use crate::error::{Error, Result, ResultExt};
use crate::loader::{load_feed, FeedDefinition};
use crate::params::RunContext;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run {
                params_json,
                params,
                tokens_json,
                output,
            } => {
                self.run_feed(
                    params_json.as_deref(),
                    params.as_deref(),
                    tokens_json.as_deref(),
                    output.as_deref(),
                )
                .await
            }
            Commands::Validate => self.validate(),
            Commands::Params => self.params(),
        }
    }

    /// Load the feed definition named on the command line
    fn load_feed(&self) -> Result<FeedDefinition> {
        let path = self
            .cli
            .feed
            .as_ref()
            .ok_or_else(|| Error::config("Feed file not specified (use -f flag)"))?;
        load_feed(path)
    }

    async fn run_feed(
        &self,
        params_json: Option<&str>,
        params_file: Option<&Path>,
        tokens_json: Option<&str>,
        output: Option<&Path>,
    ) -> Result<()> {
        let def = self.load_feed()?;
        let params = load_json(params_json, params_file, "params")?;
        let tokens = load_json(tokens_json, None, "tokens")?;
        let ctx = RunContext::new(params, tokens)?;

        let completion = FeedRunner::new(def, ctx).run_to_completion().await;
        match completion {
            FeedCompletion::Success {
                output: payload,
                previous_run_context,
                stats,
            } => {
                info!(
                    records = stats.records_emitted,
                    pages = stats.pages_fetched,
                    bytes = stats.payload_bytes,
                    duration_ms = stats.duration_ms,
                    "Run succeeded"
                );
                if let Some(context) = previous_run_context {
                    info!(previous_run_context = %context, "Run context for next run");
                }
                write_payload(&payload, output)
            }
            FeedCompletion::Failure { message } => Err(Error::output(message)),
        }
    }

    fn validate(&self) -> Result<()> {
        let def = self.load_feed()?;
        println!("Feed '{}' (v{}) is valid", def.name, def.version);
        if !def.required_params.is_empty() {
            println!("Required parameters: {}", def.required_params.join(", "));
        }
        Ok(())
    }

    fn params(&self) -> Result<()> {
        let def = self.load_feed()?;
        if def.required_params.is_empty() {
            println!("Feed '{}' declares no required parameters", def.name);
        } else {
            for param in &def.required_params {
                println!("{param}");
            }
        }
        Ok(())
    }
}

/// Load a JSON object from an inline string or a file, defaulting to empty
fn load_json(inline: Option<&str>, file: Option<&Path>, what: &str) -> Result<Value> {
    if let Some(raw) = inline {
        return serde_json::from_str(raw)
            .map_err(|e| Error::config(format!("Invalid inline {what} JSON: {e}")));
    }
    if let Some(path) = file {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {what} file '{}': {e}", path.display()))
        })?;
        return serde_json::from_str(&content)
            .map_err(|e| Error::config(format!("Invalid {what} JSON in '{}': {e}", path.display())));
    }
    Ok(Value::Null)
}

/// Write the document to a file or stdout
fn write_payload(payload: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, payload)
                .with_context(|| format!("Failed to write document to '{}'", path.display()))?;
            info!(path = %path.display(), bytes = payload.len(), "Wrote document");
            Ok(())
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(payload)?;
            stdout.write_all(b"\n")?;
            Ok(())
        }
    }
}
