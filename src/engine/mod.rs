//! Execution engine module
//!
//! Runs one feed end to end: validate parameters, authenticate, fetch
//! run-scoped metadata, paginate the endpoint sequentially, transform and
//! serialize each record, and settle into exactly one completion envelope.

mod types;

pub use types::{FeedCompletion, FeedOutput, RunState, RunStats};

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::auth::extract_json_value;
use crate::error::{Error, Result};
use crate::feed::ResolvedFeed;
use crate::http::HttpClient;
use crate::loader::FeedDefinition;
use crate::params::RunContext;
use crate::transform::{FieldDictionary, TransformChain};
use crate::types::{JsonObject, JsonValue};
use crate::xml::{BufferWriter, OutputWriter, XmlBuilder};

/// Runs one feed against one run context.
///
/// A runner is single-use. Pages are fetched sequentially: the host contract
/// requires records in endpoint order, and the endpoints behind these feeds
/// throttle aggressively enough that concurrent page fetches buy nothing.
pub struct FeedRunner {
    def: FeedDefinition,
    ctx: RunContext,
    state: RunState,
    stats: RunStats,
}

impl FeedRunner {
    /// Create a runner for a definition and run context
    pub fn new(def: FeedDefinition, ctx: RunContext) -> Self {
        Self {
            def,
            ctx,
            state: RunState::Idle,
            stats: RunStats::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Statistics collected so far
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Run the feed, consuming the runner, and always settle.
    ///
    /// This is the host-facing entry point: it never returns an `Err` and
    /// never panics across the boundary, it converts any failure into a
    /// `FeedCompletion::Failure`. No partial output survives a failure.
    pub async fn run_to_completion(mut self) -> FeedCompletion {
        match self.run().await {
            Ok(output) => {
                info!(
                    feed = %self.def.name,
                    records = output.stats.records_emitted,
                    pages = output.stats.pages_fetched,
                    bytes = output.stats.payload_bytes,
                    duration_ms = output.stats.duration_ms,
                    "Feed run complete"
                );
                output.into()
            }
            Err(err) => {
                self.state = RunState::Failed;
                error!(feed = %self.def.name, error = %err, "Feed run failed");
                FeedCompletion::Failure {
                    message: err.to_string(),
                }
            }
        }
    }

    /// Run the feed and return the buffered document, or the first error.
    pub async fn run(&mut self) -> Result<FeedOutput> {
        let start = Instant::now();

        let feed = self.resolve_and_validate()?;
        let client = self.authenticate(&feed).await?;

        self.state = RunState::Preparing;
        let transforms = self.prepare_transforms(&client, &feed).await?;
        let builder = XmlBuilder::new(feed.xml.clone());
        let mut writer: Box<dyn OutputWriter> = Box::new(BufferWriter::new(builder.clone()));

        self.state = RunState::Paginating;
        self.paginate(&client, &feed, &transforms, &builder, writer.as_mut())
            .await?;

        self.state = RunState::Finalizing;
        let payload = writer.finalize().await?;
        self.stats.payload_bytes = payload.len();
        self.stats.duration_ms = start.elapsed().as_millis() as u64;

        self.state = RunState::Done;
        Ok(FeedOutput {
            payload,
            previous_run_context: self.previous_run_context(&feed),
            stats: self.stats.clone(),
        })
    }

    /// Run the feed, pushing record fragments into a caller-supplied writer.
    ///
    /// For hosts that consume records one at a time instead of taking the
    /// buffered document. The caller owns its sink's framing and
    /// finalization; only record fragments pass through.
    pub async fn run_with_writer(&mut self, writer: &mut dyn OutputWriter) -> Result<RunStats> {
        let start = Instant::now();

        let feed = self.resolve_and_validate()?;
        let client = self.authenticate(&feed).await?;

        self.state = RunState::Preparing;
        let transforms = self.prepare_transforms(&client, &feed).await?;
        let builder = XmlBuilder::new(feed.xml.clone());

        self.state = RunState::Paginating;
        self.paginate(&client, &feed, &transforms, &builder, writer)
            .await?;

        self.state = RunState::Finalizing;
        self.stats.duration_ms = start.elapsed().as_millis() as u64;

        self.state = RunState::Done;
        Ok(self.stats.clone())
    }

    /// Check required parameters and bind the definition's templates
    fn resolve_and_validate(&mut self) -> Result<ResolvedFeed> {
        self.state = RunState::ValidatingParams;
        self.ctx.validate_required(&self.def.required_params)?;
        ResolvedFeed::resolve(&self.def, &self.ctx)
    }

    /// Build the client and establish the session artifact eagerly
    async fn authenticate(&mut self, feed: &ResolvedFeed) -> Result<HttpClient> {
        self.state = RunState::Authenticating;
        let client = HttpClient::with_auth(feed.client.clone(), feed.auth.clone());
        client.prime_auth().await?;
        Ok(client)
    }

    /// Combine the static transform chain with the run's field dictionary
    async fn prepare_transforms(
        &self,
        client: &HttpClient,
        feed: &ResolvedFeed,
    ) -> Result<TransformChain> {
        let mut transforms = feed.transforms.clone();
        if let Some(source) = &feed.dictionary {
            let dictionary = FieldDictionary::fetch(client, source).await?;
            transforms.push(dictionary.into_rename_rule());
        }
        Ok(transforms)
    }

    /// Fetch every page in order, transforming and serializing as we go
    async fn paginate(
        &mut self,
        client: &HttpClient,
        feed: &ResolvedFeed,
        transforms: &TransformChain,
        builder: &XmlBuilder,
        writer: &mut dyn OutputWriter,
    ) -> Result<()> {
        let endpoint = &feed.endpoint;
        let pagination = &endpoint.pagination;
        let mut cursor = pagination.cursor();
        let mut first_page = true;

        loop {
            let page_params = pagination.page_params(&cursor);
            let request = endpoint.page_request(&page_params);
            let page = client
                .execute(endpoint.method.into(), &endpoint.url, request)
                .await?;

            let body: JsonValue = serde_json::from_str(&page.body).map_err(|e| {
                Error::parse(format!("Page at offset {} is not valid JSON: {e}", cursor.offset))
            })?;
            let records = extract_records(&body, &endpoint.records_path)?;
            self.stats.add_page();
            debug!(
                offset = cursor.offset,
                records = records.len(),
                "Fetched page"
            );

            for mut record in records.iter().cloned() {
                transforms.apply(&mut record);
                writer.write_fragment(&builder.build_record(&record)).await?;
            }
            self.stats.add_records(records.len());

            if first_page {
                first_page = false;
                if pagination.probe(&body, records.len(), &mut cursor) {
                    break;
                }
                continue;
            }

            // A mid-run empty page means the endpoint's total was wrong;
            // stop rather than spin on empty fetches
            if records.is_empty() {
                warn!(
                    offset = cursor.offset,
                    total = cursor.total,
                    "Empty page before reported total, stopping"
                );
                break;
            }

            if let Some(total) = pagination.extract_total(&body) {
                cursor.record_total(total);
            }
            cursor.advance();
            if cursor.is_done() {
                break;
            }
        }

        Ok(())
    }

    /// Value echoed back for the next run's context
    fn previous_run_context(&self, feed: &ResolvedFeed) -> Option<String> {
        let name = feed.run_context_param.as_deref()?;
        self.ctx
            .token_str(name)
            .or_else(|| self.ctx.param_str(name))
            .map(ToString::to_string)
    }
}

/// Pull the records array out of a page body.
///
/// An empty path means the body itself is the array. Non-object entries are
/// skipped; a body with no array at the path fails the run.
pub fn extract_records(body: &JsonValue, path: &str) -> Result<Vec<JsonObject>> {
    let value = if path.is_empty() {
        body.clone()
    } else {
        extract_json_value(body, path).ok_or_else(|| {
            Error::record_extraction(path, "no value at records path")
        })?
    };

    let items = value.as_array().ok_or_else(|| {
        Error::record_extraction(path, "records path does not point at an array")
    })?;

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match item {
            JsonValue::Object(map) => records.push(map.clone()),
            other => {
                warn!("Skipping non-object record entry: {other}");
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests;
