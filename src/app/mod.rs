mod errors;
mod params;
mod render;

pub use errors::{AppError, operator_message};
pub use params::{BatchParams, LookupParams, OutputFormat, SessionParams};

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use errors::table_to_lookup_error;

use crate::analysis::{LookupOptions, LookupRequest, analyze};
use crate::batch::{self, BatchReport, ResultWriter};
use crate::config::Config;
use crate::openai::OpenAiClient;
use crate::search::SerpApiClient;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout; per-request timeouts are tighter.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);
/// Maximum redirect hops before aborting.
const MAX_REDIRECTS: usize = 5;

/// Request handler holding the API clients constructed at startup.
/// Every CLI action is one call into `lookup` or `batch`.
pub struct MrScout {
    search: SerpApiClient,
    completion: OpenAiClient,
}

impl MrScout {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = http_client().map_err(|e| AppError::Startup(e.to_string()))?;
        let search = SerpApiClient::new(http.clone(), config.serpapi_key.clone())
            .map_err(|e| AppError::Startup(e.to_string()))?;
        let completion = OpenAiClient::new(http, config.openai_key.clone())
            .map_err(|e| AppError::Startup(e.to_string()))?;
        Ok(Self { search, completion })
    }

    /// Analyzes a single implant and renders the result.
    pub async fn lookup(
        &self,
        params: &LookupParams,
        options: &LookupOptions,
    ) -> Result<String, AppError> {
        let request =
            LookupRequest::new(&params.manufacturer, &params.model, params.lead.as_deref())?;

        info!(
            manufacturer = %request.manufacturer,
            model = %request.model,
            top_k = options.top_k,
            "lookup"
        );

        let analysis = analyze(&self.search, &self.completion, &request, options).await?;

        match params.format {
            OutputFormat::Text => Ok(render::render_text(&analysis, params.show_links)),
            OutputFormat::Json => Ok(render::render_json(&analysis)?),
        }
    }

    /// Analyzes every row of the input table and writes the result CSV.
    /// An unreadable table or an unwritable output path is rejected before any request is made.
    pub async fn batch(
        &self,
        params: &BatchParams,
        options: &LookupOptions,
        abort: &AtomicBool,
    ) -> Result<BatchReport, AppError> {
        let table = batch::read_table(&params.input).map_err(table_to_lookup_error)?;
        if table.skipped > 0 {
            warn!(skipped = table.skipped, "rows without manufacturer or model skipped");
        }

        let output_error = |source| AppError::Output {
            path: params.output.clone(),
            source,
        };
        let writer = ResultWriter::create(&params.output, table.has_lead).map_err(output_error)?;

        let report = batch::run_batch(
            &self.search,
            &self.completion,
            table.rows,
            options,
            usize::from(params.concurrency),
            abort,
        )
        .await;

        writer.write_all(&report.outcomes).map_err(output_error)?;

        info!(output = %params.output.display(), rows = report.outcomes.len(), "results written");
        Ok(report)
    }
}

fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
}
