//! Batch mode: analyze every row of an implant table and collect one result per row.

pub(crate) mod table;

use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::analysis::{LookupOptions, LookupRequest, analyze};
use crate::openai::CompletionProvider;
use crate::search::SearchProvider;

pub use table::{ResultWriter, TableError, read_table};

pub const MAX_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRow {
    pub manufacturer: String,
    pub model: String,
    pub lead: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub manufacturer: String,
    pub model: String,
    pub lead: Option<String>,
    /// Cleaned analysis text, or the failure message for this row.
    pub result: String,
    pub succeeded: bool,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
    /// Rows never started because the batch was aborted.
    pub not_started: usize,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }
}

/// Runs the pipeline for each row with at most `concurrency` rows in flight.
/// Outcomes keep input order; a failing row never stops the others.
/// Once `abort` is set no further rows are started.
pub async fn run_batch(
    search: &impl SearchProvider,
    completion: &impl CompletionProvider,
    rows: Vec<BatchRow>,
    options: &LookupOptions,
    concurrency: usize,
    abort: &AtomicBool,
) -> BatchReport {
    let total = rows.len();
    let concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
    info!(rows = total, concurrency, "batch started");

    let results: Vec<Option<BatchOutcome>> = stream::iter(rows.into_iter().enumerate())
        .map(|(index, row)| async move {
            if abort.load(Ordering::SeqCst) {
                return None;
            }
            info!(row = index + 1, total, manufacturer = %row.manufacturer, model = %row.model, "analyzing row");
            Some(process_row(search, completion, row, options).await)
        })
        .buffered(concurrency)
        .collect()
        .await;

    let not_started = results.iter().filter(|r| r.is_none()).count();
    let report = BatchReport {
        outcomes: results.into_iter().flatten().collect(),
        not_started,
    };

    if not_started > 0 {
        warn!(not_started, "batch aborted");
    }
    info!(
        processed = report.outcomes.len(),
        failed = report.failed(),
        "batch complete"
    );
    report
}

async fn process_row(
    search: &impl SearchProvider,
    completion: &impl CompletionProvider,
    row: BatchRow,
    options: &LookupOptions,
) -> BatchOutcome {
    let result = match LookupRequest::new(&row.manufacturer, &row.model, row.lead.as_deref()) {
        Ok(request) => analyze(search, completion, &request, options).await,
        Err(e) => Err(e),
    };

    let (result, succeeded) = match result {
        Ok(analysis) => (analysis.text, true),
        Err(e) => {
            warn!(manufacturer = %row.manufacturer, model = %row.model, error = %e, "row failed");
            (e.to_string(), false)
        }
    };

    BatchOutcome {
        manufacturer: row.manufacturer,
        model: row.model,
        lead: row.lead,
        result,
        succeeded,
    }
}
