use std::path::PathBuf;

use crate::analysis::LookupError;
use crate::batch::TableError;
use crate::search::SearchError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("startup failed: {0}")]
    Startup(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("cannot write results to {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: TableError,
    },

    #[error("cannot render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl AppError {
    /// Process exit status: 2 for operator mistakes, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Startup(_) | AppError::Lookup(LookupError::InvalidInput(_)) => 2,
            _ => 1,
        }
    }
}

/// Input tables that cannot be read are rejected before any lookup runs.
pub(super) fn table_to_lookup_error(e: TableError) -> LookupError {
    LookupError::InvalidInput(e.to_string())
}

/// Error text for the operator, with a hint on what to try next.
pub fn operator_message(e: &AppError) -> String {
    match e {
        AppError::Lookup(LookupError::NotFound) => {
            format!("{e}. Check the model name or try --scope broad.")
        }
        AppError::Lookup(LookupError::SearchUnavailable(SearchError::Api {
            code: 401 | 403,
            ..
        })) => format!("{e} (check SERPAPI_API_KEY)"),
        AppError::Lookup(LookupError::SearchUnavailable(_)) => {
            format!("{e} (retriable, try again later)")
        }
        AppError::Lookup(LookupError::SummarizerRateLimited(_)) => {
            format!("{e} (retriable, try again later or use --model-tier fast)")
        }
        _ => e.to_string(),
    }
}
