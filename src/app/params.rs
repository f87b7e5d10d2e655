use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::analysis::{CleanupOptions, LookupOptions};
use crate::batch::MAX_CONCURRENCY;
use crate::openai::ModelTier;
use crate::search::links::{DEFAULT_TOP_K, MAX_TOP_K, MIN_TOP_K};
use crate::search::{RetryPolicy, SearchScope};

pub const DEFAULT_OUTPUT: &str = "mr_kompatibilitaet_ergebnisse.csv";

/// Settings shared by single and batch lookups.
#[derive(Args, Debug, Clone)]
pub struct SessionParams {
    /// Where the first search pass looks
    #[arg(long, value_enum, default_value_t = SearchScope::Manufacturers, global = true)]
    pub scope: SearchScope,

    /// Maximum number of search results passed to the model (5-20)
    #[arg(
        long,
        default_value_t = DEFAULT_TOP_K,
        value_parser = clap::value_parser!(u8).range(i64::from(MIN_TOP_K)..=i64::from(MAX_TOP_K)),
        global = true
    )]
    pub top_k: u8,

    /// Model tier used for the analysis
    #[arg(long, value_enum, default_value_t = ModelTier::Standard, global = true)]
    pub model_tier: ModelTier,

    /// Keep lines the model marked as not available (k.A.)
    #[arg(long, global = true)]
    pub keep_unavailable: bool,

    /// Keep parenthetical remarks in the answer
    #[arg(long, global = true)]
    pub keep_parentheticals: bool,
}

impl SessionParams {
    pub fn options(&self) -> LookupOptions {
        LookupOptions {
            scope: self.scope,
            top_k: self.top_k,
            tier: self.model_tier,
            cleanup: CleanupOptions {
                drop_unavailable: !self.keep_unavailable,
                strip_parentheticals: !self.keep_parentheticals,
            },
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct LookupParams {
    /// Implant manufacturer (e.g. "Medtronic")
    pub manufacturer: String,
    /// Implant model (e.g. "Attesta DR ATDR01")
    pub model: String,
    /// Associated lead or probe to include in the analysis
    #[arg(long)]
    pub lead: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// List the source links that were sent to the model
    #[arg(long)]
    pub show_links: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BatchParams {
    /// CSV or XLSX file with columns Hersteller/Manufacturer and Modell/Model
    pub input: PathBuf,
    /// Result CSV path
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,
    /// Rows analyzed in parallel (1-8)
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(1..=MAX_CONCURRENCY as i64)
    )]
    pub concurrency: u8,
}
