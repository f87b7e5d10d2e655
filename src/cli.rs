use clap::{Parser, Subcommand};

use crate::app::{BatchParams, LookupParams, SessionParams};

/// Look up MRI compatibility of medical implants.
///
/// Requires SERPAPI_API_KEY and OPENAI_API_KEY in the environment.
#[derive(Parser, Debug)]
#[command(name = "mrscout", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub session: SessionParams,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a single implant
    Lookup(LookupParams),
    /// Analyze every row of a CSV/XLSX table and write a result CSV
    Batch(BatchParams),
}
