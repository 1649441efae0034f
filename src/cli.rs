use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Joins official rural/urban classifications onto small-area statistics
#[derive(Parser, Debug)]
#[command(name = "ruc-enrich")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tag every row of lookups.csv with a rural/urban classification
    EnrichLookups {
        /// Directory holding the input CSVs and receiving the outputs
        #[arg(short, long, default_value = ".")]
        data_dir: PathBuf,

        /// Write a JSON run summary to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Join the official classification table onto local-authority totals
    ClassifyAuthorities {
        /// Directory holding the input CSVs and receiving the outputs
        #[arg(short, long, default_value = ".")]
        data_dir: PathBuf,

        /// Write a JSON run summary to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Sum per-small-area measures up to local-authority level
    GroupMeasures {
        /// Directory holding the input CSVs and receiving the outputs
        #[arg(short, long, default_value = ".")]
        data_dir: PathBuf,

        /// Write a JSON run summary to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}
