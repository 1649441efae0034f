mod aggregate;
mod classify;
mod cli;
mod error;
mod join;
mod pipeline;
mod summary;
mod table;
mod types;

use std::path::PathBuf;

use clap::Parser;
use cli::{Cli, Commands};
use join::JoinReport;
use summary::{write_json_file, LabelCount};
use types::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::EnrichLookups { data_dir, summary } => {
            let outcome = pipeline::enrich_lookups(&data_dir)?;
            print_join(&outcome.join, "small areas", 15);
            eprintln!(
                "Rows classified by name heuristic: {}",
                outcome.heuristic_rows
            );
            print_counts("Area types", &outcome.area_types);
            eprintln!("Enriched lookup written to: {}", outcome.output);
            write_summary(&outcome, summary)?;
        }
        Commands::ClassifyAuthorities { data_dir, summary } => {
            let outcome = pipeline::classify_authorities(&data_dir)?;
            print_join(&outcome.join, "local authorities", 20);
            print_counts("Display contexts", &outcome.display_contexts);
            for output in &outcome.outputs {
                eprintln!("Written: {}", output);
            }
            write_summary(&outcome, summary)?;
        }
        Commands::GroupMeasures { data_dir, summary } => {
            let outcome = pipeline::group_measures(&data_dir)?;
            eprintln!("Rows grouped: {}", outcome.rows);
            eprintln!("Rows without a local authority: {}", outcome.excluded);
            eprintln!("Local authorities: {}", outcome.groups);
            eprintln!("Grouped measures written to: {}", outcome.output);
            write_summary(&outcome, summary)?;
        }
    }

    Ok(())
}

fn print_join(report: &JoinReport, unit: &str, sample: usize) {
    eprintln!("Matched {}: {}", unit, report.matched);
    eprintln!("Unmatched {}: {}", unit, report.unmatched);
    if !report.unmatched_keys.is_empty() {
        eprintln!(
            "Unmatched local authorities ({} unique):",
            report.unmatched_keys.len()
        );
        for key in report.unmatched_keys.iter().take(sample) {
            eprintln!("  - {}", key);
        }
        if report.unmatched_keys.len() > sample {
            eprintln!("  ... and {} more", report.unmatched_keys.len() - sample);
        }
    }
}

fn print_counts(heading: &str, counts: &[LabelCount]) {
    eprintln!("{}:", heading);
    for entry in counts {
        eprintln!("  {}: {}", entry.label, entry.count);
    }
}

fn write_summary<T: serde::Serialize>(outcome: &T, path: Option<PathBuf>) -> Result<()> {
    if let Some(path) = path {
        write_json_file(outcome, &path)?;
        eprintln!("Summary written to: {}", path.display());
    }
    Ok(())
}
