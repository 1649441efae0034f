use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::Result;

/// Name and content digest of one input file
#[derive(Debug, Clone, Serialize)]
pub struct FileDigest {
    pub file: String,
    pub sha256: String,
}

/// Digest an input file for the run summary
pub fn file_digest(path: &Path) -> Result<FileDigest> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;

    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();
    Ok(FileDigest {
        file,
        sha256: format!("{:x}", hasher.finalize()),
    })
}

/// A display label and how many rows carried it
#[derive(Debug, Clone, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Order label tallies by descending count, breaking ties by label
pub fn sorted_label_counts(counts: BTreeMap<&str, usize>) -> Vec<LabelCount> {
    let mut out: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    out
}

/// Write a run summary as pretty-printed JSON
pub fn write_json_file<T: Serialize>(summary: &T, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}
