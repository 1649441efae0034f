use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::error::Error;
use crate::table::Table;
use crate::types::Result;

/// Canonical join key for a free-text geographic name.
///
/// Only leading and trailing whitespace is removed. Case and interior
/// spacing are preserved, so names that differ in substance never collide.
pub fn normalize_key(name: &str) -> &str {
    name.trim()
}

/// Policy for collapsing repeated keys in a reference table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Keep the first row seen for each key, drop the rest
    KeepFirst,
    /// Refuse to proceed when a key repeats
    Fail,
}

/// Collapse reference rows whose normalized key was already seen.
///
/// Rows with a missing key can never match a primary row, so they are
/// kept as-is rather than treated as duplicates of each other.
pub fn dedup_reference(table: &Table, key: &str, policy: DedupPolicy) -> Result<Table> {
    let key_idx = table.column_index(key)?;
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Table::new(table.name(), table.headers().to_vec());

    for row in table.rows() {
        if let Some(value) = row[key_idx].as_deref() {
            let normalized = normalize_key(value);
            if !seen.insert(normalized.to_string()) {
                match policy {
                    DedupPolicy::KeepFirst => continue,
                    DedupPolicy::Fail => {
                        return Err(Error::DuplicateKey {
                            table: table.name().to_string(),
                            column: key.to_string(),
                            key: normalized.to_string(),
                        })
                    }
                }
            }
        }
        out.push_row(row.clone());
    }
    Ok(out)
}

/// Left-outer join of `primary` against `reference` on normalized keys.
///
/// Every primary row appears exactly once in the result. Reference columns
/// are attached where the trimmed keys match and left missing otherwise.
/// The reference should already be unique on its key (see
/// [`dedup_reference`]); if duplicates remain, the first occurrence wins.
/// When both key columns share a name the reference copy is omitted, and
/// any other reference column clashing with a primary column is suffixed
/// with `_right`.
pub fn left_join(
    primary: &Table,
    reference: &Table,
    primary_key: &str,
    reference_key: &str,
) -> Result<Table> {
    let primary_idx = primary.column_index(primary_key)?;
    let reference_idx = reference.column_index(reference_key)?;

    let carried: Vec<usize> = (0..reference.headers().len())
        .filter(|&i| i != reference_idx || reference_key != primary_key)
        .collect();

    let mut headers = primary.headers().to_vec();
    for &i in &carried {
        let column = &reference.headers()[i];
        if primary.headers().contains(column) {
            headers.push(format!("{}_right", column));
        } else {
            headers.push(column.clone());
        }
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    for (row_idx, row) in reference.rows().iter().enumerate() {
        if let Some(key) = row[reference_idx].as_deref() {
            index.entry(normalize_key(key)).or_insert(row_idx);
        }
    }

    let mut joined = Table::new(primary.name(), headers);
    for row in primary.rows() {
        let mut out = row.clone();
        let hit = row[primary_idx]
            .as_deref()
            .and_then(|key| index.get(normalize_key(key)));
        match hit {
            Some(&reference_row) => {
                for &i in &carried {
                    out.push(reference.rows()[reference_row][i].clone());
                }
            }
            None => out.extend(std::iter::repeat(None).take(carried.len())),
        }
        joined.push_row(out);
    }
    Ok(joined)
}

/// Join diagnostics: how many primary rows found a reference match
#[derive(Debug, Clone, Serialize)]
pub struct JoinReport {
    pub matched: usize,
    pub unmatched: usize,
    /// Unique labels of the unmatched rows, sorted ascending
    pub unmatched_keys: Vec<String>,
}

/// Count matches by the presence of a marker column and sample the labels
/// of rows that found no reference row.
pub fn match_report(table: &Table, marker: &str, label: &str) -> Result<JoinReport> {
    let marker_idx = table.column_index(marker)?;
    let label_idx = table.column_index(label)?;

    let mut matched = 0;
    let mut unmatched = 0;
    let mut keys: BTreeSet<String> = BTreeSet::new();
    for row in table.rows() {
        if row[marker_idx].is_some() {
            matched += 1;
        } else {
            unmatched += 1;
            if let Some(value) = row[label_idx].as_deref() {
                keys.insert(value.to_string());
            }
        }
    }

    Ok(JoinReport {
        matched,
        unmatched,
        unmatched_keys: keys.into_iter().collect(),
    })
}
