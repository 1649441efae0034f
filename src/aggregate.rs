use std::collections::BTreeMap;

use serde::Serialize;

use crate::table::Table;
use crate::types::Result;

/// Totals for one grouping pass
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    /// Rows seen in the input, including ones without a group key
    pub rows: usize,
    /// Rows dropped because their group key was missing
    pub excluded: usize,
    /// Distinct group keys in the output
    pub groups: usize,
}

/// Sum every numeric column per group key.
///
/// A column is numeric when all of its present cells parse as numbers and
/// at least one cell is present; other columns are dropped from the output.
/// Rows with a missing group key are excluded from every group and counted
/// in the report. Missing cells contribute nothing to a sum. Groups are
/// emitted in ascending key order.
// TODO: confirm with the data owner whether rows without a lookup match
// should surface in an explicit leftover bucket instead of being dropped.
pub fn group_sum(table: &Table, group_key: &str) -> Result<(Table, GroupReport)> {
    let group_idx = table.column_index(group_key)?;

    let mut numeric: Vec<usize> = Vec::new();
    for i in 0..table.headers().len() {
        if i == group_idx {
            continue;
        }
        let mut present = 0usize;
        let mut all_numeric = true;
        for row in table.rows() {
            if let Some(value) = row[i].as_deref() {
                present += 1;
                if parse_numeric(value).is_none() {
                    all_numeric = false;
                    break;
                }
            }
        }
        if all_numeric && present > 0 {
            numeric.push(i);
        }
    }

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut excluded = 0usize;
    for row in table.rows() {
        let Some(key) = row[group_idx].as_deref() else {
            excluded += 1;
            continue;
        };
        let sums = groups
            .entry(key.to_string())
            .or_insert_with(|| vec![0.0; numeric.len()]);
        for (slot, &i) in numeric.iter().enumerate() {
            if let Some(value) = row[i].as_deref().and_then(parse_numeric) {
                sums[slot] += value;
            }
        }
    }

    let mut headers = vec![group_key.to_string()];
    headers.extend(numeric.iter().map(|&i| table.headers()[i].clone()));
    let mut out = Table::new(table.name(), headers);
    for (key, sums) in &groups {
        let mut row: Vec<Option<String>> = Vec::with_capacity(1 + sums.len());
        row.push(Some(key.clone()));
        row.extend(sums.iter().map(|v| Some(v.to_string())));
        out.push_row(row);
    }

    let report = GroupReport {
        rows: table.len(),
        excluded,
        groups: groups.len(),
    };
    Ok((out, report))
}

/// Parse a numeric value
fn parse_numeric(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}
