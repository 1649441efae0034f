use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::aggregate::group_sum;
use crate::classify::{classify_authority, classify_from_code, ClassificationSource};
use crate::join::{dedup_reference, left_join, match_report, normalize_key, DedupPolicy, JoinReport};
use crate::summary::{file_digest, sorted_label_counts, FileDigest, LabelCount};
use crate::table::Table;
use crate::types::Result;

// ===== FIXED FILE NAMES (per pipeline variant) =====
/// Small-area lookup: one row per small statistical area
pub const LOOKUPS_FILE: &str = "lookups.csv";
/// Official rural/urban classification of local authority districts (England and Wales)
pub const RUC_REFERENCE_FILE: &str =
    "Rural_Urban_Classification_(2021)_of_Local_Authority_Districts_(2024)_in_EW.csv";
/// Local-authority totals awaiting classification
pub const LA_TOTALS_FILE: &str = "Level_1_grouped_by_LA.csv";
/// Local-authority totals with the classification attached
pub const LA_TOTALS_WITH_RUC_FILE: &str = "Level_1_grouped_by_LA_with_RUC.csv";
/// Slimmed classification table for display use
pub const SIMPLE_CLASSIFICATIONS_FILE: &str = "LA_classifications_simple.csv";
/// Small-area measures to be summed per local authority
pub const MEASURES_FILE: &str = "Level_2.csv";
/// Measures summed per local authority
pub const GROUPED_MEASURES_FILE: &str = "Level_2_grouped_by_LA.csv";
/// Enriched small-area lookup produced by `enrich_lookups`
pub const ENRICHED_LOOKUPS_FILE: &str = "lookups_with_classification.csv";

/// Outcome of the small-area enrichment pipeline
#[derive(Debug, Serialize)]
pub struct EnrichSummary {
    pub inputs: Vec<FileDigest>,
    pub rows: usize,
    pub join: JoinReport,
    /// Rows classified by the name heuristic instead of the reference table
    pub heuristic_rows: usize,
    pub area_types: Vec<LabelCount>,
    pub output: String,
}

/// Outcome of the local-authority classification pipeline
#[derive(Debug, Serialize)]
pub struct ClassifySummary {
    pub inputs: Vec<FileDigest>,
    pub rows: usize,
    pub join: JoinReport,
    pub display_contexts: Vec<LabelCount>,
    pub outputs: Vec<String>,
}

/// Outcome of the measure-grouping pipeline
#[derive(Debug, Serialize)]
pub struct GroupSummary {
    pub inputs: Vec<FileDigest>,
    pub rows: usize,
    pub excluded: usize,
    pub groups: usize,
    pub output: String,
}

/// Tag every small area with a rural/urban classification.
///
/// Left-joins `lookups.csv` to the pre-joined classification table on the
/// trimmed local-authority name, classifies each row, and writes
/// `lookups_with_classification.csv`. Scotland and Northern Ireland rows
/// have no reference coverage and go through the name heuristic.
pub fn enrich_lookups(data_dir: &Path) -> Result<EnrichSummary> {
    let lookups_path = data_dir.join(LOOKUPS_FILE);
    let reference_path = data_dir.join(LA_TOTALS_WITH_RUC_FILE);
    let inputs = vec![file_digest(&lookups_path)?, file_digest(&reference_path)?];

    let lookups = Table::read_csv(&lookups_path)?;
    let la_with_ruc = Table::read_csv(&reference_path)?;

    let la_to_ruc = la_with_ruc.select(&[
        "local_authority_clean",
        "Urban_rural_flag",
        "RUC21CD",
        "RUC21NM",
    ])?;
    let la_to_ruc = dedup_reference(&la_to_ruc, "local_authority_clean", DedupPolicy::KeepFirst)?;

    let joined = left_join(&lookups, &la_to_ruc, "local_authority", "local_authority_clean")?;
    let join = match_report(&joined, "Urban_rural_flag", "local_authority")?;

    let carried_columns = [
        "small_area",
        "population",
        "households",
        "local_authority",
        "nation",
    ];
    let carried: Vec<usize> = carried_columns
        .iter()
        .map(|c| joined.column_index(c))
        .collect::<Result<_>>()?;
    let ruc_name_idx = joined.column_index("RUC21NM")?;
    let flag_idx = joined.column_index("Urban_rural_flag")?;
    let authority_idx = joined.column_index("local_authority")?;

    let mut headers: Vec<String> = carried_columns.iter().map(|c| c.to_string()).collect();
    headers.push("urban_rural".to_string());
    headers.push("area_type_display".to_string());
    let mut enriched = Table::new(ENRICHED_LOOKUPS_FILE, headers);

    let mut heuristic_rows = 0usize;
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in joined.rows() {
        let class = classify_authority(
            row[ruc_name_idx].as_deref(),
            row[flag_idx].as_deref(),
            row[authority_idx].as_deref().unwrap_or(""),
        );
        if class.source == ClassificationSource::Heuristic {
            heuristic_rows += 1;
        }
        *counts.entry(class.area_type.label()).or_insert(0) += 1;

        let mut out: Vec<Option<String>> = carried.iter().map(|&i| row[i].clone()).collect();
        out.push(Some(class.urban_rural.as_str().to_string()));
        out.push(Some(class.area_type.label().to_string()));
        enriched.push_row(out);
    }

    let output_path = data_dir.join(ENRICHED_LOOKUPS_FILE);
    enriched.write_csv(&output_path)?;

    Ok(EnrichSummary {
        inputs,
        rows: enriched.len(),
        join,
        heuristic_rows,
        area_types: sorted_label_counts(counts),
        output: output_path.display().to_string(),
    })
}

/// Join the official classification onto local-authority totals.
///
/// Writes the fully merged table (all columns plus `display_context`) and
/// a slimmed four-column version. The official reference must be unique on
/// the district name; a repeat aborts the run.
pub fn classify_authorities(data_dir: &Path) -> Result<ClassifySummary> {
    let totals_path = data_dir.join(LA_TOTALS_FILE);
    let ruc_path = data_dir.join(RUC_REFERENCE_FILE);
    let inputs = vec![file_digest(&totals_path)?, file_digest(&ruc_path)?];

    let mut totals = Table::read_csv(&totals_path)?;
    let ruc = Table::read_csv(&ruc_path)?;

    let clean: Vec<Option<String>> = totals
        .column_values("local_authority")?
        .iter()
        .map(|cell| cell.as_deref().map(|v| normalize_key(v).to_string()))
        .collect();
    totals.push_column("local_authority_clean", clean);

    let mut reference = ruc.select(&["LAD24NM", "RUC21CD", "RUC21NM", "Urban_rural_flag"])?;
    reference.rename_column("LAD24NM", "LAD24NM_clean")?;
    reference.map_column("LAD24NM_clean", |v| normalize_key(v).to_string())?;
    let reference = dedup_reference(&reference, "LAD24NM_clean", DedupPolicy::Fail)?;

    let mut merged = left_join(&totals, &reference, "local_authority_clean", "LAD24NM_clean")?;
    let join = match_report(&merged, "RUC21CD", "local_authority")?;

    let code_idx = merged.column_index("RUC21CD")?;
    let ruc_name_idx = merged.column_index("RUC21NM")?;
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut display: Vec<Option<String>> = Vec::with_capacity(merged.len());
    for row in merged.rows() {
        match classify_from_code(row[code_idx].as_deref(), row[ruc_name_idx].as_deref()) {
            Some(area_type) => {
                *counts.entry(area_type.label()).or_insert(0) += 1;
                display.push(Some(area_type.label().to_string()));
            }
            None => display.push(None),
        }
    }
    merged.push_column("display_context", display);

    let simple = merged.select(&[
        "local_authority",
        "Urban_rural_flag",
        "display_context",
        "sum",
    ])?;

    let merged_path = data_dir.join(LA_TOTALS_WITH_RUC_FILE);
    let simple_path = data_dir.join(SIMPLE_CLASSIFICATIONS_FILE);
    merged.write_csv(&merged_path)?;
    simple.write_csv(&simple_path)?;

    Ok(ClassifySummary {
        inputs,
        rows: merged.len(),
        join,
        display_contexts: sorted_label_counts(counts),
        outputs: vec![
            merged_path.display().to_string(),
            simple_path.display().to_string(),
        ],
    })
}

/// Sum small-area measures per local authority.
///
/// Measures join to the lookup on `small_area`; rows with no lookup entry
/// drop out of the totals and are only counted in the summary.
pub fn group_measures(data_dir: &Path) -> Result<GroupSummary> {
    let measures_path = data_dir.join(MEASURES_FILE);
    let lookups_path = data_dir.join(LOOKUPS_FILE);
    let inputs = vec![file_digest(&measures_path)?, file_digest(&lookups_path)?];

    let measures = Table::read_csv(&measures_path)?;
    let lookups = Table::read_csv(&lookups_path)?;

    let authority_of = lookups.select(&["small_area", "local_authority"])?;
    let joined = left_join(&measures, &authority_of, "small_area", "small_area")?;
    let (grouped, report) = group_sum(&joined, "local_authority")?;

    let output_path = data_dir.join(GROUPED_MEASURES_FILE);
    grouped.write_csv(&output_path)?;

    Ok(GroupSummary {
        inputs,
        rows: report.rows,
        excluded: report.excluded,
        groups: report.groups,
        output: output_path.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    fn write_input(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn lookups_csv() -> &'static str {
        "small_area,population,households,local_authority,nation\n\
         E001,1200,500,Leeds,England\n\
         S001,900,400,City of Edinburgh,Scotland\n\
         S002,450,210,Orkney Islands,Scotland\n\
         W001,800,350,Cardiff,Wales\n"
    }

    #[test]
    fn test_enrich_lookups_classifies_every_row() {
        let dir = TempDir::new().unwrap();
        write_input(&dir, LOOKUPS_FILE, lookups_csv());
        // duplicate Leeds row exercises the keep-first dedup
        write_input(
            &dir,
            LA_TOTALS_WITH_RUC_FILE,
            "local_authority,sum,local_authority_clean,LAD24NM_clean,RUC21CD,RUC21NM,Urban_rural_flag,display_context\n\
             Leeds,10,Leeds,Leeds,UN1,Urban: Majority nearer a major town or city,Urban,Urban (near major city)\n\
             Leeds,11,Leeds,Leeds,UN1,Urban: Majority nearer a major town or city,Urban,Urban (near major city)\n\
             Cardiff,5,Cardiff,Cardiff,RI1,Intermediate rural,Rural,Rural (intermediate)\n",
        );

        let summary = enrich_lookups(dir.path()).unwrap();

        assert_eq!(summary.rows, 4);
        assert_eq!(summary.join.matched, 2);
        assert_eq!(summary.join.unmatched, 2);
        assert_eq!(
            summary.join.unmatched_keys,
            vec!["City of Edinburgh", "Orkney Islands"]
        );
        assert_eq!(summary.heuristic_rows, 2);
        assert_eq!(summary.inputs.len(), 2);

        let written = fs::read_to_string(dir.path().join(ENRICHED_LOOKUPS_FILE)).unwrap();
        assert_eq!(
            written,
            "small_area,population,households,local_authority,nation,urban_rural,area_type_display\n\
             E001,1200,500,Leeds,England,Urban,Urban (near major city)\n\
             S001,900,400,City of Edinburgh,Scotland,Urban,Urban (major city)\n\
             S002,450,210,Orkney Islands,Scotland,Rural,Rural (intermediate)\n\
             W001,800,350,Cardiff,Wales,Rural,Rural (intermediate)\n"
        );

        let labels: Vec<(&str, usize)> = summary
            .area_types
            .iter()
            .map(|c| (c.label.as_str(), c.count))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("Rural (intermediate)", 2),
                ("Urban (major city)", 1),
                ("Urban (near major city)", 1),
            ]
        );
    }

    #[test]
    fn test_enrich_lookups_runs_are_byte_identical() {
        let dir = TempDir::new().unwrap();
        write_input(&dir, LOOKUPS_FILE, lookups_csv());
        write_input(
            &dir,
            LA_TOTALS_WITH_RUC_FILE,
            "local_authority,sum,local_authority_clean,LAD24NM_clean,RUC21CD,RUC21NM,Urban_rural_flag,display_context\n\
             Leeds,10,Leeds,Leeds,UN1,Urban: Majority nearer a major town or city,Urban,Urban (near major city)\n",
        );

        enrich_lookups(dir.path()).unwrap();
        let first = fs::read(dir.path().join(ENRICHED_LOOKUPS_FILE)).unwrap();
        enrich_lookups(dir.path()).unwrap();
        let second = fs::read(dir.path().join(ENRICHED_LOOKUPS_FILE)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_enrich_lookups_missing_column_aborts_before_writing() {
        let dir = TempDir::new().unwrap();
        write_input(&dir, LOOKUPS_FILE, "small_area,population\nE001,1200\n");
        write_input(
            &dir,
            LA_TOTALS_WITH_RUC_FILE,
            "local_authority_clean,Urban_rural_flag,RUC21CD,RUC21NM\nLeeds,Urban,UN1,Urban: Majority nearer\n",
        );

        let result = enrich_lookups(dir.path());

        assert!(matches!(result, Err(Error::MissingColumn { .. })));
        assert!(!dir.path().join(ENRICHED_LOOKUPS_FILE).exists());
    }

    #[test]
    fn test_classify_authorities_writes_merged_and_simple_tables() {
        let dir = TempDir::new().unwrap();
        // trailing space on the totals side still matches the reference
        write_input(
            &dir,
            LA_TOTALS_FILE,
            "local_authority,sum\nLeeds ,10.5\nGlasgow City,20\n",
        );
        write_input(
            &dir,
            RUC_REFERENCE_FILE,
            "FID,LAD24NM,RUC21CD,RUC21NM,Urban_rural_flag\n\
             1,Leeds,UN1,Urban: Majority nearer a major town or city,Urban\n\
             2,York,RN2,Majority rural: Majority nearer a major town or city,Rural\n",
        );

        let summary = classify_authorities(dir.path()).unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.join.matched, 1);
        assert_eq!(summary.join.unmatched, 1);
        assert_eq!(summary.join.unmatched_keys, vec!["Glasgow City"]);

        let merged = fs::read_to_string(dir.path().join(LA_TOTALS_WITH_RUC_FILE)).unwrap();
        assert_eq!(
            merged,
            "local_authority,sum,local_authority_clean,LAD24NM_clean,RUC21CD,RUC21NM,Urban_rural_flag,display_context\n\
             Leeds ,10.5,Leeds,Leeds,UN1,Urban: Majority nearer a major town or city,Urban,Urban (near major city)\n\
             Glasgow City,20,Glasgow City,,,,,\n"
        );

        let simple = fs::read_to_string(dir.path().join(SIMPLE_CLASSIFICATIONS_FILE)).unwrap();
        assert_eq!(
            simple,
            "local_authority,Urban_rural_flag,display_context,sum\n\
             Leeds ,Urban,Urban (near major city),10.5\n\
             Glasgow City,,,20\n"
        );
    }

    #[test]
    fn test_classify_authorities_rejects_duplicate_reference_districts() {
        let dir = TempDir::new().unwrap();
        write_input(&dir, LA_TOTALS_FILE, "local_authority,sum\nLeeds,10\n");
        write_input(
            &dir,
            RUC_REFERENCE_FILE,
            "LAD24NM,RUC21CD,RUC21NM,Urban_rural_flag\n\
             Leeds,UN1,Urban: Majority nearer,Urban\n\
             Leeds ,UN1,Urban: Majority nearer,Urban\n",
        );

        let result = classify_authorities(dir.path());

        match result {
            Err(Error::DuplicateKey { key, .. }) => assert_eq!(key, "Leeds"),
            other => panic!("expected DuplicateKey, got {:?}", other),
        }
        assert!(!dir.path().join(LA_TOTALS_WITH_RUC_FILE).exists());
    }

    #[test]
    fn test_group_measures_sums_and_excludes_unmapped() {
        let dir = TempDir::new().unwrap();
        write_input(&dir, MEASURES_FILE, "small_area,v\nA,1\nB,2\nC,5\nD,9\n");
        write_input(
            &dir,
            LOOKUPS_FILE,
            "small_area,population,households,local_authority,nation\n\
             A,10,5,X,England\n\
             B,20,8,X,England\n\
             C,30,9,Y,Wales\n",
        );

        let summary = group_measures(dir.path()).unwrap();

        assert_eq!(summary.rows, 4);
        assert_eq!(summary.excluded, 1);
        assert_eq!(summary.groups, 2);

        let written = fs::read_to_string(dir.path().join(GROUPED_MEASURES_FILE)).unwrap();
        assert_eq!(written, "local_authority,v\nX,3\nY,5\n");
    }
}
