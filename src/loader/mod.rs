pub mod aggregate;
pub mod clean;
pub mod columns;

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::loader::aggregate::Dataset;
use crate::loader::clean::clean_rows;
use crate::loader::columns::{canonical_name, RawRow};
use crate::store::ElectionStore;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("CSV not found at {}", .0.display())]
    InputNotFound(PathBuf),
}

/// Inclusive election-year window kept by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i64,
    pub max: i64,
}

impl YearRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, year: i64) -> bool {
        year >= self.min && year <= self.max
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::new(1991, 2019)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartyCategory {
    National,
    Regional,
    Other,
}

impl PartyCategory {
    /// Case-insensitive match on the source's party type text.
    pub fn classify(party_type: Option<&str>) -> Self {
        let kind = party_type.map(str::to_ascii_lowercase).unwrap_or_default();
        if kind.contains("national") {
            Self::National
        } else if kind.contains("state") {
            Self::Regional
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::National => "National",
            Self::Regional => "Regional",
            Self::Other => "Other",
        }
    }
}

impl Display for PartyCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One candidate standing in one constituency in one election year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidacyRecord {
    pub year: i64,
    pub state_name: String,
    pub constituency_name: String,
    pub candidate_name: Option<String>,
    pub party: String,
    pub gender: String,
    pub position: Option<i64>,
    pub votes: Option<i64>,
    pub valid_votes: Option<i64>,
    pub electors: Option<i64>,
    pub turnout_pct: f64,
    pub vote_share_pct: f64,
    pub margin: Option<i64>,
    pub margin_pct: f64,
    pub assembly_no: Option<i64>,
    pub constituency_no: Option<i64>,
    pub month: Option<i64>,
    pub poll_no: Option<i64>,
    pub delim_id: Option<i64>,
    pub num_candidates: Option<i64>,
    pub num_terms: Option<i64>,
    pub enop: Option<f64>,
    pub candidate_type: Option<String>,
    pub constituency_type: Option<String>,
    pub sub_region: Option<String>,
    pub candidate_id: Option<String>,
    pub party_type: Option<String>,
    pub party_id: Option<String>,
    pub last_party: Option<String>,
    pub last_party_id: Option<String>,
    pub last_constituency_name: Option<String>,
    pub education: String,
    pub profession_main: Option<String>,
    pub profession_main_desc: Option<String>,
    pub profession_secondary: Option<String>,
    pub profession_secondary_desc: Option<String>,
    pub election_type: Option<String>,
    pub deposit_lost: bool,
    pub last_poll: Option<bool>,
    pub contested: Option<bool>,
    pub same_constituency: Option<bool>,
    pub same_party: Option<bool>,
    pub turncoat: Option<bool>,
    pub incumbent: Option<bool>,
    pub recontest: Option<bool>,
    pub is_winner: bool,
    pub party_class: String,
    pub party_category: PartyCategory,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub db_path: PathBuf,
    pub rows_read: usize,
    pub rows_missing_keys: usize,
    pub rows_out_of_range: usize,
    pub rows_kept: usize,
    pub margins_derived: usize,
    pub finished_at: DateTime<Utc>,
}

/// Rebuilds the store at `db_path` from the CSV at `csv_path`.
pub fn load_database(csv_path: &Path, db_path: &Path, years: YearRange) -> Result<LoadSummary> {
    let raw = read_raw_csv(csv_path)?;
    let rows_read = raw.len();
    let outcome = clean_rows(raw, years);
    info!(
        rows_read,
        dropped_missing_keys = outcome.dropped_missing_keys,
        dropped_out_of_range = outcome.dropped_out_of_range,
        kept = outcome.records.len(),
        "cleaned candidacy rows"
    );

    let dataset = Dataset::build(outcome.records);
    let mut store = ElectionStore::open(db_path)?;
    store.rebuild(&dataset)?;

    Ok(LoadSummary {
        db_path: db_path.to_path_buf(),
        rows_read,
        rows_missing_keys: outcome.dropped_missing_keys,
        rows_out_of_range: outcome.dropped_out_of_range,
        rows_kept: dataset.candidates.len(),
        margins_derived: outcome.margins_derived,
        finished_at: Utc::now(),
    })
}

pub fn read_raw_csv(path: &Path) -> Result<Vec<RawRow>> {
    if !path.exists() {
        return Err(LoadError::InputNotFound(path.to_path_buf()).into());
    }
    let file =
        File::open(path).with_context(|| format!("failed opening CSV: {}", path.display()))?;
    read_raw_rows(file).with_context(|| format!("failed reading CSV: {}", path.display()))
}

pub fn read_raw_rows<R: std::io::Read>(input: R) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input);
    let columns: Vec<Option<&'static str>> =
        reader.headers()?.iter().map(canonical_name).collect();
    debug!(
        mapped = columns.iter().filter(|c| c.is_some()).count(),
        total = columns.len(),
        "resolved CSV headers"
    );

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = RawRow::default();
        for (idx, value) in record.iter().enumerate() {
            if let Some(Some(column)) = columns.get(idx).copied() {
                row.insert(column, value);
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::columns::RawRow;
    use super::CandidacyRecord;
    use super::PartyCategory;

    pub fn record(
        year: i64,
        state: &str,
        constituency: &str,
        party: &str,
        position: i64,
        votes: i64,
    ) -> CandidacyRecord {
        CandidacyRecord {
            year,
            state_name: state.to_string(),
            constituency_name: constituency.to_string(),
            candidate_name: Some(format!("{party} Candidate {constituency}")),
            party: party.to_string(),
            gender: "M".to_string(),
            position: Some(position),
            votes: Some(votes),
            valid_votes: None,
            electors: None,
            turnout_pct: 0.0,
            vote_share_pct: 0.0,
            margin: None,
            margin_pct: 0.0,
            assembly_no: None,
            constituency_no: None,
            month: None,
            poll_no: None,
            delim_id: None,
            num_candidates: None,
            num_terms: None,
            enop: None,
            candidate_type: None,
            constituency_type: None,
            sub_region: None,
            candidate_id: None,
            party_type: None,
            party_id: None,
            last_party: None,
            last_party_id: None,
            last_constituency_name: None,
            education: "Not Available".to_string(),
            profession_main: None,
            profession_main_desc: None,
            profession_secondary: None,
            profession_secondary_desc: None,
            election_type: None,
            deposit_lost: false,
            last_poll: None,
            contested: None,
            same_constituency: None,
            same_party: None,
            turncoat: None,
            incumbent: None,
            recontest: None,
            is_winner: position == 1,
            party_class: "Unknown".to_string(),
            party_category: PartyCategory::Other,
        }
    }

    pub fn raw(pairs: &[(&'static str, &str)]) -> RawRow {
        RawRow::from_pairs(pairs)
    }

    pub const SAMPLE_CSV: &str = "\
State_Name,Year,Constituency_Name,Position,Candidate,Sex,Party,Votes,Valid_Votes,Electors,Turnout_Percentage,Margin,Party_Type_TCPD,MyNeta_education,Deposit_Lost,Incumbent,Extra_Column
Maharashtra,1999,MUMBAI NORTH,1,ram naik,MALE,BJP,50000,95000,150000,63.3,10000,National Party,Graduate,no,TRUE,x
Maharashtra,1999,MUMBAI NORTH,2,sunita patil,female,INC,40000,95000,150000,63.3,,National Party,Post Graduate,no,false,x
Maharashtra,1999,MUMBAI NORTH,3,local hopeful,M,,5000,95000,150000,63.3,,,,yes,,x
Tamil_Nadu,2014,CHENNAI SOUTH,1,j jayakumar,F,ADMK,60000,100000,140000,71.4,12000,State-based Party,12th Pass,no,0,x
Tamil_Nadu,2014,CHENNAI SOUTH,2,t sumathy,FEMALE,DMK,48000,100000,140000,71.4,,State-based Party,Graduate,no,1,x
Kerala,1984,TRIVANDRUM,1,old timer,M,INC,1000,2000,3000,66.6,500,National Party,,no,,x
,2004,NOWHERE,1,no state,M,IND,10,10,10,1.0,,,,no,,x
";
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::fixtures::SAMPLE_CSV;
    use super::*;

    #[test]
    fn missing_input_is_a_typed_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_database(
            &dir.path().join("absent.csv"),
            &dir.path().join("out.db"),
            YearRange::default(),
        )
        .expect_err("load should fail");
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::InputNotFound(_))
        ));
        assert!(!dir.path().join("out.db").exists());
    }

    #[test]
    fn reads_only_mapped_columns() {
        let rows = read_raw_rows(SAMPLE_CSV.as_bytes()).expect("parse csv");
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].get("state_name"), Some("Maharashtra"));
        assert_eq!(rows[0].get("education"), Some("Graduate"));
        assert_eq!(rows[0].get("Extra_Column"), None);
        assert_eq!(rows[2].get("party"), None);
    }

    #[test]
    fn load_reports_counts_and_writes_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv_path = dir.path().join("ge.csv");
        fs::write(&csv_path, SAMPLE_CSV).expect("write csv");
        let db_path = dir.path().join("nested/elections.db");

        let summary =
            load_database(&csv_path, &db_path, YearRange::default()).expect("load succeeds");
        assert_eq!(summary.rows_read, 7);
        assert_eq!(summary.rows_missing_keys, 1);
        assert_eq!(summary.rows_out_of_range, 1);
        assert_eq!(summary.rows_kept, 5);
        assert!(db_path.exists());
    }

    #[test]
    fn classifies_party_types() {
        assert_eq!(
            PartyCategory::classify(Some("National Party")),
            PartyCategory::National
        );
        assert_eq!(
            PartyCategory::classify(Some("State-based Party (Other State)")),
            PartyCategory::Regional
        );
        assert_eq!(
            PartyCategory::classify(Some("Independents")),
            PartyCategory::Other
        );
        assert_eq!(PartyCategory::classify(None), PartyCategory::Other);
    }

    #[test]
    fn classification_ignores_case() {
        assert_eq!(
            PartyCategory::classify(Some("NATIONAL PARTY")),
            PartyCategory::National
        );
        assert_eq!(
            PartyCategory::classify(Some("state-based party")),
            PartyCategory::Regional
        );
        assert_eq!(
            PartyCategory::classify(Some("national party")),
            PartyCategory::National
        );
    }
}
