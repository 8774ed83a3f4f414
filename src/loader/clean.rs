use std::collections::HashMap;

use crate::loader::columns::RawRow;
use crate::loader::{CandidacyRecord, PartyCategory, YearRange};

pub const INDEPENDENT_PARTY: &str = "IND";
pub const UNKNOWN_GENDER: &str = "NA";
pub const UNKNOWN_EDUCATION: &str = "Not Available";
pub const UNKNOWN_PARTY_CLASS: &str = "Unknown";

#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub records: Vec<CandidacyRecord>,
    pub dropped_missing_keys: usize,
    pub dropped_out_of_range: usize,
    pub margins_derived: usize,
}

pub fn clean_rows(rows: Vec<RawRow>, years: YearRange) -> CleanOutcome {
    let mut outcome = CleanOutcome::default();
    for row in &rows {
        let Some(record) = clean_row(row) else {
            outcome.dropped_missing_keys += 1;
            continue;
        };
        if !years.contains(record.year) {
            outcome.dropped_out_of_range += 1;
            continue;
        }
        outcome.records.push(record);
    }
    outcome.margins_derived = fill_missing_margins(&mut outcome.records);
    outcome
}

/// Normalizes one row; `None` when year, state or constituency is absent.
pub fn clean_row(row: &RawRow) -> Option<CandidacyRecord> {
    let year = parse_integer(row.get("year"))?;
    let state_name = row
        .get("state_name")
        .map(|s| title_case(&s.replace('_', " ")))?;
    let constituency_name = row.get("constituency_name").map(title_case)?;

    let position = parse_integer(row.get("position"));
    let party_type = text(row.get("party_type"));

    Some(CandidacyRecord {
        year,
        state_name,
        constituency_name,
        candidate_name: row
            .get("candidate_name")
            .map(|name| title_case(name).trim().to_string()),
        party: text(row.get("party")).unwrap_or_else(|| INDEPENDENT_PARTY.to_string()),
        gender: normalize_gender(row.get("gender")),
        position,
        votes: parse_integer(row.get("votes")),
        valid_votes: parse_integer(row.get("valid_votes")),
        electors: parse_integer(row.get("electors")),
        turnout_pct: parse_number(row.get("turnout_pct")).unwrap_or(0.0),
        vote_share_pct: parse_number(row.get("vote_share_pct")).unwrap_or(0.0),
        margin: parse_integer(row.get("margin")),
        margin_pct: parse_number(row.get("margin_pct")).unwrap_or(0.0),
        assembly_no: parse_integer(row.get("assembly_no")),
        constituency_no: parse_integer(row.get("constituency_no")),
        month: parse_integer(row.get("month")),
        poll_no: parse_integer(row.get("poll_no")),
        delim_id: parse_integer(row.get("delim_id")),
        num_candidates: parse_integer(row.get("num_candidates")),
        num_terms: parse_integer(row.get("num_terms")),
        enop: parse_number(row.get("enop")),
        candidate_type: text(row.get("candidate_type")),
        constituency_type: text(row.get("constituency_type")),
        sub_region: text(row.get("sub_region")),
        candidate_id: text(row.get("candidate_id")),
        party_category: PartyCategory::classify(party_type.as_deref()),
        party_class: party_type
            .clone()
            .unwrap_or_else(|| UNKNOWN_PARTY_CLASS.to_string()),
        party_type,
        party_id: text(row.get("party_id")),
        last_party: text(row.get("last_party")),
        last_party_id: text(row.get("last_party_id")),
        last_constituency_name: text(row.get("last_constituency_name")),
        education: text(row.get("education")).unwrap_or_else(|| UNKNOWN_EDUCATION.to_string()),
        profession_main: text(row.get("profession_main")),
        profession_main_desc: text(row.get("profession_main_desc")),
        profession_secondary: text(row.get("profession_secondary")),
        profession_secondary_desc: text(row.get("profession_secondary_desc")),
        election_type: text(row.get("election_type")),
        deposit_lost: parse_deposit_lost(row.get("deposit_lost")),
        last_poll: parse_bool(row.get("last_poll")),
        contested: parse_bool(row.get("contested")),
        same_constituency: parse_bool(row.get("same_constituency")),
        same_party: parse_bool(row.get("same_party")),
        turncoat: parse_bool(row.get("turncoat")),
        incumbent: parse_bool(row.get("incumbent")),
        recontest: parse_bool(row.get("recontest")),
        is_winner: position == Some(1),
    })
}

fn text(value: Option<&str>) -> Option<String> {
    value.map(|v| v.to_string())
}

pub fn parse_number(value: Option<&str>) -> Option<f64> {
    value?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Whole number nearest to the parsed value; `None` when it does not fit in an `i64`.
pub fn parse_integer(value: Option<&str>) -> Option<i64> {
    let rounded = parse_number(value)?.round();
    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return None;
    }
    Some(rounded as i64)
}

pub fn parse_bool(value: Option<&str>) -> Option<bool> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_deposit_lost(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("yes")
    )
}

pub fn normalize_gender(value: Option<&str>) -> String {
    let Some(raw) = value else {
        return UNKNOWN_GENDER.to_string();
    };
    let upper = raw.trim().to_uppercase();
    match upper.as_str() {
        "FEMALE" => "F".to_string(),
        "MALE" => "M".to_string(),
        "" => UNKNOWN_GENDER.to_string(),
        _ => upper,
    }
}

/// Uppercases the first letter of every alphabetic run and lowercases the rest.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_alpha = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(ch);
            previous_alpha = false;
        }
    }
    out
}

/// Derives the winner's margin from the runner-up's votes where the source left it blank.
fn fill_missing_margins(records: &mut [CandidacyRecord]) -> usize {
    let mut best_runner_up: HashMap<(i64, String, String), i64> = HashMap::new();
    for record in records.iter().filter(|r| !r.is_winner) {
        let Some(votes) = record.votes else {
            continue;
        };
        let key = contest_key(record);
        let entry = best_runner_up.entry(key).or_insert(votes);
        if votes > *entry {
            *entry = votes;
        }
    }

    let mut derived = 0;
    for record in records
        .iter_mut()
        .filter(|r| r.is_winner && r.margin.is_none())
    {
        let Some(votes) = record.votes else {
            continue;
        };
        let Some(runner_up) = best_runner_up.get(&contest_key(record)) else {
            continue;
        };
        if let Some(margin) = votes.checked_sub(*runner_up) {
            record.margin = Some(margin);
            derived += 1;
        }
    }
    derived
}

fn contest_key(record: &CandidacyRecord) -> (i64, String, String) {
    (
        record.year,
        record.state_name.clone(),
        record.constituency_name.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::fixtures::{raw, SAMPLE_CSV};
    use crate::loader::read_raw_rows;

    #[test]
    fn title_cases_like_display_names() {
        assert_eq!(title_case("MUMBAI NORTH"), "Mumbai North");
        assert_eq!(title_case("ram naik"), "Ram Naik");
        assert_eq!(title_case("o'brien-smith"), "O'Brien-Smith");
        assert_eq!(title_case("andaman & nicobar"), "Andaman & Nicobar");
    }

    #[test]
    fn normalizes_gender_spellings() {
        assert_eq!(normalize_gender(Some("female")), "F");
        assert_eq!(normalize_gender(Some("Male")), "M");
        assert_eq!(normalize_gender(Some("f")), "F");
        assert_eq!(normalize_gender(Some("O")), "O");
        assert_eq!(normalize_gender(None), "NA");
    }

    #[test]
    fn coerces_booleans_and_numbers_to_missing() {
        assert_eq!(parse_bool(Some(" TRUE ")), Some(true));
        assert_eq!(parse_bool(Some("0")), Some(false));
        assert_eq!(parse_bool(Some("yes")), None);
        assert_eq!(parse_number(Some("63.25")), Some(63.25));
        assert_eq!(parse_number(Some("n/a votes")), None);
        assert_eq!(parse_integer(Some("1999.0")), Some(1999));
        assert_eq!(parse_integer(None), None);
    }

    #[test]
    fn out_of_range_integers_become_missing() {
        assert_eq!(parse_integer(Some("1e19")), None);
        assert_eq!(parse_integer(Some("-1e19")), None);
        assert_eq!(parse_integer(Some("9.3e18")), None);
        assert_eq!(parse_integer(Some("4.2e6")), Some(4_200_000));

        let row = raw(&[
            ("year", "2014"),
            ("state_name", "Goa"),
            ("constituency_name", "Panaji"),
            ("position", "1"),
            ("votes", "1e19"),
        ]);
        let record = clean_row(&row).expect("row kept");
        assert_eq!(record.votes, None);
    }

    #[test]
    fn margin_derivation_skips_overflowing_difference() {
        let winner = crate::loader::fixtures::record(2014, "Goa", "Panaji", "BJP", 1, i64::MAX);
        let runner_up = crate::loader::fixtures::record(2014, "Goa", "Panaji", "INC", 2, -10);
        let mut records = vec![winner, runner_up];
        assert_eq!(fill_missing_margins(&mut records), 0);
        assert_eq!(records[0].margin, None);
    }

    #[test]
    fn drops_rows_without_keys() {
        let row = raw(&[("year", "1999"), ("state_name", "Goa")]);
        assert!(clean_row(&row).is_none());
        let row = raw(&[("year", "abc"), ("state_name", "Goa"), ("constituency_name", "X")]);
        assert!(clean_row(&row).is_none());
    }

    #[test]
    fn applies_defaults_and_derived_fields() {
        let row = raw(&[
            ("year", "2009"),
            ("state_name", "andhra_pradesh"),
            ("constituency_name", "NELLORE"),
            ("candidate_name", "  some body "),
            ("position", "1"),
            ("deposit_lost", "YES"),
        ]);
        let record = clean_row(&row).expect("row kept");
        assert_eq!(record.state_name, "Andhra Pradesh");
        assert_eq!(record.constituency_name, "Nellore");
        assert_eq!(record.candidate_name.as_deref(), Some("Some Body"));
        assert_eq!(record.party, "IND");
        assert_eq!(record.gender, "NA");
        assert_eq!(record.education, "Not Available");
        assert_eq!(record.party_class, "Unknown");
        assert_eq!(record.turnout_pct, 0.0);
        assert!(record.deposit_lost);
        assert!(record.is_winner);
    }

    #[test]
    fn every_kept_row_is_in_range_with_keys() {
        let rows = read_raw_rows(SAMPLE_CSV.as_bytes()).expect("parse csv");
        let outcome = clean_rows(rows, YearRange::default());
        assert_eq!(outcome.records.len(), 5);
        for record in &outcome.records {
            assert!((1991..=2019).contains(&record.year));
            assert!(!record.state_name.is_empty());
            assert!(!record.constituency_name.is_empty());
            assert!(["M", "F", "NA"].contains(&record.gender.as_str()));
            assert_eq!(record.is_winner, record.position == Some(1));
        }
        assert_eq!(outcome.records[2].party, "IND");
        assert_eq!(outcome.records[3].state_name, "Tamil Nadu");
    }

    #[test]
    fn derives_margin_from_runner_up_when_blank() {
        let rows = vec![
            raw(&[
                ("year", "1999"),
                ("state_name", "Maharashtra"),
                ("constituency_name", "Pune"),
                ("position", "1"),
                ("votes", "50000"),
            ]),
            raw(&[
                ("year", "1999"),
                ("state_name", "Maharashtra"),
                ("constituency_name", "Pune"),
                ("position", "2"),
                ("votes", "40000"),
            ]),
        ];
        let outcome = clean_rows(rows, YearRange::default());
        assert_eq!(outcome.margins_derived, 1);
        assert_eq!(outcome.records[0].margin, Some(10000));
        assert_eq!(outcome.records[1].margin, None);
    }

    #[test]
    fn keeps_reported_margin() {
        let rows = vec![
            raw(&[
                ("year", "2004"),
                ("state_name", "Goa"),
                ("constituency_name", "North Goa"),
                ("position", "1"),
                ("votes", "300"),
                ("margin", "42"),
            ]),
            raw(&[
                ("year", "2004"),
                ("state_name", "Goa"),
                ("constituency_name", "North Goa"),
                ("position", "2"),
                ("votes", "200"),
            ]),
        ];
        let outcome = clean_rows(rows, YearRange::default());
        assert_eq!(outcome.margins_derived, 0);
        assert_eq!(outcome.records[0].margin, Some(42));
    }
}
