use std::collections::HashMap;

/// Source header -> canonical column name. Headers not listed here are dropped.
pub const COLUMN_MAP: &[(&str, &str)] = &[
    ("State_Name", "state_name"),
    ("Assembly_No", "assembly_no"),
    ("Constituency_No", "constituency_no"),
    ("Year", "year"),
    ("month", "month"),
    ("Poll_No", "poll_no"),
    ("DelimID", "delim_id"),
    ("Position", "position"),
    ("Candidate", "candidate_name"),
    ("Sex", "gender"),
    ("Party", "party"),
    ("Votes", "votes"),
    ("Candidate_Type", "candidate_type"),
    ("Valid_Votes", "valid_votes"),
    ("Electors", "electors"),
    ("Constituency_Name", "constituency_name"),
    ("Constituency_Type", "constituency_type"),
    ("Sub_Region", "sub_region"),
    ("N_Cand", "num_candidates"),
    ("Turnout_Percentage", "turnout_pct"),
    ("Vote_Share_Percentage", "vote_share_pct"),
    ("Deposit_Lost", "deposit_lost"),
    ("Margin", "margin"),
    ("Margin_Percentage", "margin_pct"),
    ("ENOP", "enop"),
    ("pid", "candidate_id"),
    ("Party_Type_TCPD", "party_type"),
    ("Party_ID", "party_id"),
    ("last_poll", "last_poll"),
    ("Contested", "contested"),
    ("Last_Party", "last_party"),
    ("Last_Party_ID", "last_party_id"),
    ("Last_Constituency_Name", "last_constituency_name"),
    ("Same_Constituency", "same_constituency"),
    ("Same_Party", "same_party"),
    ("No_Terms", "num_terms"),
    ("Turncoat", "turncoat"),
    ("Incumbent", "incumbent"),
    ("Recontest", "recontest"),
    ("MyNeta_education", "education"),
    ("TCPD_Prof_Main", "profession_main"),
    ("TCPD_Prof_Main_Desc", "profession_main_desc"),
    ("TCPD_Prof_Second", "profession_secondary"),
    ("TCPD_Prof_Second_Desc", "profession_secondary_desc"),
    ("Election_Type", "election_type"),
];

pub const NUMERIC_COLUMNS: &[&str] = &[
    "assembly_no",
    "constituency_no",
    "year",
    "month",
    "poll_no",
    "delim_id",
    "position",
    "votes",
    "valid_votes",
    "electors",
    "num_candidates",
    "turnout_pct",
    "vote_share_pct",
    "margin",
    "margin_pct",
    "num_terms",
    "enop",
];

pub const BOOL_COLUMNS: &[&str] = &[
    "last_poll",
    "contested",
    "same_constituency",
    "same_party",
    "turncoat",
    "incumbent",
    "recontest",
];

/// Cell contents treated as absent, matching the usual CSV export conventions.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn canonical_name(header: &str) -> Option<&'static str> {
    let header = header.trim().trim_start_matches('\u{feff}');
    COLUMN_MAP
        .iter()
        .find(|(source, _)| *source == header)
        .map(|(_, canonical)| *canonical)
}

pub fn is_missing(value: &str) -> bool {
    MISSING_TOKENS.contains(&value.trim())
}

/// One CSV row keyed by canonical column name. Missing cells are not stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    values: HashMap<&'static str, String>,
}

impl RawRow {
    pub fn insert(&mut self, column: &'static str, value: &str) {
        if is_missing(value) {
            return;
        }
        self.values.insert(column, value.to_string());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn from_pairs(pairs: &[(&'static str, &str)]) -> Self {
        let mut row = Self::default();
        for &(column, value) in pairs {
            row.insert(column, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_headers_and_drops_unknown() {
        assert_eq!(canonical_name("State_Name"), Some("state_name"));
        assert_eq!(canonical_name("\u{feff}State_Name"), Some("state_name"));
        assert_eq!(canonical_name(" MyNeta_education "), Some("education"));
        assert_eq!(canonical_name("Unrelated_Column"), None);
    }

    #[test]
    fn every_numeric_and_bool_column_is_mapped() {
        for column in NUMERIC_COLUMNS.iter().chain(BOOL_COLUMNS) {
            assert!(
                COLUMN_MAP.iter().any(|(_, canonical)| canonical == column),
                "{column} has no source header"
            );
        }
    }

    #[test]
    fn missing_tokens_are_not_stored() {
        let row = RawRow::from_pairs(&[("party", "NA"), ("gender", "  "), ("votes", "12")]);
        assert_eq!(row.get("party"), None);
        assert_eq!(row.get("gender"), None);
        assert_eq!(row.get("votes"), Some("12"));
    }
}
