/// Every table the loader owns, in creation order.
pub const TABLES: &[&str] = &[
    "candidates",
    "party_seat_summary",
    "state_turnout",
    "gender_representation",
    "party_vote_share",
    "victory_margins",
    "candidate_lookup",
    "party_year_delta",
];

pub const DROP_ALL: &str = r#"
DROP TABLE IF EXISTS party_year_delta;
DROP TABLE IF EXISTS candidate_lookup;
DROP TABLE IF EXISTS victory_margins;
DROP TABLE IF EXISTS party_vote_share;
DROP TABLE IF EXISTS gender_representation;
DROP TABLE IF EXISTS state_turnout;
DROP TABLE IF EXISTS party_seat_summary;
DROP TABLE IF EXISTS candidates;
"#;

pub const CREATE_ALL: &str = r#"
CREATE TABLE candidates (
    year INTEGER NOT NULL,
    state_name TEXT NOT NULL,
    constituency_name TEXT NOT NULL,
    candidate_name TEXT,
    party TEXT NOT NULL,
    gender TEXT NOT NULL,
    position INTEGER,
    votes INTEGER,
    valid_votes INTEGER,
    electors INTEGER,
    turnout_pct REAL NOT NULL,
    vote_share_pct REAL NOT NULL,
    margin INTEGER,
    margin_pct REAL NOT NULL,
    assembly_no INTEGER,
    constituency_no INTEGER,
    month INTEGER,
    poll_no INTEGER,
    delim_id INTEGER,
    num_candidates INTEGER,
    num_terms INTEGER,
    enop REAL,
    candidate_type TEXT,
    constituency_type TEXT,
    sub_region TEXT,
    candidate_id TEXT,
    party_type TEXT,
    party_id TEXT,
    last_party TEXT,
    last_party_id TEXT,
    last_constituency_name TEXT,
    education TEXT NOT NULL,
    profession_main TEXT,
    profession_main_desc TEXT,
    profession_secondary TEXT,
    profession_secondary_desc TEXT,
    election_type TEXT,
    deposit_lost INTEGER NOT NULL,
    last_poll INTEGER,
    contested INTEGER,
    same_constituency INTEGER,
    same_party INTEGER,
    turncoat INTEGER,
    incumbent INTEGER,
    recontest INTEGER,
    is_winner INTEGER NOT NULL,
    party_class TEXT NOT NULL,
    party_category TEXT NOT NULL
);

CREATE TABLE party_seat_summary (
    year INTEGER NOT NULL,
    party TEXT NOT NULL,
    state_name TEXT NOT NULL,
    seats INTEGER NOT NULL
);

CREATE TABLE state_turnout (
    year INTEGER NOT NULL,
    state_name TEXT NOT NULL,
    turnout_pct REAL NOT NULL,
    electors INTEGER NOT NULL,
    valid_votes INTEGER NOT NULL
);

CREATE TABLE gender_representation (
    year INTEGER NOT NULL,
    gender TEXT NOT NULL,
    total_candidates INTEGER NOT NULL,
    total_winners INTEGER NOT NULL
);

CREATE TABLE party_vote_share (
    year INTEGER NOT NULL,
    party TEXT NOT NULL,
    total_votes INTEGER NOT NULL
);

CREATE TABLE victory_margins (
    year INTEGER NOT NULL,
    state_name TEXT NOT NULL,
    constituency_name TEXT NOT NULL,
    party TEXT NOT NULL,
    margin INTEGER
);

CREATE TABLE candidate_lookup (
    year INTEGER NOT NULL,
    state_name TEXT NOT NULL,
    constituency_name TEXT NOT NULL,
    candidate_name TEXT,
    party TEXT NOT NULL,
    gender TEXT NOT NULL,
    position INTEGER,
    votes INTEGER,
    margin INTEGER
);

CREATE TABLE party_year_delta (
    year INTEGER NOT NULL,
    party TEXT NOT NULL,
    seats INTEGER NOT NULL,
    seat_change INTEGER NOT NULL
);
"#;

pub const CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_candidates_year ON candidates(year);
CREATE INDEX IF NOT EXISTS idx_candidates_state ON candidates(state_name);
CREATE INDEX IF NOT EXISTS idx_candidates_party ON candidates(party);
"#;

pub const INSERT_CANDIDATE: &str = r#"
INSERT INTO candidates(
    year, state_name, constituency_name, candidate_name, party, gender, position, votes,
    valid_votes, electors, turnout_pct, vote_share_pct, margin, margin_pct, assembly_no,
    constituency_no, month, poll_no, delim_id, num_candidates, num_terms, enop, candidate_type,
    constituency_type, sub_region, candidate_id, party_type, party_id, last_party, last_party_id,
    last_constituency_name, education, profession_main, profession_main_desc,
    profession_secondary, profession_secondary_desc, election_type, deposit_lost, last_poll,
    contested, same_constituency, same_party, turncoat, incumbent, recontest, is_winner,
    party_class, party_category
) VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
    ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34, ?35, ?36, ?37, ?38,
    ?39, ?40, ?41, ?42, ?43, ?44, ?45, ?46, ?47, ?48
)
"#;
