use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::loader::CandidacyRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatSummaryRow {
    pub year: i64,
    pub party: String,
    pub state_name: String,
    pub seats: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTurnoutRow {
    pub year: i64,
    pub state_name: String,
    pub turnout_pct: f64,
    pub electors: i64,
    pub valid_votes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderRow {
    pub year: i64,
    pub gender: String,
    pub total_candidates: i64,
    pub total_winners: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyVoteRow {
    pub year: i64,
    pub party: String,
    pub total_votes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictoryMarginRow {
    pub year: i64,
    pub state_name: String,
    pub constituency_name: String,
    pub party: String,
    pub margin: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLookupRow {
    pub year: i64,
    pub state_name: String,
    pub constituency_name: String,
    pub candidate_name: Option<String>,
    pub party: String,
    pub gender: String,
    pub position: Option<i64>,
    pub votes: Option<i64>,
    pub margin: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatDeltaRow {
    pub year: i64,
    pub party: String,
    pub seats: i64,
    pub seat_change: i64,
}

/// The cleaned candidacy set together with every table derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub candidates: Vec<CandidacyRecord>,
    pub seat_summary: Vec<SeatSummaryRow>,
    pub state_turnout: Vec<StateTurnoutRow>,
    pub gender_representation: Vec<GenderRow>,
    pub party_vote_share: Vec<PartyVoteRow>,
    pub victory_margins: Vec<VictoryMarginRow>,
    pub candidate_lookup: Vec<CandidateLookupRow>,
    pub seat_delta: Vec<SeatDeltaRow>,
}

impl Dataset {
    pub fn build(candidates: Vec<CandidacyRecord>) -> Self {
        Self {
            seat_summary: seat_summary(&candidates),
            state_turnout: state_turnout(&candidates),
            gender_representation: gender_representation(&candidates),
            party_vote_share: party_vote_share(&candidates),
            victory_margins: victory_margins(&candidates),
            candidate_lookup: candidate_lookup(&candidates),
            seat_delta: seat_delta(&candidates),
            candidates,
        }
    }
}

pub fn seat_summary(records: &[CandidacyRecord]) -> Vec<SeatSummaryRow> {
    let mut counts: BTreeMap<(i64, &str, &str), i64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_winner) {
        *counts
            .entry((
                record.year,
                record.party.as_str(),
                record.state_name.as_str(),
            ))
            .or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((year, party, state_name), seats)| SeatSummaryRow {
            year,
            party: party.to_string(),
            state_name: state_name.to_string(),
            seats,
        })
        .collect()
}

/// Per-state turnout, counting each constituency once per year (first row wins).
pub fn state_turnout(records: &[CandidacyRecord]) -> Vec<StateTurnoutRow> {
    #[derive(Default)]
    struct Acc {
        turnout_sum: f64,
        constituencies: usize,
        electors: i64,
        valid_votes: i64,
    }

    let mut seen: HashSet<(i64, &str, &str)> = HashSet::new();
    let mut groups: BTreeMap<(i64, &str), Acc> = BTreeMap::new();
    for record in records {
        let key = (
            record.year,
            record.state_name.as_str(),
            record.constituency_name.as_str(),
        );
        if !seen.insert(key) {
            continue;
        }
        let acc = groups
            .entry((record.year, record.state_name.as_str()))
            .or_default();
        acc.turnout_sum += record.turnout_pct;
        acc.constituencies += 1;
        acc.electors = acc.electors.saturating_add(record.electors.unwrap_or(0));
        acc.valid_votes = acc.valid_votes.saturating_add(record.valid_votes.unwrap_or(0));
    }
    groups
        .into_iter()
        .map(|((year, state_name), acc)| StateTurnoutRow {
            year,
            state_name: state_name.to_string(),
            turnout_pct: acc.turnout_sum / acc.constituencies as f64,
            electors: acc.electors,
            valid_votes: acc.valid_votes,
        })
        .collect()
}

pub fn gender_representation(records: &[CandidacyRecord]) -> Vec<GenderRow> {
    let mut groups: BTreeMap<(i64, &str), (i64, i64)> = BTreeMap::new();
    for record in records {
        let entry = groups
            .entry((record.year, record.gender.as_str()))
            .or_insert((0, 0));
        entry.0 += 1;
        if record.is_winner {
            entry.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(
            |((year, gender), (total_candidates, total_winners))| GenderRow {
                year,
                gender: gender.to_string(),
                total_candidates,
                total_winners,
            },
        )
        .collect()
}

pub fn party_vote_share(records: &[CandidacyRecord]) -> Vec<PartyVoteRow> {
    let mut totals: BTreeMap<(i64, &str), i64> = BTreeMap::new();
    for record in records {
        let total = totals
            .entry((record.year, record.party.as_str()))
            .or_insert(0);
        *total = total.saturating_add(record.votes.unwrap_or(0));
    }
    totals
        .into_iter()
        .map(|((year, party), total_votes)| PartyVoteRow {
            year,
            party: party.to_string(),
            total_votes,
        })
        .collect()
}

pub fn victory_margins(records: &[CandidacyRecord]) -> Vec<VictoryMarginRow> {
    records
        .iter()
        .filter(|r| r.is_winner)
        .map(|r| VictoryMarginRow {
            year: r.year,
            state_name: r.state_name.clone(),
            constituency_name: r.constituency_name.clone(),
            party: r.party.clone(),
            margin: r.margin,
        })
        .collect()
}

pub fn candidate_lookup(records: &[CandidacyRecord]) -> Vec<CandidateLookupRow> {
    records
        .iter()
        .map(|r| CandidateLookupRow {
            year: r.year,
            state_name: r.state_name.clone(),
            constituency_name: r.constituency_name.clone(),
            candidate_name: r.candidate_name.clone(),
            party: r.party.clone(),
            gender: r.gender.clone(),
            position: r.position,
            votes: r.votes,
            margin: r.margin,
        })
        .collect()
}

/// Year-over-year seat change per party; a party's first year has change 0.
pub fn seat_delta(records: &[CandidacyRecord]) -> Vec<SeatDeltaRow> {
    let mut seats_by_party: BTreeMap<&str, BTreeMap<i64, i64>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_winner) {
        *seats_by_party
            .entry(record.party.as_str())
            .or_default()
            .entry(record.year)
            .or_insert(0) += 1;
    }

    let mut rows = Vec::new();
    for (party, by_year) in seats_by_party {
        let mut previous: Option<i64> = None;
        for (year, seats) in by_year {
            rows.push(SeatDeltaRow {
                year,
                party: party.to_string(),
                seats,
                seat_change: previous.map(|prev| seats.saturating_sub(prev)).unwrap_or(0),
            });
            previous = Some(seats);
        }
    }
    rows.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.party.cmp(&b.party)));
    rows
}
