//! Read-only analytical queries over a loaded [`ElectionStore`](crate::store::ElectionStore).

pub mod filters;
pub mod highlights;
pub mod views;

use serde::{Deserialize, Serialize};

pub use filters::{FilterError, QueryFilters};

pub const DEFAULT_TOP_VOTE_SHARE_LIMIT: usize = 5;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const DEFAULT_CLOSE_MARGIN_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterOptions {
    pub years: Vec<i64>,
    pub states: Vec<String>,
    pub parties: Vec<String>,
    pub genders: Vec<String>,
    pub constituencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartySeatShare {
    pub year: i64,
    pub party: String,
    pub seats: i64,
    pub state_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTurnout {
    pub year: i64,
    pub state_name: String,
    pub turnout_pct: f64,
    pub electors: i64,
    pub valid_votes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderRepresentation {
    pub year: i64,
    pub gender: String,
    pub total_candidates: i64,
    pub total_winners: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteShare {
    pub party: String,
    pub year: i64,
    pub total_votes: i64,
    pub vote_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginRecord {
    pub year: i64,
    pub state_name: String,
    pub constituency_name: String,
    pub party: String,
    pub margin: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLookup {
    pub year: i64,
    pub state_name: String,
    pub constituency_name: String,
    pub candidate_name: Option<String>,
    pub party: String,
    pub gender: Option<String>,
    pub position: Option<i64>,
    pub votes: Option<i64>,
    pub margin: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnoutAnswer {
    pub state_name: String,
    pub turnout_pct: f64,
    pub year: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatChangeAnswer {
    pub party: String,
    pub year: i64,
    pub seat_change: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WomenParticipationAnswer {
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseContestAnswer {
    pub constituency_name: String,
    pub state_name: String,
    pub year: i64,
    pub margin: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteShareTrendAnswer {
    pub category: String,
    pub year: i64,
    pub vote_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationWinRateAnswer {
    pub education: String,
    pub win_rate: f64,
}
