use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Row, Table};

use crate::query::{
    CandidateLookup, CloseContestAnswer, EducationWinRateAnswer, FilterOptions,
    GenderRepresentation, MarginRecord, PartySeatShare, StateTurnout, VoteShare,
    VoteShareTrendAnswer,
};
use crate::store::TableCount;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

fn number(value: i64) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

fn percent(value: f64) -> Cell {
    Cell::new(format!("{value:.2}%")).set_alignment(CellAlignment::Right)
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_seat_share_table(rows: &[PartySeatShare]) -> String {
    let mut table = new_table(vec!["Year", "State", "Party", "Seats"]);
    for r in rows {
        table.add_row(Row::from(vec![
            number(r.year),
            Cell::new(r.state_name.as_deref().unwrap_or("")),
            Cell::new(&r.party),
            number(r.seats),
        ]));
    }
    table.to_string()
}

pub fn render_turnout_table(rows: &[StateTurnout]) -> String {
    let mut table = new_table(vec!["Year", "State", "Turnout", "Electors", "Valid Votes"]);
    for r in rows {
        table.add_row(Row::from(vec![
            number(r.year),
            Cell::new(&r.state_name),
            percent(r.turnout_pct),
            number(r.electors),
            number(r.valid_votes),
        ]));
    }
    table.to_string()
}

pub fn render_gender_table(rows: &[GenderRepresentation]) -> String {
    let mut table = new_table(vec!["Year", "Gender", "Candidates", "Winners"]);
    for r in rows {
        table.add_row(Row::from(vec![
            number(r.year),
            Cell::new(&r.gender),
            number(r.total_candidates),
            number(r.total_winners),
        ]));
    }
    table.to_string()
}

pub fn render_vote_share_table(rows: &[VoteShare]) -> String {
    let mut table = new_table(vec!["Party", "Year", "Votes", "Vote Share"]);
    for r in rows {
        table.add_row(Row::from(vec![
            Cell::new(&r.party),
            number(r.year),
            number(r.total_votes),
            percent(r.vote_pct),
        ]));
    }
    table.to_string()
}

pub fn render_margin_table(rows: &[MarginRecord]) -> String {
    let mut table = new_table(vec!["Year", "State", "Constituency", "Winner", "Margin"]);
    for r in rows {
        table.add_row(vec![
            r.year.to_string(),
            r.state_name.clone(),
            r.constituency_name.clone(),
            r.party.clone(),
            optional(&r.margin),
        ]);
    }
    table.to_string()
}

pub fn render_search_table(rows: &[CandidateLookup]) -> String {
    let mut table = new_table(vec![
        "Year",
        "State",
        "Constituency",
        "Candidate",
        "Party",
        "Gender",
        "Position",
        "Votes",
        "Margin",
    ]);
    for r in rows {
        let position = match r.position {
            Some(1) => Cell::new("1").fg(Color::Green),
            other => Cell::new(optional(&other)),
        };
        table.add_row(Row::from(vec![
            Cell::new(r.year),
            Cell::new(&r.state_name),
            Cell::new(&r.constituency_name),
            Cell::new(optional(&r.candidate_name)),
            Cell::new(&r.party),
            Cell::new(optional(&r.gender)),
            position,
            Cell::new(optional(&r.votes)),
            Cell::new(optional(&r.margin)),
        ]));
    }
    table.to_string()
}

pub fn render_close_margins_table(rows: &[CloseContestAnswer]) -> String {
    let mut table = new_table(vec!["Constituency", "State", "Year", "Margin"]);
    for r in rows {
        table.add_row(Row::from(vec![
            Cell::new(&r.constituency_name),
            Cell::new(&r.state_name),
            number(r.year),
            number(r.margin),
        ]));
    }
    table.to_string()
}

pub fn render_vote_share_trend_table(rows: &[VoteShareTrendAnswer]) -> String {
    let mut table = new_table(vec!["Year", "Category", "Vote Share"]);
    for r in rows {
        table.add_row(Row::from(vec![
            number(r.year),
            Cell::new(&r.category),
            percent(r.vote_pct),
        ]));
    }
    table.to_string()
}

pub fn render_education_table(rows: &[EducationWinRateAnswer]) -> String {
    let mut table = new_table(vec!["Education", "Win Rate"]);
    for r in rows {
        table.add_row(Row::from(vec![Cell::new(&r.education), percent(r.win_rate)]));
    }
    table.to_string()
}

pub fn render_filter_options(options: &FilterOptions) -> String {
    let mut table = new_table(vec!["Filter", "Values"]);
    let years = options
        .years
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    table.add_row(vec!["Years".to_string(), years]);
    table.add_row(vec!["States".to_string(), options.states.len().to_string()]);
    table.add_row(vec!["Parties".to_string(), options.parties.len().to_string()]);
    table.add_row(vec!["Genders".to_string(), options.genders.join(", ")]);
    table.add_row(vec![
        "Constituencies".to_string(),
        options.constituencies.len().to_string(),
    ]);
    table.to_string()
}

pub fn render_table_counts(counts: &[TableCount]) -> String {
    let mut table = new_table(vec!["Table", "Rows"]);
    for (name, rows) in counts {
        table.add_row(Row::from(vec![Cell::new(name), number(*rows)]));
    }
    table.to_string()
}
