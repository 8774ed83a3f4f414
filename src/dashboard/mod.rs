//! Terminal dashboard over the HTTP API: every section is fetched through
//! [`ApiClient`] and rendered independently, so one failing endpoint only
//! blanks its own section.

pub mod cache;
pub mod client;

use anyhow::Result;
use tracing::warn;

use crate::output::table::{
    render_close_margins_table, render_education_table, render_gender_table,
    render_margin_table, render_search_table, render_seat_share_table, render_turnout_table,
    render_vote_share_table, render_vote_share_trend_table,
};
use crate::query::{
    QueryFilters, DEFAULT_CLOSE_MARGIN_LIMIT, DEFAULT_SEARCH_LIMIT, DEFAULT_TOP_VOTE_SHARE_LIMIT,
};

pub use cache::ResponseCache;
pub use client::{ApiClient, StatusError};

const EMPTY_PLACEHOLDER: &str = "No data for the current selection.";

/// What the user picked: shared filters plus an optional search string.
#[derive(Debug, Clone)]
pub struct Selection {
    pub filters: QueryFilters,
    pub search: Option<String>,
    pub top_n: usize,
    pub close_margins: usize,
    pub search_limit: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            filters: QueryFilters::default(),
            search: None,
            top_n: DEFAULT_TOP_VOTE_SHARE_LIMIT,
            close_margins: DEFAULT_CLOSE_MARGIN_LIMIT,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Selection {
    pub fn new(filters: QueryFilters) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }
}

pub async fn render_dashboard(client: &ApiClient, selection: &Selection) -> String {
    let filters = &selection.filters;
    let mut out = String::new();

    heading(&mut out, "Highlights");
    out.push_str(&highlight(
        "Highest turnout",
        client.highest_turnout().await,
        |a| format!("{} ({}), {:.2}%", a.state_name, a.year, a.turnout_pct),
    ));
    out.push_str(&highlight(
        "Biggest seat change",
        client.seat_change().await,
        |a| format!("{} in {}, {:+} seats", a.party, a.year, a.seat_change),
    ));
    out.push_str(&highlight(
        "Women candidates",
        client.women_participation().await,
        |a| format!("{:.2}% of all candidacies", a.percentage),
    ));
    list_section(
        &mut out,
        "Closest Contests",
        client.close_margins(selection.close_margins).await,
        render_close_margins_table,
    );
    list_section(
        &mut out,
        "Vote Share by Party Category",
        client.vote_share_trend().await,
        render_vote_share_trend_table,
    );
    list_section(
        &mut out,
        "Win Rate by Education",
        client.education_win_rate().await,
        render_education_table,
    );

    list_section(
        &mut out,
        "Party Seat Share",
        client.party_seat_share(filters).await,
        render_seat_share_table,
    );
    list_section(
        &mut out,
        "State Turnout",
        client.state_turnout(filters).await,
        render_turnout_table,
    );
    list_section(
        &mut out,
        "Gender Representation",
        client.gender_representation(filters.year).await,
        render_gender_table,
    );

    match vote_share_year(client, filters).await {
        Ok(Some(year)) => list_section(
            &mut out,
            &format!("Top Vote Share ({year})"),
            client.top_vote_share(year, selection.top_n).await,
            render_vote_share_table,
        ),
        Ok(None) => {
            heading(&mut out, "Top Vote Share");
            line(&mut out, EMPTY_PLACEHOLDER);
        }
        Err(error) => {
            heading(&mut out, "Top Vote Share");
            error_line(&mut out, "Top Vote Share", &error);
        }
    }

    list_section(
        &mut out,
        "Victory Margins",
        client.margin_distribution(filters).await,
        render_margin_table,
    );

    if let Some(query) = selection.search.as_deref() {
        list_section(
            &mut out,
            "Candidate Search",
            client.search(query, filters, selection.search_limit).await,
            render_search_table,
        );
    }

    out
}

/// The selected year, else the latest year the API knows about.
async fn vote_share_year(client: &ApiClient, filters: &QueryFilters) -> Result<Option<i64>> {
    if let Some(year) = filters.year {
        return Ok(Some(year));
    }
    let options = client.filters().await?;
    Ok(options.years.iter().max().copied())
}

fn heading(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(&format!("== {title} ==\n"));
}

fn line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

fn error_line(out: &mut String, section: &str, error: &anyhow::Error) {
    warn!("{section} unavailable: {error:#}");
    line(out, &format!("Error: {error:#}"));
}

fn list_section<T>(
    out: &mut String,
    title: &str,
    rows: Result<Vec<T>>,
    render: impl Fn(&[T]) -> String,
) {
    heading(out, title);
    match rows {
        Ok(rows) if rows.is_empty() => line(out, EMPTY_PLACEHOLDER),
        Ok(rows) => line(out, &render(&rows)),
        Err(error) => error_line(out, title, &error),
    }
}

fn highlight<T>(label: &str, answer: Result<T>, describe: impl Fn(&T) -> String) -> String {
    match answer {
        Ok(value) => format!("{label}: {}\n", describe(&value)),
        Err(error) if StatusError::is_not_found(&error) => format!("{label}: no data\n"),
        Err(error) => {
            warn!("{label} unavailable: {error:#}");
            format!("{label}: error: {error:#}\n")
        }
    }
}
