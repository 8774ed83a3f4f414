use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::dashboard::cache::ResponseCache;
use crate::query::{
    CandidateLookup, CloseContestAnswer, EducationWinRateAnswer, FilterOptions,
    GenderRepresentation, MarginRecord, PartySeatShare, QueryFilters, SeatChangeAnswer,
    StateTurnout, TurnoutAnswer, VoteShare, VoteShareTrendAnswer, WomenParticipationAnswer,
};

const CONNECT_TIMEOUT_SECS: u64 = 6;
/// Searches shorter than this are answered locally with no results.
pub const MIN_SEARCH_CHARS: usize = 3;

/// Non-2xx answer from the API, with the start of its body.
#[derive(Debug, Error)]
#[error("GET {url} returned {status}: {preview}")]
pub struct StatusError {
    pub url: String,
    pub status: StatusCode,
    pub preview: String,
}

impl StatusError {
    pub fn is_not_found(error: &anyhow::Error) -> bool {
        error
            .downcast_ref::<StatusError>()
            .is_some_and(|e| e.status == StatusCode::NOT_FOUND)
    }
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    cache: ResponseCache,
}

impl ApiClient {
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("election-insights/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            cache: ResponseCache::new(Duration::from_secs(config.cache_ttl_secs)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GETs `path` with `params`, serving repeat calls from the cache until they expire.
    pub async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let key = ResponseCache::key(path, params);
        if let Some(body) = self.cache.get(&key) {
            debug!("cache hit for {key}");
            return Ok(body);
        }

        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .with_context(|| format!("failed GET request: {url}"))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed reading response body: {url}"))?;
        if !status.is_success() {
            let preview: String = body.chars().take(180).collect();
            return Err(StatusError {
                url,
                status,
                preview,
            }
            .into());
        }
        let value: Value =
            serde_json::from_str(&body).with_context(|| format!("invalid JSON response: {url}"))?;
        self.cache.put(key, value.clone());
        Ok(value)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        let value = self.get_json(path, params).await?;
        serde_json::from_value(value).with_context(|| format!("unexpected payload from {path}"))
    }

    pub async fn filters(&self) -> Result<FilterOptions> {
        self.fetch("/filters", &[]).await
    }

    pub async fn party_seat_share(&self, filters: &QueryFilters) -> Result<Vec<PartySeatShare>> {
        self.fetch("/party-seat-share", &filter_params(filters)).await
    }

    pub async fn state_turnout(&self, filters: &QueryFilters) -> Result<Vec<StateTurnout>> {
        self.fetch("/state-turnout", &filter_params(filters)).await
    }

    pub async fn gender_representation(
        &self,
        year: Option<i64>,
    ) -> Result<Vec<GenderRepresentation>> {
        let params: Vec<(String, String)> = year
            .map(|y| vec![("year".to_string(), y.to_string())])
            .unwrap_or_default();
        self.fetch("/gender-representation", &params).await
    }

    pub async fn top_vote_share(&self, year: i64, limit: usize) -> Result<Vec<VoteShare>> {
        let params = vec![
            ("year".to_string(), year.to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        self.fetch("/top-vote-share", &params).await
    }

    pub async fn margin_distribution(&self, filters: &QueryFilters) -> Result<Vec<MarginRecord>> {
        self.fetch("/margin-distribution", &filter_params(filters))
            .await
    }

    pub async fn search(
        &self,
        query: &str,
        filters: &QueryFilters,
        limit: usize,
    ) -> Result<Vec<CandidateLookup>> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Ok(Vec::new());
        }
        let mut params = vec![("query".to_string(), query.to_string())];
        params.extend(filter_params(filters));
        params.push(("limit".to_string(), limit.to_string()));
        self.fetch("/search", &params).await
    }

    pub async fn highest_turnout(&self) -> Result<TurnoutAnswer> {
        self.fetch("/analytics/highest-turnout", &[]).await
    }

    pub async fn seat_change(&self) -> Result<SeatChangeAnswer> {
        self.fetch("/analytics/seat-change", &[]).await
    }

    pub async fn women_participation(&self) -> Result<WomenParticipationAnswer> {
        self.fetch("/analytics/women-participation", &[]).await
    }

    pub async fn close_margins(&self, limit: usize) -> Result<Vec<CloseContestAnswer>> {
        let params = vec![("limit".to_string(), limit.to_string())];
        self.fetch("/analytics/close-margins", &params).await
    }

    pub async fn vote_share_trend(&self) -> Result<Vec<VoteShareTrendAnswer>> {
        self.fetch("/analytics/vote-share-trend", &[]).await
    }

    pub async fn education_win_rate(&self) -> Result<Vec<EducationWinRateAnswer>> {
        self.fetch("/analytics/education-win-rate", &[]).await
    }
}

/// Query-string pairs for `filters`; each party becomes its own `parties` pair.
pub fn filter_params(filters: &QueryFilters) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(year) = filters.year {
        params.push(("year".to_string(), year.to_string()));
    }
    if let Some(state) = &filters.state {
        params.push(("state".to_string(), state.clone()));
    }
    for party in &filters.parties {
        params.push(("parties".to_string(), party.clone()));
    }
    if let Some(gender) = &filters.gender {
        params.push(("gender".to_string(), gender.clone()));
    }
    if let Some(constituency) = &filters.constituency {
        params.push(("constituency".to_string(), constituency.clone()));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> ApiClient {
        ApiClient::from_config(&DashboardConfig {
            api_url: "http://127.0.0.1:1/".to_string(),
            cache_ttl_secs: 600,
            timeout_secs: 2,
        })
        .expect("client")
    }

    #[test]
    fn filter_params_repeat_parties() {
        let filters = QueryFilters::year(2014)
            .with_party("BJP")
            .with_party("INC")
            .with_state("Goa");
        let params = filter_params(&filters);
        assert_eq!(
            params,
            vec![
                ("year".to_string(), "2014".to_string()),
                ("state".to_string(), "Goa".to_string()),
                ("parties".to_string(), "BJP".to_string()),
                ("parties".to_string(), "INC".to_string()),
            ]
        );
        assert!(filter_params(&QueryFilters::default()).is_empty());
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        assert_eq!(unreachable_client().base_url(), "http://127.0.0.1:1");
    }

    #[test]
    fn short_search_skips_the_request() {
        let client = unreachable_client();
        let rows = tokio_test::block_on(client.search(" ab ", &QueryFilters::default(), 20))
            .expect("no request issued");
        assert!(rows.is_empty());
    }

    #[test]
    fn not_found_is_recognised_through_context() {
        let err: anyhow::Error = StatusError {
            url: "http://localhost/analytics/seat-change".to_string(),
            status: StatusCode::NOT_FOUND,
            preview: "{\"detail\":\"No data available.\"}".to_string(),
        }
        .into();
        let err = err.context("loading highlights");
        assert!(StatusError::is_not_found(&err));
        assert!(!StatusError::is_not_found(&anyhow::anyhow!("timeout")));
    }

    #[tokio::test]
    async fn failed_requests_are_not_cached() {
        let client = unreachable_client();
        assert!(client.get_json("/filters", &[]).await.is_err());
        assert!(client.cache.is_empty());
    }
}
