use std::collections::HashSet;

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("invalid value for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{0} is required")]
    MissingRequired(&'static str),
    #[error("Query parameter cannot be empty.")]
    EmptySearch,
    #[error("Query must be at least {0} characters.")]
    SearchTooShort(usize),
}

/// Optional, AND-combined constraints shared by the filterable queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    pub year: Option<i64>,
    pub state: Option<String>,
    #[serde(default)]
    pub parties: Vec<String>,
    pub gender: Option<String>,
    pub constituency: Option<String>,
}

impl QueryFilters {
    pub fn year(year: i64) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_party(mut self, party: impl Into<String>) -> Self {
        self.parties.push(party.into());
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_constituency(mut self, constituency: impl Into<String>) -> Self {
        self.constituency = Some(constituency.into());
        self
    }

    /// Builds filters from raw query-string pairs. `party` and `parties` may repeat
    /// or carry comma-separated lists; blank values impose no constraint.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, FilterError> {
        let mut filters = Self::default();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "year" => filters.year = Some(parse_i64("year", value)?),
                "state" => filters.state = Some(value.to_string()),
                "gender" => filters.gender = Some(value.to_string()),
                "constituency" => filters.constituency = Some(value.to_string()),
                "party" | "parties" => filters.parties.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string),
                ),
                _ => {}
            }
        }
        let mut seen = HashSet::new();
        filters.parties.retain(|party| seen.insert(party.clone()));
        Ok(filters)
    }
}

pub fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, v)| k == key && !v.trim().is_empty())
        .map(|(_, v)| v.trim())
}

pub fn parse_limit(
    pairs: &[(String, String)],
    default: usize,
) -> Result<usize, FilterError> {
    let Some(raw) = param(pairs, "limit") else {
        return Ok(default);
    };
    raw.parse::<usize>()
        .ok()
        .filter(|limit| i64::try_from(*limit).is_ok())
        .ok_or_else(|| FilterError::InvalidNumber {
            field: "limit",
            value: raw.to_string(),
        })
}

/// `limit` as an SQLite integer, clamped to `i64::MAX`.
pub fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

pub fn parse_i64(field: &'static str, raw: &str) -> Result<i64, FilterError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| FilterError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

/// Validates a free-text search string, returning it trimmed.
pub fn validate_search(query: Option<&str>, min_chars: usize) -> Result<String, FilterError> {
    let trimmed = query.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(FilterError::EmptySearch);
    }
    if trimmed.chars().count() < min_chars {
        return Err(FilterError::SearchTooShort(min_chars));
    }
    Ok(trimmed.to_string())
}

/// Accumulates `WHERE` predicates with positional parameters.
#[derive(Debug, Default)]
pub(crate) struct SqlFilter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl SqlFilter {
    pub fn from_filters(filters: &QueryFilters, columns: &FilterColumns) -> Self {
        let mut sql = Self::default();
        sql.apply(filters, columns);
        sql
    }

    pub fn apply(&mut self, filters: &QueryFilters, columns: &FilterColumns) {
        if let (Some(year), Some(column)) = (filters.year, columns.year) {
            self.eq(column, Value::Integer(year));
        }
        if let (Some(state), Some(column)) = (&filters.state, columns.state) {
            self.eq(column, Value::Text(state.clone()));
        }
        if let Some(column) = columns.party {
            self.any_of(column, &filters.parties);
        }
        if let (Some(gender), Some(column)) = (&filters.gender, columns.gender) {
            self.eq(column, Value::Text(gender.clone()));
        }
        if let (Some(constituency), Some(column)) = (&filters.constituency, columns.constituency)
        {
            self.eq(column, Value::Text(constituency.clone()));
        }
    }

    pub fn eq(&mut self, column: &str, value: Value) {
        self.values.push(value);
        self.clauses
            .push(format!("{column} = ?{}", self.values.len()));
    }

    pub fn any_of(&mut self, column: &str, values: &[String]) {
        if values.is_empty() {
            return;
        }
        let mut placeholders = Vec::with_capacity(values.len());
        for value in values {
            self.values.push(Value::Text(value.clone()));
            placeholders.push(format!("?{}", self.values.len()));
        }
        self.clauses
            .push(format!("{column} IN ({})", placeholders.join(", ")));
    }

    /// Adds a clause in which every `{}` refers to `value`.
    pub fn raw(&mut self, template: &str, value: Value) {
        self.values.push(value);
        self.clauses
            .push(template.replace("{}", &format!("?{}", self.values.len())));
    }

    pub fn fixed(&mut self, clause: &str) {
        self.clauses.push(clause.to_string());
    }

    /// Registers a trailing value (e.g. a LIMIT) and returns its placeholder.
    pub fn bind(&mut self, value: Value) -> String {
        self.values.push(value);
        format!("?{}", self.values.len())
    }

    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Column names a given table uses for each filter; `None` means the filter is ignored.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FilterColumns {
    pub year: Option<&'static str>,
    pub state: Option<&'static str>,
    pub party: Option<&'static str>,
    pub gender: Option<&'static str>,
    pub constituency: Option<&'static str>,
}

impl FilterColumns {
    pub const ALL: Self = Self {
        year: Some("year"),
        state: Some("state_name"),
        party: Some("party"),
        gender: Some("gender"),
        constituency: Some("constituency_name"),
    };

    pub const YEAR_STATE: Self = Self {
        year: Some("year"),
        state: Some("state_name"),
        party: None,
        gender: None,
        constituency: None,
    };

    pub const MARGINS: Self = Self {
        year: Some("year"),
        state: Some("state_name"),
        party: None,
        gender: None,
        constituency: Some("constituency_name"),
    };
}

/// Escapes LIKE wildcards so user text matches literally (with `ESCAPE '\'`).
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
