//! Search parameter structs
//!
//! Each endpoint takes a typed parameter object. `to_query` strips empty
//! values so they never reach the wire or the cache key, and every struct
//! validates what the route boundary used to validate (numeric years and
//! weeks, required fields).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// Pushes a parameter into the map unless it is absent or empty.
fn push(map: &mut BTreeMap<String, String>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        if !v.is_empty() {
            map.insert(key.to_string(), v.clone());
        }
    }
}

/// Rejects non-numeric values for parameters the upstream expects as numbers.
fn check_numeric(name: &'static str, value: &Option<String>) -> Result<()> {
    if let Some(v) = value {
        if !v.is_empty() && v.parse::<i64>().is_err() {
            return Err(ApiError::InvalidRequest(format!(
                "Invalid {} parameter: {}",
                name, v
            )));
        }
    }
    Ok(())
}

/// Parameters for the `/games` endpoint. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameParams {
    pub year: Option<String>,
    pub week: Option<String>,
    pub team: Option<String>,
    pub home: Option<String>,
    pub away: Option<String>,
    pub conference: Option<String>,
    pub division: Option<String>,
    pub id: Option<String>,
    pub season_type: Option<String>,
}

impl GameParams {
    pub fn validate(&self) -> Result<()> {
        check_numeric("year", &self.year)?;
        check_numeric("week", &self.week)
    }

    pub fn to_query(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        push(&mut map, "year", &self.year);
        push(&mut map, "week", &self.week);
        push(&mut map, "team", &self.team);
        push(&mut map, "home", &self.home);
        push(&mut map, "away", &self.away);
        push(&mut map, "conference", &self.conference);
        push(&mut map, "division", &self.division);
        push(&mut map, "id", &self.id);
        push(&mut map, "seasonType", &self.season_type);
        map
    }
}

/// Parameters for the `/stats/player/season` endpoint. Year is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStatParams {
    pub year: Option<String>,
    pub team: Option<String>,
    pub conference: Option<String>,
    pub start_week: Option<String>,
    pub end_week: Option<String>,
    pub category: Option<String>,
    pub season_type: Option<String>,
}

impl PlayerStatParams {
    pub fn validate(&self) -> Result<()> {
        if self.year.as_deref().unwrap_or("").is_empty() {
            return Err(ApiError::MissingParam("year"));
        }
        check_numeric("year", &self.year)?;
        check_numeric("startWeek", &self.start_week)?;
        check_numeric("endWeek", &self.end_week)
    }

    pub fn to_query(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        push(&mut map, "year", &self.year);
        push(&mut map, "team", &self.team);
        push(&mut map, "conference", &self.conference);
        push(&mut map, "startWeek", &self.start_week);
        push(&mut map, "endWeek", &self.end_week);
        push(&mut map, "category", &self.category);
        push(&mut map, "seasonType", &self.season_type);
        map
    }
}

/// Parameters for the `/stats/season` endpoint. Year is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamStatParams {
    pub year: Option<String>,
    pub team: Option<String>,
    pub conference: Option<String>,
    pub start_week: Option<String>,
    pub end_week: Option<String>,
}

impl TeamStatParams {
    pub fn validate(&self) -> Result<()> {
        if self.year.as_deref().unwrap_or("").is_empty() {
            return Err(ApiError::MissingParam("year"));
        }
        check_numeric("year", &self.year)?;
        check_numeric("startWeek", &self.start_week)?;
        check_numeric("endWeek", &self.end_week)
    }

    pub fn to_query(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        push(&mut map, "year", &self.year);
        push(&mut map, "team", &self.team);
        push(&mut map, "conference", &self.conference);
        push(&mut map, "startWeek", &self.start_week);
        push(&mut map, "endWeek", &self.end_week);
        map
    }
}

/// Parameters for the `/teams/matchup` endpoint. Both teams are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchupParams {
    pub team1: Option<String>,
    pub team2: Option<String>,
    pub min_year: Option<String>,
    pub max_year: Option<String>,
}

impl MatchupParams {
    pub fn validate(&self) -> Result<()> {
        if self.team1.as_deref().unwrap_or("").is_empty() {
            return Err(ApiError::MissingParam("team1"));
        }
        if self.team2.as_deref().unwrap_or("").is_empty() {
            return Err(ApiError::MissingParam("team2"));
        }
        check_numeric("minYear", &self.min_year)?;
        check_numeric("maxYear", &self.max_year)
    }

    pub fn to_query(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        push(&mut map, "team1", &self.team1);
        push(&mut map, "team2", &self.team2);
        push(&mut map, "minYear", &self.min_year);
        push(&mut map, "maxYear", &self.max_year);
        map
    }
}

/// Parameters for the `/player/search` endpoint. The search term must be at
/// least two characters after trimming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerSearchParams {
    pub search_term: Option<String>,
    pub team: Option<String>,
    pub position: Option<String>,
    pub year: Option<String>,
}

impl PlayerSearchParams {
    pub fn validate(&self) -> Result<()> {
        if self.search_term.as_deref().unwrap_or("").trim().len() < 2 {
            return Err(ApiError::InvalidRequest(
                "Search term must be at least 2 characters long".to_string(),
            ));
        }
        check_numeric("year", &self.year)
    }

    /// The trimmed search term. Only meaningful after `validate`.
    pub fn term(&self) -> &str {
        self.search_term.as_deref().unwrap_or("").trim()
    }

    pub fn to_query(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if !self.term().is_empty() {
            map.insert("searchTerm".to_string(), self.term().to_string());
        }
        push(&mut map, "team", &self.team);
        push(&mut map, "position", &self.position);
        push(&mut map, "year", &self.year);
        map
    }
}

/// Parameters for the `/teams` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamParams {
    pub division: Option<String>,
    pub year: Option<String>,
}

impl TeamParams {
    pub fn validate(&self) -> Result<()> {
        check_numeric("year", &self.year)
    }

    pub fn to_query(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        push(&mut map, "division", &self.division);
        push(&mut map, "year", &self.year);
        map
    }
}
