//! Upstream record types
//!
//! Typed counterparts of the CFBD wire format. Deserialization of these types
//! at the network boundary is what stands in for runtime shape predicates:
//! an item that fails to decode is dropped by the validator, never an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One game from the `/games` endpoint.
///
/// Fields without a default are the shape contract: a payload item missing
/// any of them does not count as a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub season: i32,
    pub week: i32,
    pub season_type: Option<String>,
    pub start_date: Option<String>,
    pub neutral_site: Option<bool>,
    pub conference_game: Option<bool>,
    pub attendance: Option<i64>,
    pub venue: Option<String>,
    pub home_team: String,
    pub home_conference: Option<String>,
    pub home_points: Option<i32>,
    pub away_team: String,
    pub away_conference: Option<String>,
    pub away_points: Option<i32>,
    pub excitement_index: Option<f64>,
    pub completed: bool,
}

/// One row from the `/stats/player/season` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStat {
    pub player_id: i64,
    pub player: String,
    pub team: String,
    pub conference: Option<String>,
    pub category: String,
    pub stat_type: String,
    pub stat: Value,
    pub season: Option<i32>,
    pub season_type: Option<String>,
}

impl PlayerStat {
    /// Numeric view of `stat`, which the upstream serves as either a number
    /// or a numeric string.
    pub fn stat_value(&self) -> f64 {
        match &self.stat {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

/// One row from the `/stats/season` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStat {
    pub team: String,
    pub conference: Option<String>,
    pub stat_name: String,
    pub stat_value: Value,
    pub season: Option<i32>,
    pub season_type: Option<String>,
}

/// One player from the `/player/search` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub team: Option<String>,
    pub position: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub jersey: Option<i32>,
    pub height: Option<i32>,
    pub weight: Option<i32>,
    pub hometown: Option<String>,
}

impl Player {
    /// Identity for de-duplicating results merged across seasons.
    pub fn identity(&self) -> (String, Option<String>, Option<String>) {
        (
            self.name.clone(),
            self.team.clone(),
            self.position.clone(),
        )
    }
}

/// One team from the `/teams` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub school: String,
    pub mascot: Option<String>,
    pub abbreviation: Option<String>,
    pub conference: Option<String>,
    pub division: Option<String>,
    pub color: Option<String>,
    pub logos: Option<Vec<String>>,
}

/// One game inside a head-to-head matchup response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupGame {
    pub season: i32,
    pub week: Option<i32>,
    pub season_type: Option<String>,
    pub date: Option<String>,
    pub neutral_site: Option<bool>,
    pub venue: Option<String>,
    pub home_team: String,
    pub home_score: Option<i32>,
    pub away_team: String,
    pub away_score: Option<i32>,
    pub winner: Option<String>,
}

/// Head-to-head matchup from the `/teams/matchup` endpoint.
///
/// The summary fields (win counts, year range) are carried through as the
/// upstream computed them, even though the nested game list is filtered to
/// decodable games. Recomputing the summary over a filtered or year-limited
/// game list is the caller's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMatchup {
    pub team1: String,
    pub team2: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub team1_wins: i32,
    pub team2_wins: i32,
    pub ties: i32,
    pub games: Vec<MatchupGame>,
}
