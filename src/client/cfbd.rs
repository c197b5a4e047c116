//! CFBD Client Module
//!
//! Typed endpoint methods over the CollegeFootballData API. Each call strips
//! empty parameters, runs required-field checks before any network activity,
//! consults the TTL cache, and on a miss goes rate limiter -> retrying
//! fetcher -> validator -> cache.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::cache::{BoundedCache, CacheStats, ResponseCache};
use crate::client::fetch::{FetchOptions, RetryingFetcher};
use crate::client::key::RequestKey;
use crate::client::transport::{HttpTransport, Transport};
use crate::client::validate::{decode_array, decode_single};
use crate::client::TEAMS_CACHE_CAPACITY;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    Game, GameParams, MatchupGame, MatchupParams, Player, PlayerSearchParams, PlayerStat,
    PlayerStatParams, Team, TeamMatchup, TeamParams, TeamStat, TeamStatParams,
};

/// Seasons scanned, newest first, when a player search names no year.
const SEARCH_FALLBACK_YEARS: i32 = 4;

/// Cap on merged multi-season player search results.
const MAX_SEARCH_RESULTS: usize = 20;

// == Request Options ==
/// Per-call overrides for timeout, retry budget, and caching.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Extra attempts after the first failed one
    pub retries: u32,
    /// Backoff base for the retry sleeps
    pub backoff_base: Duration,
    /// Whether to consult and populate the response cache
    pub cache: bool,
    /// TTL for the cached response
    pub ttl: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 2,
            backoff_base: Duration::from_secs(1),
            cache: true,
            ttl: Duration::from_millis(crate::client::DEFAULT_CACHE_TTL_MS),
        }
    }
}

impl RequestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_millis(config.request_timeout_ms),
            retries: config.retries,
            backoff_base: Duration::from_secs(1),
            cache: true,
            ttl: Duration::from_millis(config.cache_ttl_ms),
        }
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: self.timeout,
            retries: self.retries,
            backoff_base: self.backoff_base,
        }
    }
}

/// Matchup payload as the upstream serves it; the nested game list is kept
/// raw so it can be validated and filtered independently.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatchup {
    team1: String,
    team2: String,
    start_year: Option<i32>,
    end_year: Option<i32>,
    team1_wins: i32,
    team2_wins: i32,
    ties: i32,
    #[serde(default)]
    games: Vec<Value>,
}

// == CFBD Client ==
/// Explicit client context, constructed once at process start and shared via
/// `Arc`. Holds the fetcher (rate limiter + attempt counter), the TTL
/// response cache, and the bounded teams cache.
pub struct CfbdClient {
    base_url: String,
    api_key: String,
    defaults: RequestOptions,
    fetcher: RetryingFetcher,
    cache: RwLock<ResponseCache>,
    teams_cache: RwLock<BoundedCache<Value>>,
}

impl CfbdClient {
    /// Builds a client over an explicit transport, for embedding and tests.
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            defaults: RequestOptions::from_config(config),
            fetcher: RetryingFetcher::new(transport, Duration::from_millis(config.rate_limit_ms)),
            cache: RwLock::new(ResponseCache::new()),
            teams_cache: RwLock::new(BoundedCache::new(TEAMS_CACHE_CAPACITY)),
        }
    }

    /// Builds a client over the production HTTP transport.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config, Arc::new(HttpTransport::new()))
    }

    // == Endpoint Methods ==

    /// Games list. No required parameters.
    pub async fn get_games(&self, params: &GameParams) -> Result<Vec<Game>> {
        let options = self.defaults.clone();
        self.get_games_with(params, &options).await
    }

    pub async fn get_games_with(
        &self,
        params: &GameParams,
        options: &RequestOptions,
    ) -> Result<Vec<Game>> {
        params.validate()?;
        self.request_list("/games", params.to_query(), options).await
    }

    /// Player season stats. Year is required and checked before the network.
    pub async fn get_player_stats(&self, params: &PlayerStatParams) -> Result<Vec<PlayerStat>> {
        let options = self.defaults.clone();
        self.get_player_stats_with(params, &options).await
    }

    pub async fn get_player_stats_with(
        &self,
        params: &PlayerStatParams,
        options: &RequestOptions,
    ) -> Result<Vec<PlayerStat>> {
        params.validate()?;
        self.request_list("/stats/player/season", params.to_query(), options)
            .await
    }

    /// Team season stats. Year is required and checked before the network.
    pub async fn get_team_stats(&self, params: &TeamStatParams) -> Result<Vec<TeamStat>> {
        let options = self.defaults.clone();
        self.get_team_stats_with(params, &options).await
    }

    pub async fn get_team_stats_with(
        &self,
        params: &TeamStatParams,
        options: &RequestOptions,
    ) -> Result<Vec<TeamStat>> {
        params.validate()?;
        self.request_list("/stats/season", params.to_query(), options)
            .await
    }

    /// Head-to-head matchup: a single aggregate object whose nested game
    /// list is validated and filtered independently. Summary fields come
    /// through as the upstream computed them.
    pub async fn get_matchup(&self, params: &MatchupParams) -> Result<TeamMatchup> {
        let options = self.defaults.clone();
        self.get_matchup_with(params, &options).await
    }

    pub async fn get_matchup_with(
        &self,
        params: &MatchupParams,
        options: &RequestOptions,
    ) -> Result<TeamMatchup> {
        params.validate()?;
        let endpoint = "/teams/matchup";
        let query = params.to_query();
        let key = RequestKey::new(endpoint, &query);

        if options.cache {
            if let Some(cached) = self.cache.write().await.get(&key) {
                debug!(%key, "cache hit");
                return serde_json::from_value(cached)
                    .map_err(|e| ApiError::InvalidPayload(e.to_string()));
            }
        }

        let payload = self.fetch(endpoint, &query, options).await?;
        let raw: RawMatchup = decode_single(endpoint, payload)?;
        let games = decode_array::<MatchupGame>(endpoint, Value::Array(raw.games))?;

        let matchup = TeamMatchup {
            team1: raw.team1,
            team2: raw.team2,
            start_year: raw.start_year,
            end_year: raw.end_year,
            team1_wins: raw.team1_wins,
            team2_wins: raw.team2_wins,
            ties: raw.ties,
            games: games.items,
        };

        if options.cache {
            let value = serde_json::to_value(&matchup)
                .map_err(|e| ApiError::InvalidPayload(e.to_string()))?;
            self.cache.write().await.set(key, value, options.ttl);
        }
        Ok(matchup)
    }

    /// Player search. The term must be at least two characters; with a year
    /// the search hits that season only, without one it scans the most
    /// recent seasons and merges the results.
    pub async fn search_players(&self, params: &PlayerSearchParams) -> Result<Vec<Player>> {
        let options = self.defaults.clone();
        self.search_players_with(params, &options).await
    }

    pub async fn search_players_with(
        &self,
        params: &PlayerSearchParams,
        options: &RequestOptions,
    ) -> Result<Vec<Player>> {
        params.validate()?;

        if params.year.as_deref().unwrap_or("").trim().is_empty() {
            return self.search_players_recent(params, options).await;
        }
        self.request_list("/player/search", params.to_query(), options)
            .await
    }

    /// Year-less search: one request per recent season, each through the
    /// usual cache and rate-limit path. A season that errors is skipped, so
    /// one bad year cannot sink the whole search. Merged results are
    /// de-duplicated, ordered by how well the name matches, and capped.
    async fn search_players_recent(
        &self,
        params: &PlayerSearchParams,
        options: &RequestOptions,
    ) -> Result<Vec<Player>> {
        let current = chrono::Utc::now().year();
        let mut merged: Vec<Player> = Vec::new();

        for offset in 0..SEARCH_FALLBACK_YEARS {
            let year = current - offset;
            let mut season = params.clone();
            season.year = Some(year.to_string());

            match self
                .request_list::<Player>("/player/search", season.to_query(), options)
                .await
            {
                Ok(players) => {
                    debug!(year, found = players.len(), "player search season");
                    merged.extend(players);
                }
                Err(err) => {
                    warn!(year, error = %err, "player search season failed, skipping");
                }
            }
        }

        let mut seen = HashSet::new();
        merged.retain(|player| seen.insert(player.identity()));

        let term = params.term().to_lowercase();
        merged.sort_by(|a, b| {
            relevance_rank(&a.name, &term)
                .cmp(&relevance_rank(&b.name, &term))
                .then_with(|| a.name.cmp(&b.name))
        });
        merged.truncate(MAX_SEARCH_RESULTS);
        Ok(merged)
    }

    /// Teams list, backed by the bounded auxiliary cache rather than the TTL
    /// cache: the roster changes on a yearly cadence.
    pub async fn get_teams(&self, params: &TeamParams) -> Result<Vec<Team>> {
        params.validate()?;
        let endpoint = "/teams";
        let query = params.to_query();
        let key = RequestKey::new(endpoint, &query);

        if let Some(cached) = self.teams_cache.read().await.get(key.as_str()) {
            debug!(%key, "teams cache hit");
            return serde_json::from_value(cached)
                .map_err(|e| ApiError::InvalidPayload(e.to_string()));
        }

        let options = self.defaults.clone();
        let payload = self.fetch(endpoint, &query, &options).await?;
        let decoded = decode_array::<Team>(endpoint, payload)?;
        self.teams_cache
            .write()
            .await
            .set(key.as_str().to_string(), Value::Array(decoded.raw));
        Ok(decoded.items)
    }

    // == Introspection ==

    /// Upstream network attempts made so far, retries included.
    pub fn request_count(&self) -> u64 {
        self.fetcher.request_count()
    }

    /// Whether a bearer token is configured for upstream calls.
    pub fn api_key_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        self.teams_cache.write().await.clear();
        info!("API cache cleared");
    }

    /// Sweeps expired entries out of the response cache, returning how many
    /// were dropped. Driven by the background sweeper task.
    pub async fn sweep_expired(&self) -> usize {
        self.cache.write().await.cleanup_expired()
    }

    // == Internals ==

    async fn request_list<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: BTreeMap<String, String>,
        options: &RequestOptions,
    ) -> Result<Vec<T>> {
        let key = RequestKey::new(endpoint, &query);

        // A hit never touches the limiter, fetcher, or validator.
        if options.cache {
            if let Some(cached) = self.cache.write().await.get(&key) {
                debug!(%key, "cache hit");
                return serde_json::from_value(cached)
                    .map_err(|e| ApiError::InvalidPayload(e.to_string()));
            }
        }

        let payload = self.fetch(endpoint, &query, options).await?;
        let decoded = decode_array::<T>(endpoint, payload)?;

        if options.cache {
            self.cache
                .write()
                .await
                .set(key, Value::Array(decoded.raw), options.ttl);
        }
        Ok(decoded.items)
    }

    async fn fetch(
        &self,
        endpoint: &str,
        query: &BTreeMap<String, String>,
        options: &RequestOptions,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let pairs: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.fetcher
            .fetch_json(&url, &pairs, &self.api_key, &options.fetch_options())
            .await
    }
}

/// Exact name matches sort ahead of partial matches, partial ahead of the
/// rest. `term` must already be lowercased.
fn relevance_rank(name: &str, term: &str) -> u8 {
    let name = name.to_lowercase();
    if name == term {
        0
    } else if name.contains(term) {
        1
    } else {
        2
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::TransportResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Transport that serves a fixed body for every request and records the
    /// query pairs it saw.
    struct FixedTransport {
        body: Value,
        seen: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl FixedTransport {
        fn new(body: Value) -> Self {
            Self {
                body,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn get(
            &self,
            _url: &str,
            query: &[(String, String)],
            _bearer: &str,
            _timeout: Duration,
        ) -> Result<TransportResponse> {
            self.seen.lock().unwrap().push(query.to_vec());
            Ok(TransportResponse {
                status: 200,
                body: self.body.to_string(),
            })
        }
    }

    fn test_config() -> Config {
        let mut config = Config::with_api_key("test-key");
        config.rate_limit_ms = 0;
        config
    }

    fn game(id: i64) -> Value {
        json!({
            "id": id,
            "season": 2023,
            "week": 1,
            "home_team": "Ohio State",
            "away_team": "Indiana",
            "completed": true
        })
    }

    fn client_with_body(body: Value) -> CfbdClient {
        CfbdClient::new(&test_config(), Arc::new(FixedTransport::new(body)))
    }

    #[tokio::test]
    async fn test_games_end_to_end_and_cache_bypass_on_hit() {
        let client = client_with_body(json!([game(1), game(2)]));
        let params = GameParams {
            year: Some("2023".to_string()),
            week: Some("1".to_string()),
            team: Some("Ohio State".to_string()),
            ..Default::default()
        };

        let first = client.get_games(&params).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(client.request_count(), 1);
        assert_eq!(client.cache_size().await, 1);

        // Identical call within the TTL window: no new network attempt.
        let second = client.get_games(&params).await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_param_order_shares_one_cache_entry() {
        let client = client_with_body(json!([game(1)]));

        let params = GameParams {
            year: Some("2023".to_string()),
            team: Some("Ohio State".to_string()),
            ..Default::default()
        };
        client.get_games(&params).await.unwrap();
        client.get_games(&params).await.unwrap();
        assert_eq!(client.cache_size().await, 1);
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_params_do_not_reach_the_wire() {
        let transport = Arc::new(FixedTransport::new(json!([])));
        let client = CfbdClient::new(&test_config(), transport.clone());

        let params = GameParams {
            year: Some("2023".to_string()),
            team: Some("".to_string()),
            ..Default::default()
        };
        client.get_games(&params).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0], vec![("year".to_string(), "2023".to_string())]);
    }

    #[tokio::test]
    async fn test_missing_year_short_circuits_before_network() {
        let client = client_with_body(json!([]));
        let result = client
            .get_player_stats(&PlayerStatParams::default())
            .await;

        assert!(matches!(result, Err(ApiError::MissingParam("year"))));
        assert_eq!(client.request_count(), 0, "no network attempt expected");
    }

    #[tokio::test]
    async fn test_team_stats_require_year_too() {
        let client = client_with_body(json!([]));
        let result = client.get_team_stats(&TeamStatParams::default()).await;
        assert!(matches!(result, Err(ApiError::MissingParam("year"))));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_items_are_dropped_not_fatal() {
        let client = client_with_body(json!([game(1), {"bogus": true}]));
        let params = GameParams {
            year: Some("2023".to_string()),
            ..Default::default()
        };

        let games = client.get_games(&params).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, 1);
    }

    #[tokio::test]
    async fn test_matchup_filters_nested_games() {
        let client = client_with_body(json!({
            "team1": "Ohio State",
            "team2": "Michigan",
            "startYear": 1897,
            "endYear": 2023,
            "team1Wins": 51,
            "team2Wins": 62,
            "ties": 6,
            "games": [
                {
                    "season": 2023,
                    "homeTeam": "Michigan",
                    "awayTeam": "Ohio State",
                    "homeScore": 30,
                    "awayScore": 24
                },
                {"junk": 1}
            ]
        }));

        let params = MatchupParams {
            team1: Some("Ohio State".to_string()),
            team2: Some("Michigan".to_string()),
            ..Default::default()
        };
        let matchup = client.get_matchup(&params).await.unwrap();

        assert_eq!(matchup.games.len(), 1);
        // Summary fields are not recomputed over the filtered list.
        assert_eq!(matchup.team1_wins, 51);
        assert_eq!(matchup.team2_wins, 62);

        // Cached: a second call makes no new attempt.
        let again = client.get_matchup(&params).await.unwrap();
        assert_eq!(again.games.len(), 1);
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_matchup_requires_both_teams() {
        let client = client_with_body(json!({}));
        let params = MatchupParams {
            team1: Some("Ohio State".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            client.get_matchup(&params).await,
            Err(ApiError::MissingParam("team2"))
        ));
        assert_eq!(client.request_count(), 0);
    }

    fn player(id: i64, name: &str, team: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "team": team,
            "position": "WR"
        })
    }

    #[tokio::test]
    async fn test_player_search_specific_year_is_one_request() {
        let transport = Arc::new(FixedTransport::new(json!([player(1, "Marvin Harrison", "Ohio State")])));
        let client = CfbdClient::new(&test_config(), transport.clone());

        let params = PlayerSearchParams {
            search_term: Some("Harrison".to_string()),
            year: Some("2023".to_string()),
            ..Default::default()
        };
        let players = client.search_players(&params).await.unwrap();

        assert_eq!(players.len(), 1);
        assert_eq!(client.request_count(), 1);
        let seen = transport.seen.lock().unwrap();
        assert!(seen[0].contains(&("searchTerm".to_string(), "Harrison".to_string())));
        assert!(seen[0].contains(&("year".to_string(), "2023".to_string())));
    }

    #[tokio::test]
    async fn test_player_search_without_year_scans_recent_seasons() {
        // The same body for every season: the merge must de-duplicate.
        let client = client_with_body(json!([
            player(1, "Marvin Harrison", "Ohio State"),
            player(2, "Aaron Marvin Harrison", "Texas"),
        ]));

        let params = PlayerSearchParams {
            search_term: Some("Marvin Harrison".to_string()),
            ..Default::default()
        };
        let players = client.search_players(&params).await.unwrap();

        assert_eq!(client.request_count(), 4, "one request per recent season");
        assert_eq!(players.len(), 2, "duplicates across seasons collapse");
        // Exact name match ranks ahead of a partial match.
        assert_eq!(players[0].name, "Marvin Harrison");
    }

    #[tokio::test]
    async fn test_player_search_rejects_short_term() {
        let client = client_with_body(json!([]));
        let params = PlayerSearchParams {
            search_term: Some("x".to_string()),
            ..Default::default()
        };

        let result = client.search_players(&params).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
        assert_eq!(client.request_count(), 0, "no network attempt expected");
    }

    #[tokio::test]
    async fn test_teams_served_from_bounded_cache() {
        let client = client_with_body(json!([{"id": 1, "school": "Ohio State"}]));
        let params = TeamParams {
            division: Some("fbs".to_string()),
            ..Default::default()
        };

        let first = client.get_teams(&params).await.unwrap();
        let second = client.get_teams(&params).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second[0].school, "Ohio State");
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let client = client_with_body(json!([game(1)]));
        let params = GameParams {
            year: Some("2023".to_string()),
            ..Default::default()
        };

        client.get_games(&params).await.unwrap();
        client.clear_cache().await;
        assert_eq!(client.cache_size().await, 0);

        client.get_games(&params).await.unwrap();
        assert_eq!(client.request_count(), 2);
    }

    #[tokio::test]
    async fn test_cache_disabled_always_fetches() {
        let client = client_with_body(json!([game(1)]));
        let params = GameParams {
            year: Some("2023".to_string()),
            ..Default::default()
        };
        let options = RequestOptions {
            cache: false,
            ..RequestOptions::default()
        };

        client.get_games_with(&params, &options).await.unwrap();
        client.get_games_with(&params, &options).await.unwrap();
        assert_eq!(client.request_count(), 2);
        assert_eq!(client.cache_size().await, 0);
    }
}
