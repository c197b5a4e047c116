//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint. Query-string parameters
//! deserialize straight into the typed search structs; validation and
//! caching happen inside the client, so handlers stay thin.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::client::CfbdClient;
use crate::error::Result;
use crate::models::{
    ClearCacheResponse, DataResponse, Game, GameParams, HealthResponse, MatchupParams,
    MatchupResponse, Player, PlayerSearchParams, PlayerStat, PlayerStatParams, StatsResponse,
    Team, TeamParams, TeamStat, TeamStatParams,
};
use crate::query::QueryRegistry;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstream client, including its caches and request counter
    pub client: Arc<CfbdClient>,
    /// Registry of live query stores, for the stats endpoint
    pub registry: Arc<QueryRegistry>,
}

impl AppState {
    pub fn new(client: Arc<CfbdClient>, registry: Arc<QueryRegistry>) -> Self {
        Self { client, registry }
    }
}

/// Handler for GET /api/games
pub async fn games_handler(
    State(state): State<AppState>,
    Query(params): Query<GameParams>,
) -> Result<Json<DataResponse<Game>>> {
    let games = state.client.get_games(&params).await?;
    Ok(Json(DataResponse::new(games, state.client.request_count())))
}

/// Handler for GET /api/player-stats
///
/// Requires a numeric `year` parameter; without it the upstream would
/// return an error page, so the request is rejected with 400 instead.
pub async fn player_stats_handler(
    State(state): State<AppState>,
    Query(params): Query<PlayerStatParams>,
) -> Result<Json<DataResponse<PlayerStat>>> {
    let stats = state.client.get_player_stats(&params).await?;
    Ok(Json(DataResponse::new(stats, state.client.request_count())))
}

/// Handler for GET /api/player-search
///
/// Rejects search terms shorter than two characters with 400. Without a
/// year the client merges results across recent seasons.
pub async fn player_search_handler(
    State(state): State<AppState>,
    Query(params): Query<PlayerSearchParams>,
) -> Result<Json<DataResponse<Player>>> {
    let players = state.client.search_players(&params).await?;
    Ok(Json(DataResponse::new(
        players,
        state.client.request_count(),
    )))
}

/// Handler for GET /api/team-stats
pub async fn team_stats_handler(
    State(state): State<AppState>,
    Query(params): Query<TeamStatParams>,
) -> Result<Json<DataResponse<TeamStat>>> {
    let stats = state.client.get_team_stats(&params).await?;
    Ok(Json(DataResponse::new(stats, state.client.request_count())))
}

/// Handler for GET /api/matchup
pub async fn matchup_handler(
    State(state): State<AppState>,
    Query(params): Query<MatchupParams>,
) -> Result<Json<MatchupResponse>> {
    let matchup = state.client.get_matchup(&params).await?;
    Ok(Json(MatchupResponse {
        data: matchup,
        request_count: state.client.request_count(),
    }))
}

/// Handler for GET /api/teams
pub async fn teams_handler(
    State(state): State<AppState>,
    Query(params): Query<TeamParams>,
) -> Result<Json<DataResponse<Team>>> {
    let teams = state.client.get_teams(&params).await?;
    Ok(Json(DataResponse::new(teams, state.client.request_count())))
}

/// Handler for GET /api/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache_stats = state.client.cache_stats().await;
    Json(StatsResponse {
        request_count: state.client.request_count(),
        cache_entries: state.client.cache_size().await,
        hits: cache_stats.hits,
        misses: cache_stats.misses,
        hit_rate: cache_stats.hit_rate(),
        registered_queries: state.registry.len(),
    })
}

/// Handler for GET /api/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.client.api_key_configured()))
}

/// Handler for DELETE /api/cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    state.client.clear_cache().await;
    Json(ClearCacheResponse::new())
}
