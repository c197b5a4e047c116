//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, games_handler, health_handler, matchup_handler, player_search_handler,
    player_stats_handler, stats_handler, team_stats_handler, teams_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/games` - Game search
/// - `GET /api/player-stats` - Player season statistics (year required)
/// - `GET /api/player-search` - Player search (term of 2+ characters required)
/// - `GET /api/team-stats` - Team season statistics (year required)
/// - `GET /api/matchup` - Head-to-head history (team1 and team2 required)
/// - `GET /api/teams` - Team directory
/// - `GET /api/stats` - Proxy cache and request statistics
/// - `GET /api/health` - Health check endpoint
/// - `DELETE /api/cache` - Clear the response caches
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/api/games", get(games_handler))
        .route("/api/player-stats", get(player_stats_handler))
        .route("/api/player-search", get(player_search_handler))
        .route("/api/team-stats", get(team_stats_handler))
        .route("/api/matchup", get(matchup_handler))
        .route("/api/teams", get(teams_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/health", get(health_handler))
        .route("/api/cache", delete(clear_cache_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
