//! API Module
//!
//! HTTP handlers and routing for the proxy's REST surface.
//!
//! # Endpoints
//! - `GET /api/games` - Game search
//! - `GET /api/player-stats` - Player season statistics
//! - `GET /api/player-search` - Player search
//! - `GET /api/team-stats` - Team season statistics
//! - `GET /api/matchup` - Head-to-head history
//! - `GET /api/teams` - Team directory
//! - `GET /api/stats` - Proxy cache and request statistics
//! - `GET /api/health` - Health check endpoint
//! - `DELETE /api/cache` - Clear the response caches

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
