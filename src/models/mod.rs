//! Data models for the proxy
//!
//! Typed records for the upstream CFBD wire format, typed search parameter
//! structs, and the DTOs served by the internal HTTP surface.

pub mod params;
pub mod records;
pub mod responses;

// Re-export commonly used types
pub use params::{
    GameParams, MatchupParams, PlayerSearchParams, PlayerStatParams, TeamParams, TeamStatParams,
};
pub use records::{Game, MatchupGame, Player, PlayerStat, Team, TeamMatchup, TeamStat};
pub use responses::{
    ClearCacheResponse, DataResponse, ErrorResponse, HealthResponse, MatchupResponse,
    StatsResponse,
};
