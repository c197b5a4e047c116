//! Query Catalog Module
//!
//! Pre-wired query stores over the CFBD client, one constructor per data
//! need, with staleness windows tuned per the volatility of the data:
//! completed seasons barely change, current-week games do.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::client::CfbdClient;
use crate::models::{
    Game, GameParams, MatchupParams, PlayerStat, PlayerStatParams, TeamMatchup, TeamStat,
    TeamStatParams,
};
use crate::query::paginate::{PaginatedQueryStore, DEFAULT_PAGE_SIZE};
use crate::query::registry::QueryRegistry;
use crate::query::store::{QueryFuture, QueryOptions, QueryStore};

/// Team-stats searches page wider than the rest.
const TEAM_STATS_PAGE_SIZE: usize = 18;

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

fn windows(stale_mins: u64, cache_mins: u64) -> QueryOptions {
    QueryOptions {
        stale_time: minutes(stale_mins),
        cache_time: minutes(cache_mins),
        ..QueryOptions::default()
    }
}

/// Parameters for a multi-team game lookup: one upstream call per team,
/// issued sequentially so the rate limiter spaces them deterministically.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiTeamParams {
    pub teams: Vec<String>,
    pub year: String,
    pub week: String,
}

// == Query Catalog ==
pub struct QueryCatalog {
    client: Arc<CfbdClient>,
    registry: Arc<QueryRegistry>,
}

impl QueryCatalog {
    pub fn new(client: Arc<CfbdClient>, registry: Arc<QueryRegistry>) -> Self {
        Self { client, registry }
    }

    pub fn registry(&self) -> &Arc<QueryRegistry> {
        &self.registry
    }

    // == Games ==

    /// Paginated game search over arbitrary filters.
    pub fn games_search(&self) -> PaginatedQueryStore<GameParams, Game> {
        let client = self.client.clone();
        PaginatedQueryStore::new(
            "games:search",
            self.registry.clone(),
            Arc::new(move |params: GameParams| {
                let client = client.clone();
                Box::pin(async move { client.get_games(&params).await }) as QueryFuture<Vec<Game>>
            }),
            DEFAULT_PAGE_SIZE,
            QueryOptions::default(),
        )
    }

    /// Results for several teams in one week, flattened. Teams are fetched
    /// one at a time rather than racing concurrent tasks against the rate
    /// limiter.
    pub fn games_by_teams(&self) -> QueryStore<MultiTeamParams, Vec<Game>> {
        let client = self.client.clone();
        QueryStore::new(
            "games:by-teams",
            self.registry.clone(),
            Arc::new(move |params: MultiTeamParams| {
                let client = client.clone();
                Box::pin(async move {
                    let mut all = Vec::new();
                    for team in &params.teams {
                        let games = client
                            .get_games(&GameParams {
                                year: Some(params.year.clone()),
                                week: Some(params.week.clone()),
                                team: Some(team.clone()),
                                ..Default::default()
                            })
                            .await?;
                        all.extend(games);
                    }
                    Ok(all)
                }) as QueryFuture<Vec<Game>>
            }),
            windows(30, 120),
        )
    }

    /// A team's most recent games, capped at `count`. Callers pass the
    /// season (and team) through the fetch params.
    pub fn recent_games(&self, team: &str, count: usize) -> QueryStore<GameParams, Vec<Game>> {
        let client = self.client.clone();
        QueryStore::new(
            format!("games:recent:{}:{}", team, count),
            self.registry.clone(),
            Arc::new(move |params: GameParams| {
                let client = client.clone();
                Box::pin(async move {
                    let mut games = client.get_games(&params).await?;
                    games.truncate(count);
                    Ok(games)
                }) as QueryFuture<Vec<Game>>
            }),
            windows(5, 15),
        )
    }

    // == Player Stats ==

    pub fn player_stats_search(&self) -> PaginatedQueryStore<PlayerStatParams, PlayerStat> {
        let client = self.client.clone();
        PaginatedQueryStore::new(
            "player-stats:search",
            self.registry.clone(),
            Arc::new(move |params: PlayerStatParams| {
                let client = client.clone();
                Box::pin(async move { client.get_player_stats(&params).await })
                    as QueryFuture<Vec<PlayerStat>>
            }),
            DEFAULT_PAGE_SIZE,
            QueryOptions::default(),
        )
    }

    pub fn player_stats_by_category(
        &self,
        category: &str,
        year: &str,
        team: Option<&str>,
    ) -> QueryStore<PlayerStatParams, Vec<PlayerStat>> {
        let client = self.client.clone();
        QueryStore::new(
            format!(
                "player-stats:by-category:{}:{}:{}",
                category,
                year,
                team.unwrap_or("all")
            ),
            self.registry.clone(),
            Arc::new(move |params: PlayerStatParams| {
                let client = client.clone();
                Box::pin(async move { client.get_player_stats(&params).await })
                    as QueryFuture<Vec<PlayerStat>>
            }),
            windows(5, 10),
        )
    }

    /// Top performers in a category, sorted by stat descending and capped
    /// at `limit`.
    pub fn top_performers(
        &self,
        category: &str,
        year: &str,
        limit: usize,
    ) -> QueryStore<PlayerStatParams, Vec<PlayerStat>> {
        let client = self.client.clone();
        QueryStore::new(
            format!("player-stats:top-performers:{}:{}:{}", category, year, limit),
            self.registry.clone(),
            Arc::new(move |params: PlayerStatParams| {
                let client = client.clone();
                Box::pin(async move {
                    let mut stats = client.get_player_stats(&params).await?;
                    stats.sort_by(|a, b| {
                        b.stat_value()
                            .partial_cmp(&a.stat_value())
                            .unwrap_or(Ordering::Equal)
                    });
                    stats.truncate(limit);
                    Ok(stats)
                }) as QueryFuture<Vec<PlayerStat>>
            }),
            windows(10, 30),
        )
    }

    // == Team Stats ==

    pub fn team_stats_search(&self) -> PaginatedQueryStore<TeamStatParams, TeamStat> {
        let client = self.client.clone();
        PaginatedQueryStore::new(
            "team-stats:search",
            self.registry.clone(),
            Arc::new(move |params: TeamStatParams| {
                let client = client.clone();
                Box::pin(async move { client.get_team_stats(&params).await })
                    as QueryFuture<Vec<TeamStat>>
            }),
            TEAM_STATS_PAGE_SIZE,
            QueryOptions::default(),
        )
    }

    pub fn team_stats_by_team(
        &self,
        team: &str,
        year: &str,
    ) -> QueryStore<TeamStatParams, Vec<TeamStat>> {
        let client = self.client.clone();
        QueryStore::new(
            format!("team-stats:by-team:{}:{}", team, year),
            self.registry.clone(),
            Arc::new(move |params: TeamStatParams| {
                let client = client.clone();
                Box::pin(async move { client.get_team_stats(&params).await })
                    as QueryFuture<Vec<TeamStat>>
            }),
            windows(5, 10),
        )
    }

    pub fn team_stats_by_conference(
        &self,
        conference: &str,
        year: &str,
    ) -> QueryStore<TeamStatParams, Vec<TeamStat>> {
        let client = self.client.clone();
        QueryStore::new(
            format!("team-stats:by-conference:{}:{}", conference, year),
            self.registry.clone(),
            Arc::new(move |params: TeamStatParams| {
                let client = client.clone();
                Box::pin(async move { client.get_team_stats(&params).await })
                    as QueryFuture<Vec<TeamStat>>
            }),
            windows(10, 30),
        )
    }

    // == Matchups ==

    pub fn head_to_head(
        &self,
        team1: &str,
        team2: &str,
    ) -> QueryStore<MatchupParams, TeamMatchup> {
        let client = self.client.clone();
        QueryStore::new(
            format!("matchups:head-to-head:{}:{}", team1, team2),
            self.registry.clone(),
            Arc::new(move |params: MatchupParams| {
                let client = client.clone();
                Box::pin(async move { client.get_matchup(&params).await })
                    as QueryFuture<TeamMatchup>
            }),
            windows(30, 120),
        )
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Transport, TransportResponse};
    use crate::config::Config;
    use crate::error::Result;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct FixedTransport {
        body: Value,
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn get(
            &self,
            _url: &str,
            _query: &[(String, String)],
            _bearer: &str,
            _timeout: Duration,
        ) -> Result<TransportResponse> {
            Ok(TransportResponse {
                status: 200,
                body: self.body.to_string(),
            })
        }
    }

    fn catalog_with(body: Value) -> QueryCatalog {
        let mut config = Config::with_api_key("test-key");
        config.rate_limit_ms = 0;
        let client = Arc::new(CfbdClient::new(&config, Arc::new(FixedTransport { body })));
        QueryCatalog::new(client, Arc::new(QueryRegistry::new()))
    }

    fn player(name: &str, stat: i64) -> Value {
        json!({
            "playerId": stat,
            "player": name,
            "team": "Ohio State",
            "category": "passing",
            "statType": "YDS",
            "stat": stat
        })
    }

    #[tokio::test]
    async fn test_games_search_paginates() {
        let games: Vec<Value> = (0..20)
            .map(|i| {
                json!({
                    "id": i,
                    "season": 2023,
                    "week": 1,
                    "home_team": "A",
                    "away_team": "B",
                    "completed": true
                })
            })
            .collect();
        let catalog = catalog_with(Value::Array(games));

        let search = catalog.games_search();
        let page = search
            .fetch(
                GameParams {
                    year: Some("2023".to_string()),
                    ..Default::default()
                },
                0,
            )
            .await
            .unwrap();

        assert_eq!(page.total, 20);
        assert_eq!(page.items.len(), 16);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn test_top_performers_sorted_and_capped() {
        let catalog = catalog_with(json!([
            player("low", 100),
            player("high", 4000),
            player("mid", 2500),
        ]));

        let store = catalog.top_performers("passing", "2023", 2);
        let stats = store
            .fetch(PlayerStatParams {
                year: Some("2023".to_string()),
                category: Some("passing".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].player, "high");
        assert_eq!(stats[1].player, "mid");
    }

    #[tokio::test]
    async fn test_catalog_stores_register_for_invalidation() {
        let catalog = catalog_with(json!([]));
        let _search = catalog.games_search();
        let _by_team = catalog.team_stats_by_team("Ohio State", "2023");

        let keys = catalog.registry().keys();
        assert!(keys.iter().any(|k| k == "games:search"));
        assert!(keys.iter().any(|k| k.contains("team-stats:by-team")));
    }
}
