use std::collections::BTreeMap;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

use crate::backend::CalculationBackend;
use crate::config::FilterConfig;
use crate::core::{
    CalcError, CalculationResults, LeaderboardKind, ProjectStat, SeasonConfig,
};
use crate::offchain::OffchainMerger;
use crate::query::{compose_season, ComposedQuery, SqlValue};

pub const BACKEND_APPS: &str = "apps";

/// App leaderboard: weighted transaction volume and qualified-user counts
/// per project, enriched with off-chain engagement metrics.
pub struct AppLeaderboardBackend {
    filters: FilterConfig,
}

impl AppLeaderboardBackend {
    pub fn new(filters: FilterConfig) -> Self {
        Self { filters }
    }

    async fn execute(
        &self,
        pool: &SqlitePool,
        query: &ComposedQuery,
    ) -> Result<BTreeMap<String, ProjectStat>, CalcError> {
        let rows = bind_all(sqlx::query(&query.sql), &query.binds)
            .fetch_all(pool)
            .await?;
        let mut decoded = Vec::with_capacity(rows.len());
        for row in &rows {
            decoded.push((
                row.get::<String, _>("project"),
                row.get::<i64, _>("tx_count"),
                row.get::<i64, _>("total_users"),
            ));
        }
        fold_ranking(decoded)
    }

    async fn explain(&self, pool: &SqlitePool, query: &ComposedQuery) -> Result<(), CalcError> {
        let sql = format!("explain query plan {}", query.sql);
        let rows = bind_all(sqlx::query(&sql), &query.binds)
            .fetch_all(pool)
            .await?;
        for row in &rows {
            debug!("Query plan: {}", row.get::<String, _>("detail"));
        }
        Ok(())
    }
}

#[async_trait]
impl CalculationBackend for AppLeaderboardBackend {
    fn name(&self) -> &str {
        "App leaderboard"
    }

    fn leaderboards(&self) -> &[LeaderboardKind] {
        &[LeaderboardKind::Apps]
    }

    async fn calculate(
        &self,
        pool: &SqlitePool,
        config: &SeasonConfig,
        dry_run: bool,
    ) -> Result<CalculationResults, CalcError> {
        info!(
            "Running app leaderboard query composition for season {}",
            config.name
        );
        let started = Instant::now();
        let composed = compose_season(config, &self.filters, BACKEND_APPS)?;

        let mut results = BTreeMap::new();
        match composed {
            None => {
                warn!(
                    "Season {} composed no activity query, returning empty ranking",
                    config.name
                );
            }
            Some(query) => {
                debug!("Generated SQL: {}", query.sql);
                if dry_run {
                    info!("Running query in dry_run mode");
                    self.explain(pool, &query).await?;
                } else {
                    info!("Running query in production mode");
                    results = self.execute(pool, &query).await?;
                    info!("Main query finished");
                    OffchainMerger::new(pool).merge(config, &mut results).await?;
                }
            }
        }

        Ok(CalculationResults {
            ranking: results.into_values().collect(),
            build_time_ms: started.elapsed().as_millis() as u64,
            calculated_at: Utc::now(),
        })
    }
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    binds: &'q [SqlValue],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    for value in binds {
        query = match value {
            SqlValue::Text(text) => query.bind(text.as_str()),
            SqlValue::Int(int) => query.bind(*int),
        };
    }
    query
}

/// Folds on-chain result rows into a per-project map. A repeated project key
/// is a data-integrity violation and aborts the run.
fn fold_ranking(
    rows: Vec<(String, i64, i64)>,
) -> Result<BTreeMap<String, ProjectStat>, CalcError> {
    let mut results = BTreeMap::new();
    for (project, tx_count, total_users) in rows {
        if results.contains_key(&project) {
            return Err(CalcError::DuplicateProjectKey { project });
        }
        let mut metrics = BTreeMap::new();
        metrics.insert("tx_count".to_string(), tx_count);
        metrics.insert("total_users".to_string(), total_users);
        results.insert(
            project.clone(),
            ProjectStat {
                name: project,
                metrics,
            },
        );
    }
    Ok(results)
}
