use std::collections::BTreeMap;

use sqlx::{Row, SqlitePool};
use tracing::{error, info};

use crate::core::{CalcError, ProjectStat, SeasonConfig};

/// Merges externally computed engagement counts into the on-chain ranking.
///
/// Pure enrichment: a missing record leaves the project's stats untouched,
/// and a record for a project with no on-chain presence is dropped. A
/// ProjectStat is never created here.
pub struct OffchainMerger<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OffchainMerger<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn merge(
        &self,
        config: &SeasonConfig,
        results: &mut BTreeMap<String, ProjectStat>,
    ) -> Result<(), CalcError> {
        info!("Requesting off-chain engagement metrics");
        for project in &config.projects {
            info!(
                "Requesting data for {} ({}) ({})",
                project.name, project.analytics_key, config.name
            );
            let row = sqlx::query(
                "select non_premium_users, premium_users from tganalytics_latest \
                 where app_name = ? and season = ?",
            )
            .bind(project.analytics_key.as_str())
            .bind(config.name.as_str())
            .fetch_optional(self.pool)
            .await?;

            match row {
                None => {
                    error!("No off-chain data for {}", project.name);
                }
                Some(row) => match results.get_mut(&project.name) {
                    None => {
                        error!("Project {} has no on-chain data, ignoring", project.name);
                    }
                    Some(stat) => {
                        stat.metrics.insert(
                            "non_premium_users".to_string(),
                            row.get::<i64, _>("non_premium_users"),
                        );
                        stat.metrics.insert(
                            "premium_users".to_string(),
                            row.get::<i64, _>("premium_users"),
                        );
                    }
                },
            }
        }
        info!("Off-chain processing is finished");
        Ok(())
    }
}
