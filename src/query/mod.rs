use tracing::warn;

use crate::config::FilterConfig;
use crate::core::{sanitize_identifier, CalcError, CalculationContext, SeasonConfig};
use crate::metrics::Metric;

/// A bind value carried alongside composed SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
}

/// A fully composed aggregation query: final SQL plus bind values in
/// placeholder order.
#[derive(Debug, Clone)]
pub struct ComposedQuery {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

struct Cte {
    name: String,
    body: String,
}

/// Assembles named sub-relations into one `WITH` query. Identifiers are
/// sanitized before they reach this builder; data values always travel as
/// binds.
struct QueryBuilder {
    ctes: Vec<Cte>,
    binds: Vec<SqlValue>,
}

impl QueryBuilder {
    fn new() -> Self {
        Self {
            ctes: Vec::new(),
            binds: Vec::new(),
        }
    }

    /// CTEs must be pushed in the order their placeholders appear in the
    /// final statement.
    fn push_cte(&mut self, name: &str, body: String, binds: Vec<SqlValue>) {
        self.ctes.push(Cte {
            name: name.to_string(),
            body,
        });
        self.binds.extend(binds);
    }

    fn finish(self, final_select: &str) -> ComposedQuery {
        let ctes = self
            .ctes
            .iter()
            .map(|cte| format!("{} as (\n{}\n)", cte.name, cte.body))
            .collect::<Vec<_>>()
            .join(",\n");
        ComposedQuery {
            sql: format!("with {}\n{}", ctes, final_select),
            binds: self.binds,
        }
    }
}

/// Composes the full per-season aggregation query:
/// per-project metric fragments unioned into one activity relation, the
/// anti-fraud filters, and the per-project aggregation stages.
///
/// Returns `Ok(None)` when no project contributes any activity fragment;
/// the caller then skips the data store entirely.
pub fn compose_season(
    config: &SeasonConfig,
    filters: &FilterConfig,
    backend: &'static str,
) -> Result<Option<ComposedQuery>, CalcError> {
    let safe_season = config.safe_season_name()?;
    let mut builder = QueryBuilder::new();

    // Subset of the messages table: pre-filtered to successfully settled
    // transactions, one partition per season.
    builder.push_cte(
        "activity_src",
        format!("select * from messages_{}", safe_season),
        Vec::new(),
    );

    let mut context = CalculationContext {
        season_id: config.id,
        season_name: config.name.clone(),
        safe_season_name: safe_season,
        backend,
        project_name: String::new(),
        project_analytics_key: String::new(),
    };

    let mut aliases: Vec<(String, String)> = Vec::new();
    for project in &config.projects {
        if project.metrics.is_empty() {
            // A project without metrics contributes nothing; emitting an
            // empty union would be malformed SQL.
            warn!(
                "Project {} has no metrics, skipping in composition",
                project.name
            );
            continue;
        }
        let cte_name = format!("project_{}", sanitize_identifier(&project.name)?);
        if aliases.iter().any(|(existing, _)| existing == &cte_name) {
            return Err(CalcError::DuplicateProjectKey {
                project: project.name.clone(),
            });
        }
        context.project_name = project.name.clone();
        context.project_analytics_key = project.analytics_key.clone();

        let mut parts = Vec::new();
        let mut binds = Vec::new();
        for metric in &project.metrics {
            let fragment = metric.fragment(&context);
            parts.push(fragment.sql);
            binds.extend(fragment.binds);
        }
        builder.push_cte(&cte_name, parts.join("\nunion all\n"), binds);
        aliases.push((cte_name, project.name.clone()));
    }

    if aliases.is_empty() {
        return Ok(None);
    }

    let mut branches = Vec::new();
    let mut name_binds = Vec::new();
    for (cte_name, display_name) in &aliases {
        branches.push(format!(
            "select ? as project, user_address, weight, id from {}",
            cte_name
        ));
        name_binds.push(SqlValue::Text(display_name.clone()));
    }
    builder.push_cte("all_projects_raw", branches.join("\nunion all\n"), name_binds);

    // Ban filter: known-bad actors are excluded before any aggregation.
    let (ban_body, ban_binds) = if filters.banned_addresses.is_empty() {
        ("select * from all_projects_raw".to_string(), Vec::new())
    } else {
        (
            format!(
                "select * from all_projects_raw where user_address not in ({})",
                placeholders(filters.banned_addresses.len())
            ),
            filters
                .banned_addresses
                .iter()
                .map(|address| SqlValue::Text(address.clone()))
                .collect(),
        )
    };
    builder.push_cte("all_projects", ban_body, ban_binds);

    builder.push_cte(
        "users_stats_raw",
        "select project, user_address, min(weight) as weight, count(distinct id) as tx_count \
         from all_projects group by 1, 2"
            .to_string(),
        Vec::new(),
    );
    builder.push_cte(
        "users",
        "select distinct user_address from users_stats_raw".to_string(),
        Vec::new(),
    );

    // Most recent recorded code hash per address; latest last_tx_lt wins
    // when an address has multiple recorded states.
    builder.push_cte(
        "states",
        "select user_address, code_hash from (\n\
         select usr.user_address, st.code_hash,\n\
         row_number() over (partition by st.address order by st.last_tx_lt desc) as rn\n\
         from account_states st\n\
         join users usr on usr.user_address = st.address\n\
         ) where rn = 1"
            .to_string(),
        Vec::new(),
    );

    // Wallet-type filter: addresses with no recorded state (fresh wallets)
    // or a null code hash stay in; everything else must match a known
    // standard-wallet code hash.
    let mut wallet_conditions = vec![
        "st.user_address is null".to_string(),
        "st.code_hash is null".to_string(),
    ];
    let mut wallet_binds = Vec::new();
    if !filters.wallet_code_hashes.is_empty() {
        wallet_conditions.push(format!(
            "st.code_hash in ({})",
            placeholders(filters.wallet_code_hashes.len())
        ));
        wallet_binds.extend(
            filters
                .wallet_code_hashes
                .iter()
                .map(|hash| SqlValue::Text(hash.clone())),
        );
    }
    builder.push_cte(
        "wallets",
        format!(
            "select usr.user_address from users usr\n\
             left join states st on st.user_address = usr.user_address\n\
             where {}",
            wallet_conditions.join(" or ")
        ),
        wallet_binds,
    );

    builder.push_cte(
        "users_stats",
        "select users_stats_raw.* from users_stats_raw join wallets using(user_address)"
            .to_string(),
        Vec::new(),
    );
    builder.push_cte(
        "good_users",
        "select project, sum(weight) as total_users from users_stats \
         where tx_count > 1 group by 1"
            .to_string(),
        Vec::new(),
    );
    // tx_stat reads the wallet-filtered stats, so transaction volume is also
    // restricted to allowlisted wallets. Published leaderboard numbers depend
    // on this coupling; do not repoint it at users_stats_raw.
    builder.push_cte(
        "tx_stat",
        "select project, sum(weight * tx_count) as tx_count from users_stats group by 1"
            .to_string(),
        Vec::new(),
    );

    Ok(Some(builder.finish(
        "select project, tx_count, coalesce(total_users, 0) as total_users\n\
         from tx_stat\n\
         left join good_users using(project)",
    )))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LeaderboardKind, Project};
    use crate::metrics::MetricSpec;

    fn season(projects: Vec<Project>) -> SeasonConfig {
        SeasonConfig {
            id: 3,
            name: "S3".to_string(),
            kind: LeaderboardKind::Apps,
            projects,
        }
    }

    fn project(name: &str, metrics: Vec<MetricSpec>) -> Project {
        Project {
            name: name.to_string(),
            analytics_key: name.to_string(),
            metrics,
        }
    }

    fn deposit_metric(destination: &str, weight: i64) -> MetricSpec {
        MetricSpec::DestinationMessages {
            name: "messages".to_string(),
            destination: destination.to_string(),
            weight,
        }
    }

    #[test]
    fn test_empty_season_composes_to_none() {
        let config = season(vec![]);
        let composed = compose_season(&config, &FilterConfig::default(), "apps").unwrap();
        assert!(composed.is_none());
    }

    #[test]
    fn test_zero_metric_project_contributes_nothing() {
        let config = season(vec![
            project("empty", vec![]),
            project("active", vec![deposit_metric("EQa", 1)]),
        ]);
        let composed = compose_season(&config, &FilterConfig::default(), "apps")
            .unwrap()
            .unwrap();
        assert!(composed.sql.contains("project_active"));
        assert!(!composed.sql.contains("project_empty"));
    }

    #[test]
    fn test_only_zero_metric_projects_composes_to_none() {
        let config = season(vec![project("empty", vec![])]);
        let composed = compose_season(&config, &FilterConfig::default(), "apps").unwrap();
        assert!(composed.is_none());
    }

    #[test]
    fn test_duplicate_project_names_rejected() {
        let config = season(vec![
            project("App One", vec![deposit_metric("EQa", 1)]),
            project("app one", vec![deposit_metric("EQb", 1)]),
        ]);
        let err = compose_season(&config, &FilterConfig::default(), "apps").unwrap_err();
        assert!(matches!(err, CalcError::DuplicateProjectKey { .. }));
    }

    #[test]
    fn test_placeholder_count_matches_binds() {
        let mut filters = FilterConfig::default();
        filters.banned_addresses.insert("EQbanned1".to_string());
        filters.banned_addresses.insert("EQbanned2".to_string());
        let config = season(vec![
            project("a", vec![deposit_metric("EQa", 2), deposit_metric("EQa2", 1)]),
            project("b", vec![deposit_metric("EQb", 1)]),
        ]);
        let composed = compose_season(&config, &filters, "apps").unwrap().unwrap();
        assert_eq!(composed.sql.matches('?').count(), composed.binds.len());
        // 3 metric fragments x 2 binds, 2 project name tags, 2 banned, 10 hashes
        assert_eq!(composed.binds.len(), 6 + 2 + 2 + 10);
    }

    #[test]
    fn test_partition_scoped_by_safe_season_name() {
        let mut config = season(vec![project("a", vec![deposit_metric("EQa", 1)])]);
        config.name = "S3 Final".to_string();
        let composed = compose_season(&config, &FilterConfig::default(), "apps")
            .unwrap()
            .unwrap();
        assert!(composed.sql.contains("from messages_s3_final"));
    }

    #[test]
    fn test_empty_ban_set_omits_exclusion_clause() {
        let filters = FilterConfig {
            banned_addresses: Default::default(),
            ..FilterConfig::default()
        };
        let config = season(vec![project("a", vec![deposit_metric("EQa", 1)])]);
        let composed = compose_season(&config, &filters, "apps").unwrap().unwrap();
        assert!(!composed.sql.contains("not in ()"));
    }
}
