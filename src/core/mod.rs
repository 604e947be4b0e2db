pub mod error;

pub use error::CalcError;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::MetricSpec;

/// Leaderboard categories a season can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardKind {
    Apps,
    Tokens,
}

/// One competition season: a time-boxed period with its own activity
/// partition and a fixed set of ranked projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonConfig {
    pub id: u32,
    /// External season label, also the off-chain lookup key.
    pub name: String,
    pub kind: LeaderboardKind,
    pub projects: Vec<Project>,
}

impl SeasonConfig {
    /// Suffix of the season's activity partition table
    /// (`messages_<safe_season_name>`).
    pub fn safe_season_name(&self) -> Result<String, CalcError> {
        sanitize_identifier(&self.name)
    }
}

/// A ranked participant. `name` is unique within a season; `analytics_key`
/// identifies the project in the off-chain engagement source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub analytics_key: String,
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
}

/// Per-run context handed to each metric while its fragment is composed.
/// Owned by a single calculation run, never shared across runs.
#[derive(Debug, Clone)]
pub struct CalculationContext {
    pub season_id: u32,
    pub season_name: String,
    pub safe_season_name: String,
    pub backend: &'static str,
    pub project_name: String,
    pub project_analytics_key: String,
}

/// Aggregated numbers for one project, keyed by metric name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStat {
    pub name: String,
    pub metrics: BTreeMap<String, i64>,
}

/// Full output of one calculation run. Ranking order is not significant;
/// ordering for display is a downstream concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResults {
    pub ranking: Vec<ProjectStat>,
    pub build_time_ms: u64,
    pub calculated_at: DateTime<Utc>,
}

/// Folds a name into something safe to splice into an SQL identifier:
/// lowercase, everything outside `[a-z0-9_]` replaced with `_`.
pub fn sanitize_identifier(name: &str) -> Result<String, CalcError> {
    let out: String = name
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() {
        return Err(CalcError::InvalidIdentifier {
            name: name.to_string(),
        });
    }
    Ok(out)
}
