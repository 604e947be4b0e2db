pub mod apps;

pub use apps::AppLeaderboardBackend;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::info;

use crate::core::{CalcError, CalculationResults, LeaderboardKind, SeasonConfig};

/// A leaderboard calculation strategy. Each backend declares the leaderboard
/// categories it serves; the registry dispatches season configs accordingly.
#[async_trait]
pub trait CalculationBackend: Send + Sync {
    fn name(&self) -> &str;
    fn leaderboards(&self) -> &[LeaderboardKind];

    /// Runs the full pipeline for one season. `dry_run` must be
    /// side-effect-free: query planning only, no aggregation and no
    /// off-chain merge.
    async fn calculate(
        &self,
        pool: &SqlitePool,
        config: &SeasonConfig,
        dry_run: bool,
    ) -> Result<CalculationResults, CalcError>;
}

/// Category-to-backend dispatch. Backends register themselves with the kinds
/// they serve; no inheritance hierarchy involved.
#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<Box<dyn CalculationBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    pub fn register(&mut self, backend: Box<dyn CalculationBackend>) {
        self.backends.push(backend);
    }

    pub fn backends_for(&self, kind: LeaderboardKind) -> Vec<&dyn CalculationBackend> {
        self.backends
            .iter()
            .filter(|backend| backend.leaderboards().contains(&kind))
            .map(|backend| backend.as_ref())
            .collect()
    }

    /// Runs every backend matching the season's category, in registration
    /// order. Errors if no backend serves the category.
    pub async fn run(
        &self,
        pool: &SqlitePool,
        config: &SeasonConfig,
        dry_run: bool,
    ) -> Result<Vec<CalculationResults>, CalcError> {
        let selected = self.backends_for(config.kind);
        if selected.is_empty() {
            return Err(CalcError::NoBackend { kind: config.kind });
        }
        let mut all_results = Vec::with_capacity(selected.len());
        for backend in selected {
            info!(
                "Dispatching season {} to backend {}",
                config.name,
                backend.name()
            );
            all_results.push(backend.calculate(pool, config, dry_run).await?);
        }
        Ok(all_results)
    }
}
