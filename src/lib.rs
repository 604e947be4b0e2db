// Season leaderboard calculation engine

pub mod backend;
pub mod config;
pub mod core;
pub mod metrics;
pub mod offchain;
pub mod query;

// Re-export commonly used types for convenience
pub use crate::backend::{AppLeaderboardBackend, BackendRegistry, CalculationBackend};
pub use crate::core::{
    CalcError, CalculationContext, CalculationResults, LeaderboardKind, Project, ProjectStat,
    SeasonConfig,
};
