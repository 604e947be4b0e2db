use crate::core::LeaderboardKind;

/// Errors raised by a calculation run.
///
/// Integrity violations are fatal and abort the run; data-completeness gaps
/// in the off-chain source are logged at the call site and never surface
/// here.
#[derive(thiserror::Error, Debug)]
pub enum CalcError {
    #[error("duplicate project key in on-chain result set: {project}")]
    DuplicateProjectKey { project: String },

    #[error("name cannot be used in an SQL identifier: {name:?}")]
    InvalidIdentifier { name: String },

    #[error("no backend registered for leaderboard kind {kind:?}")]
    NoBackend { kind: LeaderboardKind },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
