use serde::{Deserialize, Serialize};

use crate::core::CalculationContext;
use crate::query::SqlValue;

/// One activity sub-query produced by a metric: rows of
/// `(user_address, weight, id)` drawn from the season's `activity_src`
/// relation. Data values travel as binds, never as spliced text.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityFragment {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

/// A pluggable unit computing one kind of activity for a project. The
/// composer invokes each metric with the run context and unions the
/// resulting fragments per project.
pub trait Metric {
    fn name(&self) -> &str;
    fn fragment(&self, context: &CalculationContext) -> ActivityFragment;
}

/// Config-driven metric variants. All variants share the fragment row shape
/// `(user_address, weight, id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricSpec {
    /// Settled messages sent to a project account, fixed weight per message.
    DestinationMessages {
        name: String,
        destination: String,
        weight: i64,
    },
    /// Messages to a project account carrying a specific operation code.
    OpMessages {
        name: String,
        destination: String,
        op: i64,
        weight: i64,
    },
}

impl Metric for MetricSpec {
    fn name(&self) -> &str {
        match self {
            MetricSpec::DestinationMessages { name, .. } => name,
            MetricSpec::OpMessages { name, .. } => name,
        }
    }

    fn fragment(&self, _context: &CalculationContext) -> ActivityFragment {
        match self {
            MetricSpec::DestinationMessages {
                destination, weight, ..
            } => ActivityFragment {
                sql: "select user_address, ? as weight, id from activity_src where destination = ?"
                    .to_string(),
                binds: vec![SqlValue::Int(*weight), SqlValue::Text(destination.clone())],
            },
            MetricSpec::OpMessages {
                destination,
                op,
                weight,
                ..
            } => ActivityFragment {
                sql: "select user_address, ? as weight, id from activity_src where destination = ? and op = ?"
                    .to_string(),
                binds: vec![
                    SqlValue::Int(*weight),
                    SqlValue::Text(destination.clone()),
                    SqlValue::Int(*op),
                ],
            },
        }
    }
}
