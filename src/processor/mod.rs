use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aggregate;
pub mod column;
pub mod group_by;
pub mod query_builder;
pub mod ranking;
pub mod sales_table;
pub mod schema;
pub mod shipping;
pub mod year_filter;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing header line")]
    MissingHeader,

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("Invalid value {value:?} for column '{column}' at line {line}")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Outcome of a load: how many rows made it into the table and what was wrong
/// with the rest.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ParseSummary {
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    /// 1-based line number in the source, header included.
    pub line: usize,
    /// Empty when the whole row was rejected.
    pub column: String,
    pub value: String,
    pub error: String,
}

/// What to do with an empty, non-numeric or non-finite value in a numeric
/// column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidValuePolicy {
    /// Drop the whole row and record the error.
    #[default]
    SkipRow,
    /// Store 0.0 and record the error.
    Zero,
    /// Abort the load with [`ProcessorError::InvalidValue`].
    Fail,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub invalid_values: InvalidValuePolicy,
}

/// Aggregate operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    /// Sum of all numeric values
    Sum,
    /// Count of all rows
    Count,
    /// Average of numeric values
    Avg,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
}

impl AggregateOp {
    pub fn name(self) -> &'static str {
        match self {
            AggregateOp::Sum => "sum",
            AggregateOp::Count => "count",
            AggregateOp::Avg => "avg",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregateOp {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggregateOp::Sum),
            "count" => Ok(AggregateOp::Count),
            "avg" | "mean" => Ok(AggregateOp::Avg),
            "min" => Ok(AggregateOp::Min),
            "max" => Ok(AggregateOp::Max),
            other => Err(ProcessorError::InvalidQuery(format!(
                "unknown aggregate operation '{other}'"
            ))),
        }
    }
}

/// Result of an aggregation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregateResult {
    Int(i64),
    Float(f64),
    /// Mean/min/max over zero rows.
    NoData,
}

impl AggregateResult {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            AggregateResult::Int(v) => Some(v as f64),
            AggregateResult::Float(v) => Some(v),
            AggregateResult::NoData => None,
        }
    }
}

impl fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateResult::Int(v) => write!(f, "{v}"),
            AggregateResult::Float(v) => write!(f, "{v:.2}"),
            AggregateResult::NoData => f.write_str("no data"),
        }
    }
}
