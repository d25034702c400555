use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::TransferError;

/// SQL type of a destination column, inferred from a sample of source rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
    Geometry,
}

impl ColumnKind {
    /// The PostgreSQL type this column is created with.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "bigint",
            ColumnKind::Float => "double precision",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Text => "text",
            ColumnKind::Geometry => "geometry(Geometry, 4326)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// A dataset fetched from the source, held in memory between download and
/// write. Each row has exactly one cell per column, positionally; an empty
/// source field is `None`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub table: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Behavior when the destination table already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionStrategy {
    /// Error out if the destination table exists.
    Fail,
    /// Drop the destination table before recreating it.
    #[default]
    Replace,
}

impl fmt::Display for CollisionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

impl FromStr for CollisionStrategy {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "replace" => Ok(Self::Replace),
            _ => Err(TransferError::Config(format!(
                "if_exists was not in available options: '{}'. Valid options: fail, replace",
                s
            ))),
        }
    }
}
