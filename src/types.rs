// Shared types used across the codebase

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::callbacks::error::CallbackError;

/// Logical operation kinds, one callback processor each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Query,
    Update,
    Delete,
    Row,
    Raw,
}

impl Operation {
    /// Every operation kind, in processor declaration order
    pub const ALL: [Operation; 6] = [
        Operation::Create,
        Operation::Query,
        Operation::Update,
        Operation::Delete,
        Operation::Row,
        Operation::Raw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Query => "query",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Row => "row",
            Operation::Raw => "raw",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = CallbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CallbackError::UnknownOperation(s.to_string()))
    }
}
