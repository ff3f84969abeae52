use std::fmt;

use thiserror::Error;

/// Which side of an ordering constraint a conflict was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Before,
    After,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Before => f.write_str("before"),
            Relation::After => f.write_str("after"),
        }
    }
}

/// Setup-time errors raised while registering or compiling callbacks
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallbackError {
    #[error("conflicting callback {name} with {relation} {target}")]
    Conflict {
        name: String,
        relation: Relation,
        target: String,
    },

    #[error("unknown operation kind: {0}")]
    UnknownOperation(String),
}

impl CallbackError {
    pub(crate) fn conflict(name: &str, relation: Relation, target: &str) -> Self {
        CallbackError::Conflict {
            name: name.to_string(),
            relation,
            target: target.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CallbackError::Conflict { .. })
    }
}
