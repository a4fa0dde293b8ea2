//! Error types for schema resolution, population and projection.
//!
//! Resolution errors (`Cycle`, `UnknownType`, `RootReference`, query errors)
//! are programmer errors and are not worth retrying. `Fetch` wraps whatever a
//! reference accessor returned; retrying it is the caller's call.

use pineql_rql::RqlError;
use thiserror::Error;

/// Main error type for the engine.
#[derive(Error, Debug)]
pub enum PineError {
    /// An alias chain revisits a name.
    #[error("Cycle reference: \"{}\"", trail.join("->"))]
    Cycle {
        /// Names visited, ending with the repeated one.
        trail: Vec<String>,
    },

    /// A type name is not declared in the schema.
    #[error("Type {name} could not be found")]
    UnknownType { name: String },

    /// The root of a resolution is a reference instead of a shape.
    #[error("Root type `{name}` contains `ref`")]
    RootReference { name: String },

    /// A reference accessor failed. The whole population is abandoned.
    #[error("Fetch failed for reference at `{path}`: {source}")]
    Fetch {
        /// Dotted path of the reference.
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// A query string could not be parsed.
    #[error("Query parse error: {0}")]
    Parse(#[from] RqlError),

    /// A structured query contained a value that is neither a selection nor `true`.
    #[error("Invalid query at `{path}`: {reason}")]
    InvalidQuery { path: String, reason: String },

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl PineError {
    /// Get an error code for this error type.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cycle { .. } => "CYCLE_REFERENCE",
            Self::UnknownType { .. } => "UNKNOWN_TYPE",
            Self::RootReference { .. } => "ROOT_REFERENCE",
            Self::Fetch { .. } => "FETCH_FAILED",
            Self::Parse(_) => "QUERY_PARSE",
            Self::InvalidQuery { .. } => "INVALID_QUERY",
            Self::Config(_) => "CONFIG",
        }
    }

    /// Only fetch failures may succeed on a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

pub type Result<T> = std::result::Result<T, PineError>;
