use thiserror::Error;

use crate::config::Field;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Profile validation error (empty or clashing column names, blank tokens).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A required column is absent from the header row. Raised once per batch,
    /// before any row is looked at.
    #[error("missing required column '{column}' ({field})")]
    MissingColumn { field: Field, column: String },
}
