//! Fatal grounding errors
//!
//! Skips (unsupported answer type, STRING answer not found) are not errors;
//! they surface as `Ok(None)` from the assembler.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroundingError {
    /// Input record is structurally valid JSON but inconsistent
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Two mentions of one cluster normalize to different values
    #[error("normalization mismatch for entity {entity}: '{mention}' gives {found}, expected {expected}")]
    NormalizationMismatch {
        entity: usize,
        mention: String,
        expected: String,
        found: String,
    },

    #[error("no normalized value for mention '{mention}' of entity {entity}")]
    MissingNormalization { entity: usize, mention: String },

    /// Grammar produced a linked action whose span is not in the vocabulary
    #[error("action '{action}' links to span '{span}' which is not in the span vocabulary")]
    UnlinkedAction { action: String, span: String },

    #[error("malformed production rule '{0}'")]
    MalformedAction(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GroundingError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        GroundingError::MalformedInput(msg.into())
    }
}
