//! Error taxonomy for the generation pipeline.

use thiserror::Error;

/// All failure modes a pipeline stage or session command can report.
#[derive(Debug, Error)]
pub enum GenError {
    /// A parameter is out of range or inputs are inconsistent.
    #[error("invalid input: {what}")]
    InvalidInput { what: String },

    /// `reapply` or `edit_recompute` issued before any `generate`.
    #[error("no retained state for `{command}`; run `generate` first")]
    NoRetainedState { command: &'static str },

    /// A stage post-condition failed. Indicates a bug, not bad input.
    #[error("internal invariant violated: {what}")]
    InternalInvariant { what: String },
}

impl GenError {
    pub fn invalid(what: impl Into<String>) -> Self {
        GenError::InvalidInput { what: what.into() }
    }

    pub fn invariant(what: impl Into<String>) -> Self {
        GenError::InternalInvariant { what: what.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failed_command() {
        let e = GenError::NoRetainedState { command: "reapply" };
        let msg = e.to_string();
        assert!(msg.contains("reapply"), "message should name the command: {msg}");
    }
}
