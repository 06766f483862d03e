//! Compile-time errors: the single error surface returned by every pass in
//! the pipeline.

use cohesion_dsl::TextRange;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    ParseFailure(#[from] cohesion_dsl::ParseError),

    #[error("{range}: unsupported construct: {message}")]
    UnsupportedConstruct { message: String, range: TextRange },

    #[error("{range}: malformed exception flow: {message}")]
    MalformedExceptionFlow { message: String, range: TextRange },

    #[error("workflow '{workflow}': state '{state}' has a next-edge to undefined state '{target}'")]
    EdgeTargetMissing { workflow: String, state: String, target: String },

    #[error("workflow '{workflow}': could not eliminate placeholder state '{state}' (no replacement target)")]
    PlaceholderElisionFailure { workflow: String, state: String },

    #[error("I/O error writing '{path}': {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("internal compiler error: {message}")]
    InternalInvariant { message: String },
}
