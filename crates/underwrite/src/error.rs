//! Error types for the evaluation pipeline

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors: the workbook could not be opened, or the configuration is unusable
///
/// Problems confined to single cells never surface here; they degrade that
/// cell to empty and are counted in
/// [`EvaluationDiagnostics`](crate::EvaluationDiagnostics).
#[derive(Debug, Error)]
pub enum Error {
    /// The workbook container or its worksheet could not be read
    #[error("Failed to load workbook: {0}")]
    Xlsx(#[from] underwrite_xlsx::XlsxError),

    /// Catalog or configuration JSON that does not deserialize
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Catalog whose addresses contradict each other
    #[error("Invalid metrics catalog '{version}': {reason}")]
    InvalidCatalog { version: String, reason: String },
}
