//! Error types for oncoplot preparation.
//!
//! Every variant here is fatal. Recoverable conditions (unknown genes, unknown
//! samples in an explicit order, colliding color overrides) are logged with
//! `log::warn!` and processing continues on the reduced input.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OncoError {
    /// Fewer than two genes survived selection and filtering
    #[error("at least two genes are required to draw an oncoplot, got {found}")]
    InsufficientGenes { found: usize },

    /// An explicit sample order matched none of the matrix columns
    #[error("none of the {requested} requested samples are present in the matrix")]
    EmptySampleOrder { requested: usize },

    /// Annotation was requested but does not cover every matrix column
    #[error("annotation table is missing {} sample(s): {}", missing.len(), missing.join(", "))]
    MissingAnnotationRows { missing: Vec<String> },

    /// Annotation feature named in a sort or track request does not exist
    #[error("annotation feature '{feature}' not found; available: {}", available.join(", "))]
    UnknownAnnotationFeature { feature: String, available: Vec<String> },

    /// Highlight feature is not a field of the record source
    #[error("additional feature '{feature}' not found; available fields: {}", available.join(", "))]
    AdditionalFeatureNotFound { feature: String, available: Vec<String> },

    /// A cell label could not be parsed into an alteration
    #[error("invalid cell label '{0}'")]
    InvalidCell(String),

    /// A color token was neither `#RRGGBB` nor `r,g,b`
    #[error("invalid color '{0}'")]
    InvalidColor(String),

    /// Label and code matrices no longer share their shape
    #[error("matrix parity violated: {0}")]
    ParityViolation(String),

    /// Malformed tabular input
    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, OncoError>;
