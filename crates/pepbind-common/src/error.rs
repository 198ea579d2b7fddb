use thiserror::Error;

use crate::method::{MeasureKind, Method};

#[derive(Debug, Error)]
pub enum BindError {
    #[error("Invalid peptide {sequence:?}: {reason}")]
    InvalidPeptide { sequence: String, reason: String },

    #[error("Invalid allele {name:?}: {reason}")]
    InvalidAllele { name: String, reason: String },

    #[error("Invalid bind record for {peptide}: {reason}")]
    InvalidRecord { peptide: String, reason: String },

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Peptide {peptide} has length {actual}, matrix {method}/{allele} expects {expected}")]
    LengthMismatch {
        method: Method,
        allele: String,
        peptide: String,
        expected: usize,
        actual: usize,
    },

    #[error("{method} does not support peptide length {length} (allele {allele}, peptide {peptide})")]
    UnsupportedLength {
        method: Method,
        allele: String,
        peptide: String,
        length: usize,
    },

    #[error("{method} returned {actual} records for {expected} peptides (allele {allele})")]
    BatchSizeMismatch {
        method: Method,
        allele: String,
        expected: usize,
        actual: usize,
    },

    #[error("{method} returned a record for {actual} at position {position}, expected {expected} (allele {allele})")]
    PeptideMismatch {
        method: Method,
        allele: String,
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("{method} measures {kind:?}, expected {expected:?}")]
    WrongMeasure {
        method: Method,
        kind: MeasureKind,
        expected: MeasureKind,
    },

    #[error("No predictor registered for {0}")]
    PredictorUnavailable(Method),

    #[error("{method} predictor failed for allele {allele}: {reason}")]
    PredictorFailed {
        method: Method,
        allele: String,
        reason: String,
    },

    #[error("Malformed matrix {source_name} line {line}: {reason}")]
    MatrixFormat {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("Matrix not found: {0}")]
    MatrixNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal consistency error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BindError>;
