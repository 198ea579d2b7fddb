//! Matrix file parsing.
//!
//! Format (whitespace separated, blank lines ignored):
//! - line 1: peptide length as the first field (further header fields are ignored)
//! - 20 rows, one per residue in canonical order `ACDEFGHIKLMNPQRSTVWY`:
//!   `<code> <v_0> ... <v_{length-1}>`
//! - one line holding the intercept
//!
//! Anything else is a fatal load error naming the file and line.

use std::path::Path;

use tracing::debug;

use pepbind_common::{Allele, BindError, Method, Residue, Result, ALPHABET_SIZE};

use crate::matrix::StabilizedMatrix;

fn malformed(source_name: &str, line: usize, reason: impl Into<String>) -> BindError {
    BindError::MatrixFormat {
        source_name: source_name.to_string(),
        line,
        reason: reason.into(),
    }
}

fn parse_value(source_name: &str, line: usize, field: &str) -> Result<f64> {
    field
        .parse::<f64>()
        .map_err(|_| malformed(source_name, line, format!("not a number: {:?}", field)))
}

/// Parse matrix text. `source_name` only labels errors.
pub fn parse_matrix(
    text: &str,
    source_name: &str,
    method: Method,
    allele: Allele,
) -> Result<StabilizedMatrix> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    // Header
    let (header_line, header) = lines
        .next()
        .ok_or_else(|| malformed(source_name, 0, "empty matrix file"))?;
    let length = header
        .split_whitespace()
        .next()
        .and_then(|f| f.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| {
            malformed(source_name, header_line, format!("header must start with a peptide length, got {:?}", header))
        })?;

    // One row per residue, canonical order
    let mut elements = vec![[0.0f64; ALPHABET_SIZE]; length];
    for expected in Residue::ALL {
        let (n, line) = lines.next().ok_or_else(|| {
            malformed(source_name, 0, format!("missing row for residue {}", expected))
        })?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != length + 1 {
            return Err(malformed(
                source_name,
                n,
                format!("expected {} fields, found {}", length + 1, fields.len()),
            ));
        }

        let mut code = fields[0].chars();
        let residue = match (code.next(), code.next()) {
            (Some(c), None) => Residue::from_code(c),
            _ => None,
        }
        .ok_or_else(|| malformed(source_name, n, format!("unknown residue code {:?}", fields[0])))?;
        if residue != expected {
            return Err(malformed(
                source_name,
                n,
                format!("expected row for residue {}, found {}", expected, residue),
            ));
        }

        for (position, field) in fields[1..].iter().enumerate() {
            elements[position][residue.index()] = parse_value(source_name, n, field)?;
        }
    }

    // Intercept
    let (n, line) = lines
        .next()
        .ok_or_else(|| malformed(source_name, 0, "missing intercept line"))?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 1 {
        return Err(malformed(
            source_name,
            n,
            format!("intercept line must hold one value, found {}", fields.len()),
        ));
    }
    let intercept = parse_value(source_name, n, fields[0])?;

    if let Some((n, _)) = lines.next() {
        return Err(malformed(source_name, n, "unexpected data after intercept"));
    }

    StabilizedMatrix::new(method, allele, intercept, elements)
}

/// Read and parse a matrix file.
pub fn load_matrix(path: &Path, method: Method, allele: Allele) -> Result<StabilizedMatrix> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => BindError::MatrixNotFound(path.display().to_string()),
        _ => BindError::Io(e),
    })?;
    debug!(path = %path.display(), %method, %allele, "Parsing matrix");
    parse_matrix(&text, &path.display().to_string(), method, allele)
}
