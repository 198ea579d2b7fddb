//! The stabilized scoring matrix.

use pepbind_common::{Allele, BindError, Method, Peptide, Result, ALPHABET_SIZE};

/// Per-position log10 contributions plus an intercept for one
/// (method, allele, length).
///
/// Immutable once built; scoring takes `&self` only.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizedMatrix {
    method: Method,
    allele: Allele,
    intercept: f64,
    /// `elements[position][residue index]`
    elements: Vec<[f64; ALPHABET_SIZE]>,
}

impl StabilizedMatrix {
    pub fn new(
        method: Method,
        allele: Allele,
        intercept: f64,
        elements: Vec<[f64; ALPHABET_SIZE]>,
    ) -> Result<Self> {
        let source_name = format!("{}/{}", method, allele);
        if elements.is_empty() {
            return Err(BindError::MatrixFormat {
                source_name,
                line: 0,
                reason: "matrix has no positions".to_string(),
            });
        }
        if !intercept.is_finite() || elements.iter().flatten().any(|v| !v.is_finite()) {
            return Err(BindError::MatrixFormat {
                source_name,
                line: 0,
                reason: "matrix contains non-finite values".to_string(),
            });
        }

        Ok(Self {
            method,
            allele,
            intercept,
            elements,
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn allele(&self) -> &Allele {
        &self.allele
    }

    /// Peptide length this matrix scores.
    pub fn length(&self) -> usize {
        self.elements.len()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn element(&self, position: usize, residue_index: usize) -> f64 {
        self.elements[position][residue_index]
    }

    /// `intercept + Σ element[pos][peptide[pos]]`, summed in position order.
    pub fn log_score(&self, peptide: &Peptide) -> Result<f64> {
        if peptide.len() != self.length() {
            return Err(BindError::LengthMismatch {
                method: self.method,
                allele: self.allele.to_string(),
                peptide: peptide.to_string(),
                expected: self.length(),
                actual: peptide.len(),
            });
        }

        let mut sum = self.intercept;
        for (row, residue) in self.elements.iter().zip(peptide.residues()) {
            sum += row[residue.index()];
        }
        Ok(sum)
    }

    /// Binding strength `10 ^ log_score`.
    pub fn score(&self, peptide: &Peptide) -> Result<f64> {
        Ok(10f64.powf(self.log_score(peptide)?))
    }
}
