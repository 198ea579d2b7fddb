//! Matrix files with easily computed scores.
//!
//! A uniform matrix gives every residue the same contribution at every
//! position, so any peptide of length `n` scores `10^(intercept + n * value)`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use pepbind_common::{Allele, Method, Residue};

/// Matrix file text with `value` in every cell.
///
/// Values are written with `{}` formatting, so `0.0` appears as `0`.
pub fn uniform_matrix_text(length: usize, value: f64, intercept: f64) -> String {
    let mut text = format!("{length}\n");
    for residue in Residue::ALL {
        text.push(residue.code());
        for _ in 0..length {
            let _ = write!(text, " {value}");
        }
        text.push('\n');
    }
    let _ = writeln!(text, "{intercept}");
    text
}

/// Write a uniform matrix where `MatrixCache` rooted at `root` will look for it.
pub fn write_uniform_matrix(
    root: &Path,
    method: Method,
    allele: &Allele,
    length: usize,
    value: f64,
    intercept: f64,
) -> PathBuf {
    let dir = root.join(method.name());
    std::fs::create_dir_all(&dir).expect("create matrix directory");
    let path = dir.join(format!("{}-{}.txt", allele.file_stem(), length));
    std::fs::write(&path, uniform_matrix_text(length, value, intercept)).expect("write matrix file");
    path
}
