//! Lazily loaded matrices keyed by (method, allele, length).
//!
//! Matrices are read from disk the first time they are needed and shared
//! read-only afterwards. Two threads asking for the same unloaded matrix may
//! both parse the file; the first insert wins and both get an equal matrix.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use pepbind_common::{Allele, BindError, Method, Result};

use crate::matrix::StabilizedMatrix;
use crate::reader::load_matrix;

/// Identity of one matrix file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatrixKey {
    pub method: Method,
    pub allele: Allele,
    pub length: usize,
}

impl MatrixKey {
    pub fn new(method: Method, allele: Allele, length: usize) -> Self {
        Self { method, allele, length }
    }
}

impl fmt::Display for MatrixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.method, self.allele, self.length)
    }
}

/// Process-lifetime cache of loaded matrices.
pub struct MatrixCache {
    root: PathBuf,
    matrices: RwLock<HashMap<MatrixKey, Arc<StabilizedMatrix>>>,
}

impl fmt::Debug for MatrixCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixCache")
            .field("root", &self.root)
            .field("loaded", &self.matrices.read().len())
            .finish()
    }
}

impl MatrixCache {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            matrices: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<method>/<allele stem>-<length>.txt`
    pub fn matrix_path(&self, key: &MatrixKey) -> PathBuf {
        self.root
            .join(key.method.name())
            .join(format!("{}-{}.txt", key.allele.file_stem(), key.length))
    }

    /// Return the cached matrix for `key`, loading it on first use.
    pub fn get_or_load(&self, key: &MatrixKey) -> Result<Arc<StabilizedMatrix>> {
        if let Some(matrix) = self.matrices.read().get(key) {
            debug!(%key, "Matrix cache hit");
            return Ok(Arc::clone(matrix));
        }

        let path = self.matrix_path(key);
        let loaded = load_matrix(&path, key.method, key.allele.clone())?;
        if loaded.length() != key.length {
            return Err(BindError::MatrixFormat {
                source_name: path.display().to_string(),
                line: 1,
                reason: format!("declares length {}, file name says {}", loaded.length(), key.length),
            });
        }

        let mut matrices = self.matrices.write();
        let matrix = Arc::clone(
            matrices
                .entry(key.clone())
                .or_insert_with(|| Arc::new(loaded)),
        );
        info!(%key, path = %path.display(), "Matrix loaded ({} in cache)", matrices.len());
        Ok(matrix)
    }

    pub fn is_cached(&self, key: &MatrixKey) -> bool {
        self.matrices.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.matrices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.read().is_empty()
    }

    /// Drop every loaded matrix; they are re-read on next use.
    pub fn clear(&self) {
        self.matrices.write().clear();
    }
}
