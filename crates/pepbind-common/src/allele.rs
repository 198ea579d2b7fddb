//! MHC allele identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{BindError, Result};

/// Opaque MHC allele name, e.g. `HLA-A*02:01`.
///
/// Only used as a map key and to derive persisted file names, so no
/// nomenclature rules are enforced beyond "non-empty, no whitespace".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Allele(Arc<str>);

impl Allele {
    pub fn new(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(BindError::InvalidAllele {
                name: name.to_string(),
                reason: "empty name".to_string(),
            });
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(BindError::InvalidAllele {
                name: name.to_string(),
                reason: "contains whitespace".to_string(),
            });
        }
        Ok(Self(Arc::from(trimmed)))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// File-name-safe form of the allele name.
    ///
    /// Percent-encodes every byte outside `[A-Za-z0-9-_.~]`. The mapping is
    /// injective, so distinct alleles never share a stem.
    pub fn file_stem(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Allele {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl Serialize for Allele {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Allele {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Allele::new(&s).map_err(serde::de::Error::custom)
    }
}
