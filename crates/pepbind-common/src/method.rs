//! Prediction methods and partition keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::allele::Allele;
use crate::error::{BindError, Result};

/// What a method's strength value measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureKind {
    /// IC50 in nanomolar; lower binds tighter.
    Affinity,
    /// Complex half-life in hours; higher is more stable.
    Stability,
}

/// How a method produces its predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Scored in-process from a stabilized matrix.
    Matrix,
    /// Delegated to a third-party executable.
    External,
}

/// Closed set of binding prediction methods.
///
/// Serialized as [`Method::name`]; deserialized through [`FromStr`], so
/// `"NetMHCpan"` and `"netmhc-pan"` are accepted wherever `"netmhcpan"` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Method {
    NetMhc,
    NetMhcPan,
    NetMhcCons,
    Smm,
    SmmPmbec,
    NetMhcStabPan,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::NetMhc,
        Method::NetMhcPan,
        Method::NetMhcCons,
        Method::Smm,
        Method::SmmPmbec,
        Method::NetMhcStabPan,
    ];

    /// Stable lower-case name used in config files and persisted paths.
    pub fn name(self) -> &'static str {
        match self {
            Method::NetMhc => "netmhc",
            Method::NetMhcPan => "netmhcpan",
            Method::NetMhcCons => "netmhccons",
            Method::Smm => "smm",
            Method::SmmPmbec => "smmpmbec",
            Method::NetMhcStabPan => "netmhcstabpan",
        }
    }

    pub fn kind(self) -> MeasureKind {
        match self {
            Method::NetMhcStabPan => MeasureKind::Stability,
            _ => MeasureKind::Affinity,
        }
    }

    pub fn engine(self) -> Engine {
        match self {
            Method::Smm | Method::SmmPmbec => Engine::Matrix,
            _ => Engine::External,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| BindError::UnknownMethod(s.to_string()))
    }
}

impl TryFrom<String> for Method {
    type Error = BindError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Key of one cache/store partition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    pub method: Method,
    pub allele: Allele,
}

impl PartitionKey {
    pub fn new(method: Method, allele: Allele) -> Self {
        Self { method, allele }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.method, self.allele)
    }
}
