//! Configuration loading for pepbind.
//! Reads pepbind.toml from the current directory or path in PEPBIND_CONFIG env var.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pepbind_classify::BinderCutoffs;
use pepbind_common::{Engine, MeasureKind, Method};

pub const CONFIG_ENV: &str = "PEPBIND_CONFIG";
pub const CONFIG_FILE: &str = "pepbind.toml";
pub const CACHE_DIR_ENV: &str = "PEPBIND_CACHE_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub matrix: MatrixConfig,
    #[serde(default)]
    pub methods: MethodsConfig,
    #[serde(default)]
    pub binder: BinderCutoffs,
    /// Keyed by method name, e.g. `[external.netmhcpan]`.
    #[serde(default)]
    pub external: BTreeMap<String, ExternalConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding persisted bind tables. See [`Config::cache_root`].
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    #[serde(default = "default_matrix_root")]
    pub root: PathBuf,
    #[serde(default = "default_lengths")]
    pub lengths: Vec<usize>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            root: default_matrix_root(),
            lengths: default_lengths(),
        }
    }
}

fn default_matrix_root() -> PathBuf { PathBuf::from("data/matrices") }
fn default_lengths()     -> Vec<usize> { vec![8, 9, 10, 11] }

/// Methods used when a caller does not name one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodsConfig {
    #[serde(default = "default_affinity_method")]
    pub affinity: Method,
    #[serde(default = "default_stability_method")]
    pub stability: Method,
}

impl Default for MethodsConfig {
    fn default() -> Self {
        Self {
            affinity: default_affinity_method(),
            stability: default_stability_method(),
        }
    }
}

fn default_affinity_method()  -> Method { Method::Smm }
fn default_stability_method() -> Method { Method::NetMhcStabPan }

/// An external predictor executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    /// Path, or a bare name looked up on `PATH`.
    pub executable: PathBuf,
    /// Argument template; `{allele}`, `{length}` and `{input}` are substituted.
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub lengths: Option<Vec<usize>>,
}


/// Pick the bind table root.
///
/// Order: configured value, `PEPBIND_CACHE_DIR`, the platform cache
/// directory, then `.cache/pepbind`.
pub fn resolve_cache_root(configured: Option<&Path>, env_value: Option<String>) -> PathBuf {
    if let Some(root) = configured {
        return root.to_path_buf();
    }
    if let Some(dir) = env_value.filter(|v| !v.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::cache_dir()
        .map(|d| d.join("pepbind"))
        .unwrap_or_else(|| PathBuf::from(".cache/pepbind"))
}

impl Config {
    /// Location of the configuration file.
    pub fn path() -> PathBuf {
        std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE))
    }

    /// Load configuration from pepbind.toml.
    /// Checks PEPBIND_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::path();
        if !path.exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Create pepbind.toml or point {} at one.",
                path.display(),
                CONFIG_ENV
            );
        }
        Self::load_from(&path)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::path();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.binder.validate()?;

        if self.matrix.lengths.is_empty() || self.matrix.lengths.contains(&0) {
            anyhow::bail!("matrix.lengths must be non-empty peptide lengths");
        }
        if self.methods.affinity.kind() != MeasureKind::Affinity {
            anyhow::bail!("methods.affinity = {} is not an affinity method", self.methods.affinity);
        }
        if self.methods.stability.kind() != MeasureKind::Stability {
            anyhow::bail!("methods.stability = {} is not a stability method", self.methods.stability);
        }

        for (method, external) in self.external_methods()? {
            if method.engine() != Engine::External {
                anyhow::bail!("[external.{}]: {} is scored from matrices", method, method);
            }
            if let Some(lengths) = &external.lengths {
                if lengths.is_empty() || lengths.contains(&0) {
                    anyhow::bail!("[external.{}] lengths must be non-empty peptide lengths", method);
                }
            }
        }
        Ok(())
    }

    /// `[external.*]` sections with their method names parsed.
    pub fn external_methods(&self) -> anyhow::Result<Vec<(Method, &ExternalConfig)>> {
        self.external
            .iter()
            .map(|(name, external)| {
                let method: Method = name
                    .parse()
                    .with_context(|| format!("[external.{}]", name))?;
                Ok((method, external))
            })
            .collect()
    }

    /// Bind table root, see [`resolve_cache_root`].
    pub fn cache_root(&self) -> PathBuf {
        resolve_cache_root(self.store.root.as_deref(), std::env::var(CACHE_DIR_ENV).ok())
    }
}
