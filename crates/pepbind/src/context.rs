//! Application context: configuration wired to predictors, tables and the
//! partition registry.

use std::sync::Arc;

use anyhow::Context as _;
use tracing::{info, warn};

use pepbind_classify::{require_affinity, BinderType, Threshold};
use pepbind_common::{Allele, BindRecord, Engine, Method, Peptide};
use pepbind_config::Config;
use pepbind_matrix::{MatrixCache, MatrixPredictor};
use pepbind_predict::{CommandPredictor, LengthBucketed, PredictorSet};
use pepbind_store::{BindRegistry, CsvTableFactory, TableFactory};

/// Build the method → predictor table described by `config`.
///
/// Every matrix method gets an in-process predictor over `matrices`; each
/// `[external.*]` section gets a command predictor. Methods without either
/// stay unregistered and fail with `PredictorUnavailable` when asked for.
pub fn build_predictors(config: &Config, matrices: &Arc<MatrixCache>) -> anyhow::Result<PredictorSet> {
    let mut predictors = PredictorSet::new();

    for method in Method::ALL.into_iter().filter(|m| m.engine() == Engine::Matrix) {
        let predictor = MatrixPredictor::new(method, Arc::clone(matrices))
            .with_lengths(config.matrix.lengths.iter().copied());
        predictors.insert(Arc::new(LengthBucketed::new(predictor)));
    }

    for (method, external) in config.external_methods()? {
        let mut predictor = CommandPredictor::new(method, &external.executable);
        if let Some(args) = &external.args {
            predictor = predictor.with_args(args.iter().cloned());
        }
        if let Some(lengths) = &external.lengths {
            predictor = predictor.with_lengths(lengths.iter().copied());
        }
        predictors.insert(Arc::new(LengthBucketed::new(predictor)));
    }

    let installed = predictors.installed();
    for method in predictors.methods() {
        if !installed.contains(&method) {
            warn!(%method, "Predictor registered but not installed");
        }
    }
    info!(?installed, "Predictors ready");
    Ok(predictors)
}

/// Everything a caller needs to resolve binding records.
#[derive(Debug)]
pub struct BindContext {
    config: Config,
    matrices: Arc<MatrixCache>,
    registry: BindRegistry,
}

impl BindContext {
    /// Load `pepbind.toml` (or the defaults) and build a context from it.
    pub fn load() -> anyhow::Result<Self> {
        let config = Config::load_or_default().context("Failed to load configuration")?;
        Self::from_config(config)
    }

    /// Context persisting bind tables as CSV files under the configured cache root.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let root = config.cache_root();
        info!(root = %root.display(), "Bind tables stored as CSV");
        Self::with_tables(config, Arc::new(CsvTableFactory::new(root)))
    }

    /// Context over caller-supplied tables.
    pub fn with_tables(config: Config, tables: Arc<dyn TableFactory>) -> anyhow::Result<Self> {
        config.validate()?;
        let matrices = Arc::new(MatrixCache::new(&config.matrix.root));
        let predictors = build_predictors(&config, &matrices)?;
        Ok(Self::new(config, matrices, predictors, tables))
    }

    /// Context over explicit parts.
    pub fn new(
        config: Config,
        matrices: Arc<MatrixCache>,
        predictors: PredictorSet,
        tables: Arc<dyn TableFactory>,
    ) -> Self {
        Self {
            config,
            matrices,
            registry: BindRegistry::new(predictors, tables),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &BindRegistry {
        &self.registry
    }

    pub fn matrices(&self) -> &Arc<MatrixCache> {
        &self.matrices
    }

    /// Records from `method` for `peptides`, in request order.
    pub fn get(&self, method: Method, allele: &Allele, peptides: &[Peptide]) -> anyhow::Result<Vec<BindRecord>> {
        self.registry
            .get(method, allele, peptides)
            .with_context(|| format!("{} prediction for {}", method, allele))
    }

    /// Records from the configured default affinity method.
    pub fn affinity(&self, allele: &Allele, peptides: &[Peptide]) -> anyhow::Result<Vec<BindRecord>> {
        self.get(self.config.methods.affinity, allele, peptides)
    }

    /// Records from the configured default stability method.
    pub fn stability(&self, allele: &Allele, peptides: &[Peptide]) -> anyhow::Result<Vec<BindRecord>> {
        self.get(self.config.methods.stability, allele, peptides)
    }

    /// Binder type of each record from `method` under the configured cutoffs.
    ///
    /// Only affinity methods can be classified.
    pub fn classify(&self, method: Method, records: &[BindRecord]) -> anyhow::Result<Vec<BinderType>> {
        records
            .iter()
            .map(|r| BinderType::classify_for(method, r, &self.config.binder).map_err(anyhow::Error::from))
            .collect()
    }

    /// Peptides whose affinity record passes `threshold`, in request order.
    pub fn affinity_binders(
        &self,
        allele: &Allele,
        peptides: &[Peptide],
        threshold: &Threshold,
    ) -> anyhow::Result<Vec<Peptide>> {
        require_affinity(self.config.methods.affinity)?;
        let records = self.affinity(allele, peptides)?;
        Ok(threshold
            .get_binders(&records)
            .into_iter()
            .map(|r| r.peptide().clone())
            .collect())
    }

    /// Forget one partition's memory; persisted records are kept.
    pub fn clear(&self, method: Method, allele: &Allele) -> bool {
        self.registry.clear(method, allele)
    }

    /// Forget every partition and every loaded matrix.
    pub fn clear_all(&self) {
        self.registry.clear_all();
        self.matrices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pepbind_store::MemoryTableFactory;

    #[test]
    fn test_matrix_methods_always_registered() {
        let config = Config::default();
        let matrices = Arc::new(MatrixCache::new("/nonexistent/matrices"));
        let predictors = build_predictors(&config, &matrices).unwrap();

        let methods: Vec<Method> = predictors.methods().collect();
        assert_eq!(methods, vec![Method::Smm, Method::SmmPmbec]);
        assert!(predictors.installed().is_empty());
    }

    #[test]
    fn test_external_sections_become_predictors() {
        let config = Config::from_toml_str(
            "[external.netmhc]\nexecutable = \"/opt/netMHC/netMHC\"\n\n\
             [external.NetMHCstabpan]\nexecutable = \"netMHCstabpan\"\nlengths = [9]\n",
        )
        .unwrap();
        let ctx = BindContext::with_tables(config, Arc::new(MemoryTableFactory::new())).unwrap();

        let predictors = ctx.registry().predictors();
        assert!(predictors.contains(Method::NetMhc));
        assert!(predictors.contains(Method::NetMhcStabPan));
        assert!(!predictors.contains(Method::NetMhcPan));
    }
}
