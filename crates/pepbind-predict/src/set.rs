//! Method → predictor table, resolved once at startup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use pepbind_common::{BindError, Method, Result};

use crate::predictor::Predictor;

/// The predictor bound to each [`Method`].
#[derive(Clone, Default)]
pub struct PredictorSet {
    predictors: BTreeMap<Method, Arc<dyn Predictor>>,
}

impl PredictorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `predictor` under its own method, replacing any previous one.
    pub fn with(mut self, predictor: Arc<dyn Predictor>) -> Self {
        self.insert(predictor);
        self
    }

    pub fn insert(&mut self, predictor: Arc<dyn Predictor>) {
        self.predictors.insert(predictor.method(), predictor);
    }

    pub fn get(&self, method: Method) -> Result<Arc<dyn Predictor>> {
        self.predictors
            .get(&method)
            .cloned()
            .ok_or(BindError::PredictorUnavailable(method))
    }

    pub fn contains(&self, method: Method) -> bool {
        self.predictors.contains_key(&method)
    }

    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.predictors.keys().copied()
    }

    /// Methods whose engine reports itself usable.
    pub fn installed(&self) -> Vec<Method> {
        self.predictors
            .iter()
            .filter(|(_, p)| p.is_installed())
            .map(|(m, _)| *m)
            .collect()
    }
}

impl fmt::Debug for PredictorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictorSet")
            .field("methods", &self.predictors.keys().collect::<Vec<_>>())
            .finish()
    }
}
