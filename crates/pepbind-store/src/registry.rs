//! Application-scoped (method, allele) → cache/store registry.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use pepbind_common::{Allele, BindRecord, Method, PartitionKey, Peptide, Result};
use pepbind_predict::PredictorSet;

use crate::cache::BindCache;
use crate::store::BindStore;
use crate::table::TableFactory;

/// Owns one [`BindStore`] and one [`BindCache`] per partition.
///
/// Lookup-or-create is atomic: concurrent first requests for the same
/// partition all receive the same instance. Partitions are opened while the
/// registry lock is held, so a slow table load delays other first lookups.
pub struct BindRegistry {
    predictors: PredictorSet,
    tables: Arc<dyn TableFactory>,
    stores: Mutex<HashMap<PartitionKey, Arc<BindStore>>>,
    caches: Mutex<HashMap<PartitionKey, Arc<BindCache>>>,
}

impl fmt::Debug for BindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindRegistry")
            .field("predictors", &self.predictors)
            .field("partitions", &self.partitions())
            .finish()
    }
}

impl BindRegistry {
    pub fn new(predictors: PredictorSet, tables: Arc<dyn TableFactory>) -> Self {
        Self {
            predictors,
            tables,
            stores: Mutex::new(HashMap::new()),
            caches: Mutex::new(HashMap::new()),
        }
    }

    pub fn predictors(&self) -> &PredictorSet {
        &self.predictors
    }

    /// The store for (method, allele), opening it on first use.
    pub fn store(&self, method: Method, allele: &Allele) -> Result<Arc<BindStore>> {
        let key = PartitionKey::new(method, allele.clone());
        let mut stores = self.stores.lock();
        if let Some(store) = stores.get(&key) {
            return Ok(Arc::clone(store));
        }

        let predictor = self.predictors.get(method)?;
        let table = self.tables.open(&key)?;
        let store = Arc::new(BindStore::open(key.clone(), predictor, table)?);
        stores.insert(key, Arc::clone(&store));
        Ok(store)
    }

    /// The cache for (method, allele), creating it and its store on first use.
    pub fn cache(&self, method: Method, allele: &Allele) -> Result<Arc<BindCache>> {
        let key = PartitionKey::new(method, allele.clone());
        // Lock order: caches, then stores
        let mut caches = self.caches.lock();
        if let Some(cache) = caches.get(&key) {
            return Ok(Arc::clone(cache));
        }

        let cache = Arc::new(BindCache::new(self.store(method, allele)?));
        info!(partition = %key, "Bind cache created");
        caches.insert(key, Arc::clone(&cache));
        Ok(cache)
    }

    /// Records for `peptides` under (method, allele), in request order.
    pub fn get(&self, method: Method, allele: &Allele, peptides: &[Peptide]) -> Result<Vec<BindRecord>> {
        self.cache(method, allele)?.get(peptides)
    }

    pub fn get_one(&self, method: Method, allele: &Allele, peptide: &Peptide) -> Result<BindRecord> {
        self.cache(method, allele)?.get_one(peptide)
    }

    /// Drop the partition's memory and unregister its cache and store.
    ///
    /// Persisted records are kept; the next lookup reopens the table.
    /// Returns whether the partition was registered.
    pub fn clear(&self, method: Method, allele: &Allele) -> bool {
        let key = PartitionKey::new(method, allele.clone());
        let mut caches = self.caches.lock();
        let cache = caches.remove(&key);
        if let Some(cache) = &cache {
            cache.clear();
        }
        let store = self.stores.lock().remove(&key);

        let removed = cache.is_some() || store.is_some();
        if removed {
            info!(partition = %key, "Bind partition cleared");
        }
        removed
    }

    pub fn clear_all(&self) {
        let mut caches = self.caches.lock();
        for cache in caches.values() {
            cache.clear();
        }
        let n = caches.len();
        caches.clear();
        self.stores.lock().clear();
        info!(caches = n, "All bind partitions cleared");
    }

    /// Registered partitions, sorted.
    pub fn partitions(&self) -> Vec<PartitionKey> {
        let caches = self.caches.lock();
        let stores = self.stores.lock();
        caches
            .keys()
            .chain(stores.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTableFactory;
    use pepbind_common::BindError;
    use pepbind_test_utils::CountingPredictor;

    struct Fixture {
        registry: BindRegistry,
        tables: Arc<MemoryTableFactory>,
        netmhcpan: Arc<CountingPredictor>,
        smm: Arc<CountingPredictor>,
    }

    fn fixture() -> Fixture {
        let tables = Arc::new(MemoryTableFactory::new());
        let netmhcpan = Arc::new(CountingPredictor::new(Method::NetMhcPan));
        let smm = Arc::new(CountingPredictor::new(Method::Smm));
        let predictors = PredictorSet::new().with(netmhcpan.clone()).with(smm.clone());
        Fixture {
            registry: BindRegistry::new(predictors, tables.clone()),
            tables,
            netmhcpan,
            smm,
        }
    }

    fn allele() -> Allele {
        Allele::new("HLA-A*02:01").unwrap()
    }

    #[test]
    fn test_same_key_returns_same_instance() {
        let f = fixture();
        let a = f.registry.cache(Method::NetMhcPan, &allele()).unwrap();
        let b = f.registry.cache(Method::NetMhcPan, &allele()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(a.store(), &f.registry.store(Method::NetMhcPan, &allele()).unwrap()));
        assert_eq!(f.tables.opens(), 1);
    }

    #[test]
    fn test_concurrent_first_lookups_converge() {
        let f = fixture();
        let caches: Vec<Arc<BindCache>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| f.registry.cache(Method::Smm, &allele()).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(caches.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(f.tables.opens(), 1);
    }

    #[test]
    fn test_methods_do_not_share_records() {
        let f = fixture();
        let peptides = Peptide::parse_all(["SIINFEKL"]).unwrap();
        f.registry.get(Method::NetMhcPan, &allele(), &peptides).unwrap();
        f.registry.get(Method::Smm, &allele(), &peptides).unwrap();

        assert_eq!(f.netmhcpan.calls(), 1);
        assert_eq!(f.smm.calls(), 1);
        assert_eq!(f.registry.partitions().len(), 2);
    }

    #[test]
    fn test_clear_rereads_persisted_records() {
        let f = fixture();
        let peptides = Peptide::parse_all(["SIINFEKL", "GILGFVFTL"]).unwrap();
        let before = f.registry.get(Method::NetMhcPan, &allele(), &peptides).unwrap();
        let old = f.registry.cache(Method::NetMhcPan, &allele()).unwrap();

        assert!(f.registry.clear(Method::NetMhcPan, &allele()));
        assert!(f.registry.partitions().is_empty());
        assert!(old.is_empty());

        let after = f.registry.get(Method::NetMhcPan, &allele(), &peptides).unwrap();
        let new = f.registry.cache(Method::NetMhcPan, &allele()).unwrap();
        assert_eq!(before, after);
        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(f.netmhcpan.calls(), 1);
        assert_eq!(f.tables.opens(), 2);

        assert!(!f.registry.clear(Method::Smm, &allele()));
    }

    #[test]
    fn test_clear_all() {
        let f = fixture();
        f.registry.cache(Method::NetMhcPan, &allele()).unwrap();
        f.registry.store(Method::Smm, &allele()).unwrap();
        assert_eq!(f.registry.partitions().len(), 2);

        f.registry.clear_all();
        assert!(f.registry.partitions().is_empty());
    }

    #[test]
    fn test_unregistered_method_is_unavailable() {
        let f = fixture();
        assert!(matches!(
            f.registry.cache(Method::NetMhcStabPan, &allele()),
            Err(BindError::PredictorUnavailable(Method::NetMhcStabPan))
        ));
        assert!(f.registry.partitions().is_empty());
    }
}
