//! End-to-end resolution with matrix predictors and CSV tables on disk.

use std::path::Path;

use pepbind::{Allele, BindContext, BindError, BinderType, Config, Method, Peptide, Threshold};
use pepbind_test_utils::fixtures::write_uniform_matrix;
use pretty_assertions::assert_eq;

struct Dirs {
    matrices: tempfile::TempDir,
    cache: tempfile::TempDir,
}

fn allele() -> Allele {
    Allele::new("HLA-A*02:01").unwrap()
}

/// SMM matrices for lengths 8 and 9: every 8-mer scores 10^1.6, every 9-mer 10^3.
fn setup() -> (Dirs, BindContext) {
    pepbind::logging::init();
    let dirs = Dirs {
        matrices: tempfile::tempdir().unwrap(),
        cache: tempfile::tempdir().unwrap(),
    };
    write_uniform_matrix(dirs.matrices.path(), Method::Smm, &allele(), 8, 0.2, 0.0);
    write_uniform_matrix(dirs.matrices.path(), Method::Smm, &allele(), 9, 0.25, 0.75);

    let mut config = Config::default();
    config.matrix.root = dirs.matrices.path().to_path_buf();
    config.store.root = Some(dirs.cache.path().to_path_buf());
    let ctx = BindContext::from_config(config).unwrap();
    (dirs, ctx)
}

fn table_rows(cache_root: &Path) -> usize {
    let text = std::fs::read_to_string(cache_root.join("smm").join("HLA-A%2A02%3A01.csv")).unwrap();
    text.lines().count() - 1
}

#[test]
fn test_mixed_lengths_come_back_in_request_order() {
    let (_dirs, ctx) = setup();
    let peptides = Peptide::parse_all(["GILGFVFTL", "SIINFEKL", "YWDRNTQIY"]).unwrap();

    let records = ctx.get(Method::Smm, &allele(), &peptides).unwrap();

    let got: Vec<&str> = records.iter().map(|r| r.peptide().as_str()).collect();
    assert_eq!(got, vec!["GILGFVFTL", "SIINFEKL", "YWDRNTQIY"]);
    assert!((records[0].strength() - 1000.0).abs() < 1e-9);
    assert!((records[1].strength() - 10f64.powf(1.6)).abs() < 1e-9);
    assert_eq!(records[0].strength(), records[2].strength());
}

#[test]
fn test_records_survive_clear_via_persistence() {
    let (dirs, ctx) = setup();
    let peptides = Peptide::parse_all(["GILGFVFTL", "SIINFEKL"]).unwrap();

    let first = ctx.get(Method::Smm, &allele(), &peptides).unwrap();
    assert_eq!(table_rows(dirs.cache.path()), 2);

    // With no matrices loaded, only the table can answer
    ctx.clear_all();
    assert!(ctx.matrices().is_empty());

    let second = ctx.get(Method::Smm, &allele(), &peptides).unwrap();
    assert_eq!(first, second);
    assert!(ctx.matrices().is_empty());
    assert_eq!(table_rows(dirs.cache.path()), 2);
}

#[test]
fn test_a_fresh_context_reads_the_same_tables() {
    let (dirs, ctx) = setup();
    let peptides = Peptide::parse_all(["YWDRNTQIY"]).unwrap();
    let first = ctx.get(Method::Smm, &allele(), &peptides).unwrap();

    let mut config = ctx.config().clone();
    config.matrix.root = dirs.matrices.path().join("nowhere");
    let reopened = BindContext::from_config(config).unwrap();

    assert_eq!(reopened.get(Method::Smm, &allele(), &peptides).unwrap(), first);
}

#[test]
fn test_unsupported_length_fails_before_any_matrix_load() {
    let (_dirs, ctx) = setup();
    let peptides = Peptide::parse_all(["GILGFVFTL", "SIINFEKLMNPQ"]).unwrap();

    let err = ctx.get(Method::Smm, &allele(), &peptides).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BindError>(),
        Some(BindError::UnsupportedLength { length: 12, .. })
    ));
    assert!(ctx.matrices().is_empty());
}

#[test]
fn test_missing_matrix_is_reported_and_nothing_is_cached() {
    let (_dirs, ctx) = setup();
    let other = Allele::new("HLA-B*07:02").unwrap();
    let peptides = Peptide::parse_all(["GILGFVFTL"]).unwrap();

    let err = ctx.get(Method::Smm, &other, &peptides).unwrap_err();
    assert!(matches!(err.downcast_ref::<BindError>(), Some(BindError::MatrixNotFound(_))));

    let cache = ctx.registry().cache(Method::Smm, &other).unwrap();
    assert!(cache.is_empty());
}

#[test]
fn test_unconfigured_external_method_is_unavailable() {
    let (_dirs, ctx) = setup();
    let err = ctx
        .get(Method::NetMhcPan, &allele(), &Peptide::parse_all(["GILGFVFTL"]).unwrap())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BindError>(),
        Some(BindError::PredictorUnavailable(Method::NetMhcPan))
    ));
}

#[test]
fn test_classification_over_resolved_records() {
    let (_dirs, ctx) = setup();
    let peptides = Peptide::parse_all(["GILGFVFTL", "SIINFEKL"]).unwrap();
    let records = ctx.affinity(&allele(), &peptides).unwrap();

    // 1000 nM and ~39.8 nM, no percentile
    assert_eq!(
        ctx.classify(Method::Smm, &records).unwrap(),
        vec![BinderType::Unbound, BinderType::Strong]
    );

    // Half-lives are never read as IC50s
    let err = ctx.classify(Method::NetMhcStabPan, &records).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BindError>(),
        Some(BindError::WrongMeasure { method: Method::NetMhcStabPan, .. })
    ));

    let threshold = Threshold::affinity(500.0).unwrap();
    assert_eq!(
        ctx.affinity_binders(&allele(), &peptides, &threshold).unwrap(),
        vec![peptides[1].clone()]
    );
}
