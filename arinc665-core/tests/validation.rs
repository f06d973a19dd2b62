use arinc665_core::media::{Directory, File};
use arinc665_core::set::{Batch, Load, LoadType, MediaSet};
use arinc665_core::validate::validate;

fn passing_set() -> MediaSet {
    let mut set = MediaSet::default();
    let mut load = Load::new("ACM-100", LoadType::Software);
    load.add_file(File::from_payload("ACM-100.bin", b"firmware image".to_vec()));
    set.add_load(load);
    let mut batch = Batch::new("NIGHT-01");
    batch.add_load("ACM-100");
    batch.add_to_execution_order("ACM-100");
    set.add_batch(batch);
    set
}

#[test]
fn clean_set_passes_without_findings() {
    let report = validate(&passing_set());
    let (errors, warnings) = report.results();
    assert!(report.passed());
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
}

#[test]
fn empty_set_is_an_error() {
    let report = validate(&MediaSet::default());
    assert!(!report.passed());
    assert!(report.errors.iter().any(|e| e.contains("no loads or batches")));
}

#[test]
fn all_independent_findings_surface_in_one_pass() {
    let mut set = MediaSet::default();
    // empty part number
    set.add_load(Load::new("", LoadType::Software));
    // empty batch name
    set.add_batch(Batch::new(""));
    // execution order referencing an absent part number
    let mut batch = Batch::new("SEQ");
    batch.add_load("KNOWN");
    batch.add_to_execution_order("KNOWN");
    batch.add_to_execution_order("MISSING");
    set.add_batch(batch);

    let report = validate(&set);
    assert!(!report.passed());
    assert!(report.errors.iter().any(|e| e.contains("empty part number")));
    assert!(report.errors.iter().any(|e| e.contains("Batch has empty name")));
    assert!(report
        .errors
        .iter()
        .any(|e| e.contains("SEQ") && e.contains("MISSING")));
}

#[test]
fn load_without_files_is_a_warning() {
    let mut set = MediaSet::default();
    set.add_load(Load::new("ACM-100", LoadType::Data));
    let report = validate(&set);
    assert!(report.passed());
    assert!(report.warnings.iter().any(|w| w.contains("ACM-100") && w.contains("no files")));
}

#[test]
fn batch_without_loads_is_a_warning() {
    let mut set = MediaSet::default();
    set.add_batch(Batch::new("EMPTY-BATCH"));
    let report = validate(&set);
    assert!(report.passed());
    assert!(report.warnings.iter().any(|w| w.contains("EMPTY-BATCH")));
}

#[test]
fn bad_file_checksum_names_file_and_load() {
    let mut set = MediaSet::default();
    let mut load = Load::new("FMS-200", LoadType::Software);
    let mut file = File::with_metadata(
        "FMS-200.bin",
        4,
        Some(arinc665_core::checksum::digest(b"good")),
    );
    file.attach_payload(b"evil".to_vec());
    load.add_file(file);
    set.add_load(load);

    let report = validate(&set);
    assert!(!report.passed());
    assert!(report
        .errors
        .iter()
        .any(|e| e.contains("FMS-200.bin") && e.contains("FMS-200")));
}

#[test]
fn metadata_only_file_fails_verification() {
    let mut set = MediaSet::default();
    let mut load = Load::new("NAV-300", LoadType::Data);
    load.add_file(File::with_metadata("NAV-300.db", 10, None));
    set.add_load(load);
    let report = validate(&set);
    assert!(report.errors.iter().any(|e| e.contains("NAV-300.db")));
}

#[test]
fn duplicate_part_numbers_and_batch_names_are_errors() {
    let mut set = passing_set();
    let mut dup = Load::new("ACM-100", LoadType::Configuration);
    dup.add_file(File::from_payload("ACM-100.cfg", b"cfg".to_vec()));
    set.add_load(dup);
    let mut dup_batch = Batch::new("NIGHT-01");
    dup_batch.add_load("ACM-100");
    set.add_batch(dup_batch);

    let report = validate(&set);
    assert!(report.errors.iter().any(|e| e.contains("Duplicate load part number ACM-100")));
    assert!(report.errors.iter().any(|e| e.contains("Duplicate batch name NIGHT-01")));
}

#[test]
fn empty_directory_names_surface_recursively() {
    let mut set = passing_set();
    let mut root = Directory::new("root");
    root.add_subdirectory(Directory::new(""));
    set.add_directory(root);
    set.add_directory(Directory::new(""));

    let report = validate(&set);
    let count = report
        .errors
        .iter()
        .filter(|e| e.contains("Directory has empty name"))
        .count();
    assert_eq!(count, 2);
}

#[test]
fn execution_order_subset_rule() {
    let mut batch = Batch::new("B");
    batch.add_load("L1");
    batch.add_to_execution_order("L1");
    assert!(batch.execution_order_resolves());
    batch.add_to_execution_order("L2");
    assert!(!batch.execution_order_resolves());
}
