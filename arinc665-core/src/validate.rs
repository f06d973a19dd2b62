//! Structural and content validation of a media set.

use crate::media::Directory;
use crate::set::{Batch, Load, MediaSet};
use serde::Serialize;
use std::collections::HashSet;

/// Outcome of a validation run: every finding across the whole set, in
/// entity order. Findings are data, never errors; a run against imperfect
/// input reports everything it sees.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Validation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Validation {
    /// A set passes when no errors were found; warnings do not fail it.
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Snapshot of (errors, warnings) for report printers.
    pub fn results(&self) -> (&[String], &[String]) {
        (&self.errors, &self.warnings)
    }

    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// Check a media set for structural and content problems. Every rule is
/// evaluated; no finding suppresses another.
pub fn validate(set: &MediaSet) -> Validation {
    let mut v = Validation::default();

    if set.loads.is_empty() && set.batches.is_empty() {
        v.error("Media set contains no loads or batches".to_string());
    }

    let mut part_numbers: HashSet<&str> = HashSet::new();
    for load in &set.loads {
        validate_load(&mut v, load);
        if !load.part_number.is_empty() && !part_numbers.insert(&load.part_number) {
            v.error(format!("Duplicate load part number {} in media set", load.part_number));
        }
    }

    let mut batch_names: HashSet<&str> = HashSet::new();
    for batch in &set.batches {
        validate_batch(&mut v, batch);
        if !batch.name.is_empty() && !batch_names.insert(&batch.name) {
            v.error(format!("Duplicate batch name {} in media set", batch.name));
        }
    }

    for dir in &set.directories {
        validate_directory(&mut v, dir);
    }

    v
}

fn validate_load(v: &mut Validation, load: &Load) {
    if load.part_number.is_empty() {
        v.error("Load has empty part number".to_string());
    }
    if load.files.is_empty() {
        v.warning(format!("Load {} contains no files", load.part_number));
    }
    for file in &load.files {
        if !file.verify_checksum() {
            v.error(format!(
                "File {} in load {} has invalid checksum",
                file.name, load.part_number
            ));
        }
    }
}

fn validate_batch(v: &mut Validation, batch: &Batch) {
    if batch.name.is_empty() {
        v.error("Batch has empty name".to_string());
    }
    if batch.loads.is_empty() {
        v.warning(format!("Batch {} references no loads", batch.name));
    }
    for part_number in &batch.execution_order {
        if !batch.loads.contains(part_number) {
            v.error(format!(
                "Batch {} execution order references unknown load {}",
                batch.name, part_number
            ));
        }
    }
}

fn validate_directory(v: &mut Validation, dir: &Directory) {
    if dir.name.is_empty() {
        v.error("Directory has empty name".to_string());
    }
    for sub in dir.subdirectories() {
        validate_directory(v, sub);
    }
}
