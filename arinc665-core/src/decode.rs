//! Assembles a `MediaSet` from an on-disk medium directory.
//!
//! The three index files at the medium root are all optional: an absent
//! index contributes nothing. Load and batch headers may live anywhere
//! beneath the root; each one decodes independently, so the header fan-out
//! runs in parallel and the results are merged into the set afterwards.

use crate::header;
use crate::list::{self, FileList};
use crate::media::{Directory, File};
use crate::set::{Batch, Load, MediaSet, MediaSetVersion};
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

pub const FILE_LIST_NAME: &str = "FILES.LUM";
pub const LOAD_LIST_NAME: &str = "LOADS.LUM";
pub const BATCH_LIST_NAME: &str = "BATCHES.LUM";

/// Read a media set from a medium directory.
pub fn read_media_set(root: &Path) -> Result<MediaSet> {
    if !root.is_dir() {
        bail!("not a directory: {}", root.display());
    }

    let mut set = MediaSet::default();
    let mut version: Option<MediaSetVersion> = None;

    // FILES.LUM, when present, becomes the root directory of the tree.
    let mut root_dir: Option<Directory> = None;
    let file_list_path = root.join(FILE_LIST_NAME);
    if file_list_path.is_file() {
        let file_list = list::read_file_list(&file_list_path)?;
        tracing::debug!(
            path = %file_list_path.display(),
            entries = file_list.entries.len(),
            "decoded file list"
        );
        version.get_or_insert(file_list.version);
        root_dir = Some(build_root_directory(root, &file_list)?);
    }

    // Headers referenced by the lists are tracked so stray headers are
    // decoded once.
    let mut consumed: HashSet<PathBuf> = HashSet::new();

    let load_list_path = root.join(LOAD_LIST_NAME);
    if load_list_path.is_file() {
        let load_list = list::read_load_list(&load_list_path)?;
        tracing::debug!(
            path = %load_list_path.display(),
            entries = load_list.entries.len(),
            "decoded load list"
        );
        version.get_or_insert(load_list.version);
        let jobs: Vec<(&list::LoadEntry, Option<PathBuf>)> = load_list
            .entries
            .iter()
            .map(|e| (e, locate_artifact(root, &e.file_name)))
            .collect();
        for (_, path) in &jobs {
            if let Some(path) = path {
                consumed.insert(path.clone());
            }
        }
        let loads = jobs
            .par_iter()
            .map(|(entry, path)| decode_listed_load(root_dir.as_ref(), entry, path.as_deref()))
            .collect::<Result<Vec<_>>>()?;
        for load in loads {
            set.add_load(load);
        }
    }

    let batch_list_path = root.join(BATCH_LIST_NAME);
    if batch_list_path.is_file() {
        let batch_list = list::read_batch_list(&batch_list_path)?;
        tracing::debug!(
            path = %batch_list_path.display(),
            entries = batch_list.entries.len(),
            "decoded batch list"
        );
        version.get_or_insert(batch_list.version);
        let jobs: Vec<(&list::BatchEntry, Option<PathBuf>)> = batch_list
            .entries
            .iter()
            .map(|e| (e, locate_artifact(root, &e.file_name)))
            .collect();
        for (_, path) in &jobs {
            if let Some(path) = path {
                consumed.insert(path.clone());
            }
        }
        let batches = jobs
            .par_iter()
            .map(|(entry, path)| decode_listed_batch(entry, path.as_deref()))
            .collect::<Result<Vec<_>>>()?;
        for batch in batches {
            set.add_batch(batch);
        }
    }

    // Headers not referenced by any list still belong to the medium.
    let (stray_luh, stray_lub) = header_artifacts(root, &consumed);
    let stray_loads = stray_luh
        .par_iter()
        .map(|path| -> Result<Load> {
            let mut load = header::read_load_header(path)?;
            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
            attach_load_files(&mut load, root_dir.as_ref(), name);
            Ok(load)
        })
        .collect::<Result<Vec<_>>>()?;
    for (path, load) in stray_luh.iter().zip(stray_loads) {
        let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.clone());
        tracing::debug!(path = %rel.display(), part_number = %load.part_number, "stray load header");
        set.add_load(load);
    }
    let stray_batches = stray_lub
        .par_iter()
        .map(|path| header::read_batch_header(path))
        .collect::<Result<Vec<_>>>()?;
    for (path, batch) in stray_lub.iter().zip(stray_batches) {
        let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.clone());
        tracing::debug!(path = %rel.display(), name = %batch.name, "stray batch header");
        set.add_batch(batch);
    }

    if let Some(dir) = root_dir {
        set.add_directory(dir);
    }
    set.version = version.unwrap_or_default();
    Ok(set)
}

/// Rebuild the directory tree described by a file list. Entry names are
/// slash-separated paths relative to the medium root; payloads are
/// attached from disk when the named data file exists.
fn build_root_directory(root: &Path, file_list: &FileList) -> Result<Directory> {
    let name = root.file_name().and_then(|s| s.to_str()).unwrap_or("media").to_string();
    let mut dir = Directory::new(name);
    let mut seen: HashSet<&str> = HashSet::new();
    for entry in &file_list.entries {
        if !seen.insert(&entry.name) {
            tracing::warn!(name = %entry.name, "duplicate file list entry dropped");
            continue;
        }
        let rel = safe_rel_path(&entry.name)?;
        let mut file = File::with_metadata(base_name(&entry.name), entry.size as u64, entry.checksum);
        let data_path = root.join(rel);
        if data_path.is_file() {
            let payload = std::fs::read(&data_path)
                .with_context(|| format!("read {}", data_path.display()))?;
            file.attach_payload(payload);
        }
        insert_tree_file(&mut dir, &entry.name, file)?;
    }
    Ok(dir)
}

fn insert_tree_file(dir: &mut Directory, rel: &str, file: File) -> Result<()> {
    match rel.split_once('/') {
        None => dir.add_file(file),
        Some((head, rest)) => insert_tree_file(dir.ensure_subdirectory(head), rest, file),
    }
}

fn decode_listed_load(
    root_dir: Option<&Directory>,
    entry: &list::LoadEntry,
    header_path: Option<&Path>,
) -> Result<Load> {
    let mut load = match header_path {
        Some(path) => {
            let load = header::read_load_header(path)?;
            if !load.part_number.is_empty() && load.part_number != entry.part_number {
                tracing::warn!(
                    list = %entry.part_number,
                    header = %load.part_number,
                    "part number differs between load list and header"
                );
            }
            load
        }
        None => {
            tracing::warn!(file = %entry.file_name, "load header missing; using list entry only");
            Load::new(entry.part_number.clone(), Default::default())
        }
    };
    if load.part_number.is_empty() {
        load.part_number = entry.part_number.clone();
    }
    attach_load_files(&mut load, root_dir, &entry.file_name);
    Ok(load)
}

fn decode_listed_batch(entry: &list::BatchEntry, header_path: Option<&Path>) -> Result<Batch> {
    let mut batch = match header_path {
        Some(path) => header::read_batch_header(path)?,
        None => {
            tracing::warn!(file = %entry.file_name, "batch header missing; using list entry only");
            Batch::new(entry.name.clone())
        }
    };
    // The list entry is the richer record; its name wins over the stem.
    if !entry.name.is_empty() && batch.name != entry.name {
        batch.name = entry.name.clone();
    }
    Ok(batch)
}

/// A load's data files are the file-list entries sharing the header's
/// file-name stem, artifacts excluded.
fn attach_load_files(load: &mut Load, root_dir: Option<&Directory>, header_file: &str) {
    let Some(dir) = root_dir else { return };
    let stem = file_stem(header_file);
    if stem.is_empty() {
        return;
    }
    for file in dir.all_files() {
        if !is_artifact_name(&file.name) && file_stem(&file.name) == stem {
            load.files.push(file.clone());
        }
    }
}

/// Resolve a list-file reference: a relative path from the medium root
/// first, then a name search anywhere beneath it.
fn locate_artifact(root: &Path, file_name: &str) -> Option<PathBuf> {
    let rel = match safe_rel_path(file_name) {
        Ok(rel) => rel,
        Err(e) => {
            tracing::warn!(file = %file_name, "unsafe artifact reference ignored: {e}");
            return None;
        }
    };
    let direct = root.join(rel);
    if direct.is_file() {
        return Some(direct);
    }
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .find(|e| e.file_name().to_str() == Some(base_name(file_name)))
        .map(|e| e.into_path())
}

/// *.LUH and *.LUB artifacts beneath the root that no list referenced,
/// in stable path order.
fn header_artifacts(root: &Path, consumed: &HashSet<PathBuf>) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut luh = Vec::new();
    let mut lub = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if consumed.contains(&path) {
            continue;
        }
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("LUH") => luh.push(path),
            Some(ext) if ext.eq_ignore_ascii_case("LUB") => lub.push(path),
            _ => {}
        }
    }
    luh.sort();
    lub.sort();
    (luh, lub)
}

/// Index entries and artifact references must stay beneath the medium
/// root: no absolute paths, no parent traversal.
fn safe_rel_path(name: &str) -> Result<&Path> {
    let path = Path::new(name);
    if path.is_absolute() {
        bail!("absolute paths are not allowed: {name:?}");
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        bail!("parent traversal not allowed: {name:?}");
    }
    Ok(path)
}

/// Artifact names never belong to a load's data files.
fn is_artifact_name(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    upper.ends_with(".LUM") || upper.ends_with(".LUH") || upper.ends_with(".LUB")
}

fn base_name(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}

fn file_stem(name: &str) -> &str {
    let base = base_name(name);
    match base.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => base,
    }
}
