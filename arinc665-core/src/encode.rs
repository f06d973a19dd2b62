//! Writes a `MediaSet` to its native on-disk directory layout: the three
//! index files, one *.LUH per load, one *.LUB per batch, and the
//! payload-bearing data files of the directory tree.

use crate::decode::{BATCH_LIST_NAME, FILE_LIST_NAME, LOAD_LIST_NAME};
use crate::header;
use crate::list;
use crate::media::{Directory, File};
use crate::set::MediaSet;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Write a media set under `out`. Decoding the resulting directory yields
/// an equivalent set, as far as the native layout can carry it: batch
/// load references and execution orders only live in the interchange
/// document.
pub fn write_media_set(set: &MediaSet, out: &Path) -> Result<()> {
    std::fs::create_dir_all(out).with_context(|| format!("create {}", out.display()))?;

    let tree_files = collect_tree_files(set);
    if !tree_files.is_empty() {
        let mut entries = Vec::with_capacity(tree_files.len());
        for (rel, file) in &tree_files {
            if file.size > u64::from(u32::MAX) {
                bail!("file {} too large for the size field: {} bytes", rel, file.size);
            }
            entries.push(list::FileEntry {
                name: rel.clone(),
                size: file.size as u32,
                checksum: file.checksum,
            });
            if let Some(payload) = file.payload() {
                let path = out.join(rel);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("create {}", parent.display()))?;
                }
                std::fs::write(&path, payload)
                    .with_context(|| format!("write {}", path.display()))?;
            }
        }
        let file_list = list::FileList { version: set.version, entries };
        std::fs::write(out.join(FILE_LIST_NAME), list::encode_file_list(&file_list)?)
            .with_context(|| format!("write {FILE_LIST_NAME}"))?;
        tracing::debug!(entries = tree_files.len(), "wrote file list");
    }

    if !set.loads.is_empty() {
        let mut entries = Vec::with_capacity(set.loads.len());
        for load in &set.loads {
            let file_name = format!("{}.LUH", load.part_number);
            std::fs::write(out.join(&file_name), header::encode_load_header(load)?)
                .with_context(|| format!("write {file_name}"))?;
            entries.push(list::LoadEntry {
                part_number: load.part_number.clone(),
                file_name,
            });
        }
        let load_list = list::LoadList { version: set.version, entries };
        std::fs::write(out.join(LOAD_LIST_NAME), list::encode_load_list(&load_list)?)
            .with_context(|| format!("write {LOAD_LIST_NAME}"))?;
        tracing::debug!(entries = set.loads.len(), "wrote load list");
    }

    if !set.batches.is_empty() {
        let mut entries = Vec::with_capacity(set.batches.len());
        for batch in &set.batches {
            let file_name = format!("{}.LUB", batch.name);
            std::fs::write(out.join(&file_name), header::encode_batch_header())
                .with_context(|| format!("write {file_name}"))?;
            entries.push(list::BatchEntry { name: batch.name.clone(), file_name });
        }
        let batch_list = list::BatchList { version: set.version, entries };
        std::fs::write(out.join(BATCH_LIST_NAME), list::encode_batch_list(&batch_list)?)
            .with_context(|| format!("write {BATCH_LIST_NAME}"))?;
        tracing::debug!(entries = set.batches.len(), "wrote batch list");
    }

    Ok(())
}

/// Pre-order (path, file) pairs across the set's directory trees. With a
/// single root the paths are relative to it; with several, each root's
/// name becomes the leading path component.
fn collect_tree_files(set: &MediaSet) -> Vec<(String, &File)> {
    let mut out = Vec::new();
    let single_root = set.directories.len() == 1;
    for dir in &set.directories {
        let prefix = if single_root { String::new() } else { format!("{}/", dir.name) };
        push_directory(&mut out, dir, &prefix);
    }
    out
}

fn push_directory<'a>(out: &mut Vec<(String, &'a File)>, dir: &'a Directory, prefix: &str) {
    for file in dir.files() {
        out.push((format!("{prefix}{}", file.name), file));
    }
    for sub in dir.subdirectories() {
        push_directory(out, sub, &format!("{prefix}{}/", sub.name));
    }
}
