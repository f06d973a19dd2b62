//! Per-load (*.LUH) and per-batch (*.LUB) header artifacts.

use crate::error::Arinc665Error;
use crate::list::{put_text_field, read_artifact, text_field};
use crate::set::{Batch, Load, LoadType};
use anyhow::{bail, Result};
use std::path::Path;

/// Load header layout: magic (4) + part number (32, NUL-padded).
pub const LOAD_HEADER_MAGIC: &[u8] = b"LUH\0";
pub const LOAD_HEADER_LEN: usize = 36;

/// Batch header layout: magic (4) + zero padding. The batch name is taken
/// from the artifact's file-name stem, not from the header itself.
pub const BATCH_HEADER_MAGIC: &[u8] = b"LUB\0";
pub const BATCH_HEADER_LEN: usize = 32;

/// Decode a load header. The header alone yields a load with no files;
/// the directory decoder attaches them from the file list.
pub fn decode_load_header(data: &[u8]) -> Result<Load> {
    if data.len() < LOAD_HEADER_LEN {
        bail!("load header too short: {} bytes (need {LOAD_HEADER_LEN})", data.len());
    }
    let part_number = text_field(&data[4..LOAD_HEADER_LEN])?;
    Ok(Load::new(part_number, LoadType::default()))
}

pub fn encode_load_header(load: &Load) -> Result<Vec<u8>> {
    let mut out = vec![0u8; LOAD_HEADER_LEN];
    out[..4].copy_from_slice(LOAD_HEADER_MAGIC);
    put_text_field(&mut out[4..LOAD_HEADER_LEN], "part number", &load.part_number)?;
    Ok(out)
}

/// Read and decode a *.LUH artifact, attaching the path to any failure.
pub fn read_load_header(path: &Path) -> Result<Load> {
    let data = read_artifact(path)?;
    decode_load_header(&data).map_err(|e| Arinc665Error::invalid_format(path, format!("{e:#}")))
}

pub fn encode_batch_header() -> Vec<u8> {
    let mut out = vec![0u8; BATCH_HEADER_LEN];
    out[..4].copy_from_slice(BATCH_HEADER_MAGIC);
    out
}

/// Read and decode a *.LUB artifact. The batch name comes from the
/// file-name stem.
pub fn read_batch_header(path: &Path) -> Result<Batch> {
    let data = read_artifact(path)?;
    if data.len() < BATCH_HEADER_LEN {
        return Err(Arinc665Error::invalid_format(
            path,
            format!("batch header too short: {} bytes (need {BATCH_HEADER_LEN})", data.len()),
        ));
    }
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    Ok(Batch::new(name))
}
