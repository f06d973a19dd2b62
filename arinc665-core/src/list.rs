//! Codecs for the three index artifacts at the root of a media set
//! directory: FILES.LUM, LOADS.LUM and BATCHES.LUM. All three share one
//! shape: a fixed 32-byte header followed by fixed 64-byte entries.

use crate::checksum::{Digest, DIGEST_LEN};
use crate::error::Arinc665Error;
use crate::set::MediaSetVersion;
use anyhow::{bail, Context, Result};
use crc32fast::Hasher as Crc32;
use std::path::Path;

/// Header layout: magic (4) + format version (u32 LE) + entry count
/// (u32 LE) + entry CRC-32 (u32 LE) + zero padding to 32 bytes.
pub const LIST_MAGIC: &[u8] = b"A665";
pub const LIST_HEADER_LEN: usize = 32;
pub const LIST_ENTRY_LEN: usize = 64;
const COUNT_OFFSET: usize = 8;
const NAME_LEN: usize = 32;

/// FILES.LUM entry: filename (32, NUL-padded) + size (u32 LE) +
/// checksum (16) + reserved to 64. An all-zero checksum field decodes to
/// "no checksum recorded".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size: u32,
    pub checksum: Option<Digest>,
}

/// LOADS.LUM entry: part number (32) + header file name (32).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadEntry {
    pub part_number: String,
    pub file_name: String,
}

/// BATCHES.LUM entry: batch name (32) + header file name (32).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchEntry {
    pub name: String,
    pub file_name: String,
}

#[derive(Clone, Debug, Default)]
pub struct FileList {
    pub version: MediaSetVersion,
    pub entries: Vec<FileEntry>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadList {
    pub version: MediaSetVersion,
    pub entries: Vec<LoadEntry>,
}

#[derive(Clone, Debug, Default)]
pub struct BatchList {
    pub version: MediaSetVersion,
    pub entries: Vec<BatchEntry>,
}

/// Read the version and entry count out of a list header. Only the length
/// and the count field are binding; an unknown version falls back to the
/// newest revision and an unexpected magic is tolerated.
fn decode_header(data: &[u8]) -> Result<(MediaSetVersion, usize)> {
    if data.len() < LIST_HEADER_LEN {
        bail!("header too short: {} bytes (need {LIST_HEADER_LEN})", data.len());
    }
    if &data[..LIST_MAGIC.len()] != LIST_MAGIC {
        tracing::debug!("unexpected list magic {:02x?}", &data[..LIST_MAGIC.len()]);
    }
    let version = u32::from_le_bytes(data[4..8].try_into()?);
    let version = MediaSetVersion::from_u32(version).unwrap_or_default();
    let count = u32::from_le_bytes(data[COUNT_OFFSET..COUNT_OFFSET + 4].try_into()?) as usize;
    Ok((version, count))
}

/// Whole entries after the header, at most `count` of them. A truncated
/// trailing entry is dropped, never an error.
fn entry_slices(data: &[u8], count: usize) -> impl Iterator<Item = &[u8]> {
    data[LIST_HEADER_LEN..].chunks_exact(LIST_ENTRY_LEN).take(count)
}

/// Decode a NUL-padded ASCII text field.
pub(crate) fn text_field(bytes: &[u8]) -> Result<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = std::str::from_utf8(&bytes[..end]).context("text field is not valid ASCII")?;
    if !text.is_ascii() {
        bail!("text field is not valid ASCII: {text:?}");
    }
    Ok(text.to_string())
}

/// NUL-pad `text` into `buf`, failing when it does not fit.
pub(crate) fn put_text_field(buf: &mut [u8], field: &'static str, text: &str) -> Result<()> {
    let bytes = text.as_bytes();
    if bytes.len() > buf.len() {
        return Err(Arinc665Error::FieldTooLong {
            field,
            limit: buf.len(),
            actual: bytes.len(),
        }
        .into());
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

pub(crate) fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Arinc665Error::invalid_format(path, e))
}

pub fn decode_file_list(data: &[u8]) -> Result<FileList> {
    let (version, count) = decode_header(data)?;
    let mut entries = Vec::new();
    for (i, raw) in entry_slices(data, count).enumerate() {
        let name = text_field(&raw[..NAME_LEN]).with_context(|| format!("file entry {i}"))?;
        let size = u32::from_le_bytes(raw[32..36].try_into()?);
        let mut sum = [0u8; DIGEST_LEN];
        sum.copy_from_slice(&raw[36..36 + DIGEST_LEN]);
        let checksum =
            if sum.iter().all(|&b| b == 0) { None } else { Some(Digest::from_bytes(sum)) };
        entries.push(FileEntry { name, size, checksum });
    }
    Ok(FileList { version, entries })
}

pub fn decode_load_list(data: &[u8]) -> Result<LoadList> {
    let (version, count) = decode_header(data)?;
    let mut entries = Vec::new();
    for (i, raw) in entry_slices(data, count).enumerate() {
        let part_number =
            text_field(&raw[..NAME_LEN]).with_context(|| format!("load entry {i}"))?;
        let file_name =
            text_field(&raw[NAME_LEN..]).with_context(|| format!("load entry {i}"))?;
        entries.push(LoadEntry { part_number, file_name });
    }
    Ok(LoadList { version, entries })
}

pub fn decode_batch_list(data: &[u8]) -> Result<BatchList> {
    let (version, count) = decode_header(data)?;
    let mut entries = Vec::new();
    for (i, raw) in entry_slices(data, count).enumerate() {
        let name = text_field(&raw[..NAME_LEN]).with_context(|| format!("batch entry {i}"))?;
        let file_name =
            text_field(&raw[NAME_LEN..]).with_context(|| format!("batch entry {i}"))?;
        entries.push(BatchEntry { name, file_name });
    }
    Ok(BatchList { version, entries })
}

fn with_header(version: MediaSetVersion, count: usize, body: Vec<u8>) -> Vec<u8> {
    let mut hasher = Crc32::new();
    hasher.update(&body);
    let crc = hasher.finalize();
    let mut out = Vec::with_capacity(LIST_HEADER_LEN + body.len());
    out.extend_from_slice(LIST_MAGIC);
    out.extend_from_slice(&version.as_u32().to_le_bytes());
    out.extend_from_slice(&(count as u32).to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.resize(LIST_HEADER_LEN, 0);
    out.extend_from_slice(&body);
    out
}

pub fn encode_file_list(list: &FileList) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(list.entries.len() * LIST_ENTRY_LEN);
    for entry in &list.entries {
        let mut raw = [0u8; LIST_ENTRY_LEN];
        put_text_field(&mut raw[..NAME_LEN], "filename", &entry.name)?;
        raw[32..36].copy_from_slice(&entry.size.to_le_bytes());
        if let Some(sum) = &entry.checksum {
            raw[36..36 + DIGEST_LEN].copy_from_slice(sum.as_bytes());
        }
        body.extend_from_slice(&raw);
    }
    Ok(with_header(list.version, list.entries.len(), body))
}

pub fn encode_load_list(list: &LoadList) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(list.entries.len() * LIST_ENTRY_LEN);
    for entry in &list.entries {
        let mut raw = [0u8; LIST_ENTRY_LEN];
        put_text_field(&mut raw[..NAME_LEN], "part number", &entry.part_number)?;
        put_text_field(&mut raw[NAME_LEN..], "filename", &entry.file_name)?;
        body.extend_from_slice(&raw);
    }
    Ok(with_header(list.version, list.entries.len(), body))
}

pub fn encode_batch_list(list: &BatchList) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(list.entries.len() * LIST_ENTRY_LEN);
    for entry in &list.entries {
        let mut raw = [0u8; LIST_ENTRY_LEN];
        put_text_field(&mut raw[..NAME_LEN], "batch name", &entry.name)?;
        put_text_field(&mut raw[NAME_LEN..], "filename", &entry.file_name)?;
        body.extend_from_slice(&raw);
    }
    Ok(with_header(list.version, list.entries.len(), body))
}

/// Read and decode FILES.LUM, attaching the path to any failure.
pub fn read_file_list(path: &Path) -> Result<FileList> {
    let data = read_artifact(path)?;
    decode_file_list(&data).map_err(|e| Arinc665Error::invalid_format(path, format!("{e:#}")))
}

/// Read and decode LOADS.LUM, attaching the path to any failure.
pub fn read_load_list(path: &Path) -> Result<LoadList> {
    let data = read_artifact(path)?;
    decode_load_list(&data).map_err(|e| Arinc665Error::invalid_format(path, format!("{e:#}")))
}

/// Read and decode BATCHES.LUM, attaching the path to any failure.
pub fn read_batch_list(path: &Path) -> Result<BatchList> {
    let data = read_artifact(path)?;
    decode_batch_list(&data).map_err(|e| Arinc665Error::invalid_format(path, format!("{e:#}")))
}
