//! Lossless XML interchange of the load and batch content of a media set.
//!
//! The document carries loads (part number, type, description, file
//! references) and batches (name, description, execution order). The
//! directory tree is not part of the interchange document; the native
//! layout is its only carrier.

use crate::checksum::Digest;
use crate::error::Arinc665Error;
use crate::media::File;
use crate::set::{Batch, Load, LoadType, MediaSet, MediaSetVersion};
use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::path::Path;

/// Serialize a media set to its interchange document. Deterministic:
/// element and attribute order follow the model order.
pub fn export_xml(set: &MediaSet) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("MediaSet");
    root.push_attribute(("version", set.version.to_string().as_str()));
    writer.write_event(Event::Start(root))?;

    if !set.loads.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("Loads")))?;
        for load in &set.loads {
            write_load(&mut writer, load)?;
        }
        writer.write_event(Event::End(BytesEnd::new("Loads")))?;
    }

    if !set.batches.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("Batches")))?;
        for batch in &set.batches {
            write_batch(&mut writer, batch)?;
        }
        writer.write_event(Event::End(BytesEnd::new("Batches")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("MediaSet")))?;
    String::from_utf8(writer.into_inner()).context("exported document is not UTF-8")
}

fn write_load(writer: &mut Writer<Vec<u8>>, load: &Load) -> Result<()> {
    let mut el = BytesStart::new("Load");
    el.push_attribute(("partNumber", load.part_number.as_str()));
    el.push_attribute(("type", load.load_type.as_str()));
    if load.description.is_none() && load.files.is_empty() {
        writer.write_event(Event::Empty(el))?;
        return Ok(());
    }
    writer.write_event(Event::Start(el))?;
    if let Some(description) = &load.description {
        write_description(writer, description)?;
    }
    if !load.files.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("Files")))?;
        for file in &load.files {
            let mut fe = BytesStart::new("File");
            fe.push_attribute(("name", file.name.as_str()));
            fe.push_attribute(("size", file.size.to_string().as_str()));
            if let Some(sum) = &file.checksum {
                fe.push_attribute(("checksum", sum.to_hex().as_str()));
            }
            writer.write_event(Event::Empty(fe))?;
        }
        writer.write_event(Event::End(BytesEnd::new("Files")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Load")))?;
    Ok(())
}

fn write_batch(writer: &mut Writer<Vec<u8>>, batch: &Batch) -> Result<()> {
    let mut el = BytesStart::new("Batch");
    el.push_attribute(("name", batch.name.as_str()));
    if batch.description.is_none() && batch.execution_order.is_empty() {
        writer.write_event(Event::Empty(el))?;
        return Ok(());
    }
    writer.write_event(Event::Start(el))?;
    if let Some(description) = &batch.description {
        write_description(writer, description)?;
    }
    if !batch.execution_order.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("ExecutionOrder")))?;
        for part_number in &batch.execution_order {
            let mut lr = BytesStart::new("LoadRef");
            lr.push_attribute(("partNumber", part_number.as_str()));
            writer.write_event(Event::Empty(lr))?;
        }
        writer.write_event(Event::End(BytesEnd::new("ExecutionOrder")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Batch")))?;
    Ok(())
}

fn write_description(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("Description")))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("Description")))?;
    Ok(())
}

/// Parse an interchange document back into a media set.
///
/// Missing optional attributes take documented defaults: the version
/// defaults to the newest supported revision, a load's type to SOFTWARE.
/// Unrecognized version or type values fail with `UnsupportedFormat`.
pub fn import_xml(doc: &str) -> Result<MediaSet> {
    let mut reader = Reader::from_str(doc);
    reader.config_mut().trim_text(true);

    let mut set = MediaSet::default();
    let mut root_seen = false;
    let mut current_load: Option<Load> = None;
    let mut current_batch: Option<Batch> = None;
    let mut in_description = false;

    loop {
        let event = reader.read_event().context("malformed interchange document")?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                if !root_seen {
                    if e.name().as_ref() != b"MediaSet" {
                        return Err(Arinc665Error::UnsupportedFormat(
                            "root element must be MediaSet".to_string(),
                        )
                        .into());
                    }
                    root_seen = true;
                    set.version = parse_version(attr(e, "version")?)?;
                    continue;
                }
                match e.name().as_ref() {
                    b"Loads" | b"Batches" | b"Files" | b"ExecutionOrder" => {}
                    b"Load" => {
                        let part_number = attr(e, "partNumber")?.unwrap_or_default();
                        let load_type = parse_load_type(attr(e, "type")?)?;
                        let load = Load::new(part_number, load_type);
                        if empty {
                            set.add_load(load);
                        } else {
                            current_load = Some(load);
                        }
                    }
                    b"File" => {
                        let file = parse_file_ref(e)?;
                        if let Some(load) = current_load.as_mut() {
                            load.add_file(file);
                        }
                    }
                    b"Batch" => {
                        let name = attr(e, "name")?.unwrap_or_default();
                        let batch = Batch::new(name);
                        if empty {
                            set.add_batch(batch);
                        } else {
                            current_batch = Some(batch);
                        }
                    }
                    b"LoadRef" => {
                        if let Some(batch) = current_batch.as_mut() {
                            if let Some(part_number) = attr(e, "partNumber")? {
                                batch.add_to_execution_order(part_number);
                            }
                        }
                    }
                    b"Description" => in_description = !empty,
                    other => {
                        tracing::debug!(
                            element = %String::from_utf8_lossy(other),
                            "ignoring unknown element"
                        );
                    }
                }
            }
            Event::Text(ref t) => {
                if in_description {
                    let text = t.unescape().context("malformed description text")?;
                    if let Some(load) = current_load.as_mut() {
                        load.description = Some(text.into_owned());
                    } else if let Some(batch) = current_batch.as_mut() {
                        batch.description = Some(text.into_owned());
                    }
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"Load" => {
                    if let Some(load) = current_load.take() {
                        set.add_load(load);
                    }
                }
                b"Batch" => {
                    if let Some(batch) = current_batch.take() {
                        set.add_batch(batch);
                    }
                }
                b"Description" => in_description = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(Arinc665Error::UnsupportedFormat(
            "document has no MediaSet root element".to_string(),
        )
        .into());
    }
    Ok(set)
}

/// Write the interchange document for `set` to `path`.
pub fn export_xml_file(set: &MediaSet, path: &Path) -> Result<()> {
    let doc = export_xml(set)?;
    std::fs::write(path, doc).with_context(|| format!("write {}", path.display()))
}

/// Read an interchange document from `path`.
pub fn import_xml_file(path: &Path) -> Result<MediaSet> {
    let doc =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    import_xml(&doc)
}

fn attr(e: &BytesStart, key: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.context("malformed attribute")?;
        if attr.key.as_ref() == key.as_bytes() {
            let value = attr.unescape_value().context("malformed attribute value")?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_version(value: Option<String>) -> Result<MediaSetVersion> {
    let Some(value) = value else {
        return Ok(MediaSetVersion::NEWEST);
    };
    value
        .parse::<u32>()
        .ok()
        .and_then(MediaSetVersion::from_u32)
        .ok_or_else(|| Arinc665Error::UnsupportedFormat(format!("media set version {value:?}")).into())
}

fn parse_load_type(value: Option<String>) -> Result<LoadType> {
    let Some(value) = value else {
        return Ok(LoadType::default());
    };
    LoadType::from_name(&value)
        .ok_or_else(|| Arinc665Error::UnsupportedFormat(format!("load type {value:?}")).into())
}

fn parse_file_ref(e: &BytesStart) -> Result<File> {
    let name = attr(e, "name")?.unwrap_or_default();
    let size = match attr(e, "size")? {
        Some(raw) => raw.parse::<u64>().with_context(|| format!("file size {raw:?}"))?,
        None => 0,
    };
    let checksum = match attr(e, "checksum")? {
        Some(raw) => Some(Digest::from_hex(&raw)?),
        None => None,
    };
    Ok(File::with_metadata(name, size, checksum))
}
