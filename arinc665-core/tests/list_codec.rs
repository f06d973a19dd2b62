use arinc665_core::checksum::digest;
use arinc665_core::error::Arinc665Error;
use arinc665_core::list::{
    decode_batch_list, decode_file_list, decode_load_list, encode_batch_list, encode_file_list,
    encode_load_list, read_file_list, BatchEntry, BatchList, FileEntry, FileList, LoadEntry,
    LoadList, LIST_ENTRY_LEN, LIST_HEADER_LEN,
};
use arinc665_core::set::MediaSetVersion;

fn sample_file_list() -> FileList {
    FileList {
        version: MediaSetVersion::V4,
        entries: vec![
            FileEntry { name: "FMS.bin".to_string(), size: 4096, checksum: Some(digest(b"fms")) },
            FileEntry { name: "NAVDB.dat".to_string(), size: 123, checksum: None },
            FileEntry { name: "CONF/ACMS.cfg".to_string(), size: 7, checksum: Some(digest(b"x")) },
        ],
    }
}

#[test]
fn file_list_round_trip() {
    let list = sample_file_list();
    let raw = encode_file_list(&list).unwrap();
    assert_eq!(raw.len(), LIST_HEADER_LEN + 3 * LIST_ENTRY_LEN);
    let decoded = decode_file_list(&raw).unwrap();
    assert_eq!(decoded.version, list.version);
    assert_eq!(decoded.entries, list.entries);
}

#[test]
fn load_list_round_trip() {
    let list = LoadList {
        version: MediaSetVersion::V5,
        entries: vec![
            LoadEntry { part_number: "ACM-100".to_string(), file_name: "ACM-100.LUH".to_string() },
            LoadEntry { part_number: "FMS-200".to_string(), file_name: "FMS-200.LUH".to_string() },
        ],
    };
    let raw = encode_load_list(&list).unwrap();
    let decoded = decode_load_list(&raw).unwrap();
    assert_eq!(decoded.entries, list.entries);
}

#[test]
fn batch_list_round_trip() {
    let list = BatchList {
        version: MediaSetVersion::V2,
        entries: vec![BatchEntry {
            name: "NIGHT-01".to_string(),
            file_name: "NIGHT-01.LUB".to_string(),
        }],
    };
    let raw = encode_batch_list(&list).unwrap();
    let decoded = decode_batch_list(&raw).unwrap();
    assert_eq!(decoded.version, MediaSetVersion::V2);
    assert_eq!(decoded.entries, list.entries);
}

#[test]
fn truncated_trailing_entry_is_dropped() {
    let list = sample_file_list();
    let mut raw = encode_file_list(&list).unwrap();
    // Cut the last entry short: the decoder keeps the first two and stops.
    raw.truncate(raw.len() - LIST_ENTRY_LEN / 2);
    let decoded = decode_file_list(&raw).unwrap();
    assert_eq!(decoded.entries.len(), 2);
    assert_eq!(decoded.entries, &list.entries[..2]);
}

#[test]
fn count_beyond_body_is_tolerated() {
    let list = sample_file_list();
    let mut raw = encode_file_list(&list).unwrap();
    // Header claims more entries than the body holds.
    raw[8..12].copy_from_slice(&9u32.to_le_bytes());
    let decoded = decode_file_list(&raw).unwrap();
    assert_eq!(decoded.entries.len(), 3);
}

#[test]
fn count_limits_decoded_entries() {
    let list = sample_file_list();
    let mut raw = encode_file_list(&list).unwrap();
    raw[8..12].copy_from_slice(&1u32.to_le_bytes());
    let decoded = decode_file_list(&raw).unwrap();
    assert_eq!(decoded.entries.len(), 1);
}

#[test]
fn short_header_is_invalid() {
    let raw = vec![0u8; LIST_HEADER_LEN - 1];
    assert!(decode_file_list(&raw).is_err());
    assert!(decode_load_list(&raw).is_err());
    assert!(decode_batch_list(&raw).is_err());
}

#[test]
fn unknown_version_falls_back_to_newest() {
    let mut raw = encode_file_list(&FileList::default()).unwrap();
    raw[4..8].copy_from_slice(&77u32.to_le_bytes());
    let decoded = decode_file_list(&raw).unwrap();
    assert_eq!(decoded.version, MediaSetVersion::V5);
}

#[test]
fn oversized_name_fails_encode() {
    let list = FileList {
        version: MediaSetVersion::V5,
        entries: vec![FileEntry { name: "X".repeat(33), size: 0, checksum: None }],
    };
    let err = encode_file_list(&list).unwrap_err();
    match err.downcast_ref::<Arinc665Error>() {
        Some(Arinc665Error::FieldTooLong { limit: 32, actual: 33, .. }) => {}
        other => panic!("expected FieldTooLong, got {other:?}"),
    }
}

#[test]
fn missing_artifact_is_invalid_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("FILES.LUM");
    let err = read_file_list(&path).unwrap_err();
    match err.downcast_ref::<Arinc665Error>() {
        Some(Arinc665Error::InvalidFormat { path: p, .. }) => assert_eq!(p, &path),
        other => panic!("expected InvalidFormat, got {other:?}"),
    }
}

#[test]
fn decode_failure_names_the_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("LOADS.LUM");
    std::fs::write(&path, [0u8; 4]).unwrap();
    let err = arinc665_core::list::read_load_list(&path).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("LOADS.LUM"), "message should name the artifact: {msg}");
}
