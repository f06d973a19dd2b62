use arinc665_core::checksum::digest;
use arinc665_core::media::{Directory, File};

fn tree_with_subdir() -> Directory {
    // root holds A, a subdirectory holds B
    let mut root = Directory::new("root");
    root.add_file(File::from_payload("A", b"aaaa".to_vec())).unwrap();
    let mut sub = Directory::new("sub");
    sub.add_file(File::from_payload("B", b"bb".to_vec())).unwrap();
    root.add_subdirectory(sub);
    root
}

#[test]
fn all_files_is_preorder() {
    let root = tree_with_subdir();
    let names: Vec<&str> = root.all_files().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["A", "B"]);
}

#[test]
fn all_files_is_restartable() {
    let root = tree_with_subdir();
    let first: Vec<String> = root.all_files().map(|f| f.name.clone()).collect();
    let second: Vec<String> = root.all_files().map(|f| f.name.clone()).collect();
    assert_eq!(first, second);
}

#[test]
fn all_files_visits_own_files_before_recursing() {
    let mut root = Directory::new("root");
    let mut first = Directory::new("first");
    first.add_file(File::new("C")).unwrap();
    let mut second = Directory::new("second");
    second.add_file(File::new("D")).unwrap();
    root.add_subdirectory(first);
    root.add_subdirectory(second);
    root.add_file(File::new("A")).unwrap();
    root.add_file(File::new("B")).unwrap();

    let names: Vec<&str> = root.all_files().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["A", "B", "C", "D"]);
}

#[test]
fn duplicate_file_name_rejected() {
    let mut dir = Directory::new("root");
    dir.add_file(File::new("A")).unwrap();
    assert!(dir.add_file(File::new("A")).is_err());
    assert_eq!(dir.files().len(), 1);
}

#[test]
fn find_file_searches_subtree() {
    let root = tree_with_subdir();
    assert_eq!(root.find_file("B").map(|f| f.size), Some(2));
    assert!(root.find_file("missing").is_none());
}

#[test]
fn verify_checksum_fails_closed() {
    // no payload, no checksum
    assert!(!File::new("empty").verify_checksum());
    // checksum without payload
    let meta = File::with_metadata("meta", 4, Some(digest(b"data")));
    assert!(!meta.verify_checksum());
    // payload without checksum
    let mut raw = File::new("raw");
    raw.attach_payload(b"data".to_vec());
    assert!(!raw.verify_checksum());
}

#[test]
fn verify_checksum_detects_corruption() {
    let good = File::from_payload("ok", b"payload".to_vec());
    assert!(good.verify_checksum());

    let mut bad = File::with_metadata("bad", 7, Some(digest(b"payload")));
    bad.attach_payload(b"pAyload".to_vec());
    assert!(!bad.verify_checksum());
}

#[test]
fn set_payload_refreshes_metadata() {
    let mut file = File::new("F");
    file.set_payload(b"12345".to_vec());
    assert_eq!(file.size, 5);
    assert_eq!(file.checksum, Some(digest(b"12345")));
    assert!(file.verify_checksum());
}

#[test]
fn attach_payload_keeps_recorded_metadata() {
    let mut file = File::with_metadata("F", 5, Some(digest(b"12345")));
    file.attach_payload(b"12345".to_vec());
    assert_eq!(file.size, 5);
    assert!(file.verify_checksum());
}

#[test]
fn total_size_spans_subtree() {
    let root = tree_with_subdir();
    assert_eq!(root.total_size(), 6);
}
