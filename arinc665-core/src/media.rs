use crate::checksum::{self, Digest};
use anyhow::{bail, Result};

/// A data file carried by a media set.
///
/// The payload is optional: entries decoded from an index record carry
/// metadata only until the data file itself is read from disk.
#[derive(Clone, Debug, Default)]
pub struct File {
    pub name: String,
    pub size: u64,
    pub checksum: Option<Digest>,
    payload: Option<Vec<u8>>,
}

impl File {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Metadata-only file, as produced by the file-list codec.
    pub fn with_metadata(name: impl Into<String>, size: u64, checksum: Option<Digest>) -> Self {
        Self { name: name.into(), size, checksum, payload: None }
    }

    /// File whose size and checksum are derived from `payload`.
    pub fn from_payload(name: impl Into<String>, payload: Vec<u8>) -> Self {
        let mut file = Self::new(name);
        file.set_payload(payload);
        file
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Replace the payload, refreshing size and checksum to match.
    pub fn set_payload(&mut self, payload: Vec<u8>) {
        self.size = payload.len() as u64;
        self.checksum = Some(checksum::digest(&payload));
        self.payload = Some(payload);
    }

    /// Attach a payload without touching the recorded size or checksum,
    /// so the payload can later be verified against them.
    pub fn attach_payload(&mut self, payload: Vec<u8>) {
        self.payload = Some(payload);
    }

    /// Recompute the payload digest and compare against the recorded
    /// checksum. Fails closed: absent payload or absent checksum is `false`.
    pub fn verify_checksum(&self) -> bool {
        match (&self.payload, &self.checksum) {
            (Some(data), Some(sum)) => checksum::verify(data, sum),
            _ => false,
        }
    }
}

/// A directory of the media set tree. Owns its files and subdirectories
/// exclusively; paths are reconstructed while walking down from the root,
/// so no parent pointers exist.
#[derive(Clone, Debug, Default)]
pub struct Directory {
    pub name: String,
    subdirectories: Vec<Directory>,
    files: Vec<File>,
}

impl Directory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn subdirectories(&self) -> &[Directory] {
        &self.subdirectories
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Take ownership of a subdirectory.
    pub fn add_subdirectory(&mut self, dir: Directory) {
        self.subdirectories.push(dir);
    }

    /// Find or create a direct subdirectory by name.
    pub fn ensure_subdirectory(&mut self, name: &str) -> &mut Directory {
        let idx = match self.subdirectories.iter().position(|d| d.name == name) {
            Some(idx) => idx,
            None => {
                self.subdirectories.push(Directory::new(name));
                self.subdirectories.len() - 1
            }
        };
        &mut self.subdirectories[idx]
    }

    /// Take ownership of a file. A name may appear at most once per
    /// directory.
    pub fn add_file(&mut self, file: File) -> Result<()> {
        if self.files.iter().any(|f| f.name == file.name) {
            bail!("duplicate file name {:?} in directory {:?}", file.name, self.name);
        }
        self.files.push(file);
        Ok(())
    }

    /// First file with the given name anywhere in this subtree, pre-order.
    pub fn find_file(&self, name: &str) -> Option<&File> {
        self.all_files().find(|f| f.name == name)
    }

    /// Every file in this subtree, pre-order: own files in declaration
    /// order, then each subdirectory in declaration order. Each call walks
    /// the tree afresh, so the sequence is restartable.
    pub fn all_files(&self) -> AllFiles<'_> {
        AllFiles {
            files: self.files.iter(),
            pending: self.subdirectories.iter().rev().collect(),
        }
    }

    /// Total byte size of every file in this subtree.
    pub fn total_size(&self) -> u64 {
        self.all_files().map(|f| f.size).sum()
    }
}

/// Lazy pre-order file walk over a directory subtree.
pub struct AllFiles<'a> {
    files: std::slice::Iter<'a, File>,
    pending: Vec<&'a Directory>, // LIFO; next directory to visit on top
}

impl<'a> Iterator for AllFiles<'a> {
    type Item = &'a File;

    fn next(&mut self) -> Option<&'a File> {
        loop {
            if let Some(file) = self.files.next() {
                return Some(file);
            }
            let dir = self.pending.pop()?;
            self.files = dir.files.iter();
            for sub in dir.subdirectories.iter().rev() {
                self.pending.push(sub);
            }
        }
    }
}
