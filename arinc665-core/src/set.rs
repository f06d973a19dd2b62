use crate::media::{Directory, File};
use crc32fast::Hasher as Crc32;

/// Supported format revisions. Codec differences between revisions are
/// branches on this tag, not trait dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MediaSetVersion {
    V2,
    V3,
    V4,
    #[default]
    V5,
}

impl MediaSetVersion {
    /// Newest supported revision, the default for new sets and for
    /// interchange documents that carry no version.
    pub const NEWEST: MediaSetVersion = MediaSetVersion::V5;

    pub fn as_u32(self) -> u32 {
        match self {
            MediaSetVersion::V2 => 2,
            MediaSetVersion::V3 => 3,
            MediaSetVersion::V4 => 4,
            MediaSetVersion::V5 => 5,
        }
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            2 => Some(MediaSetVersion::V2),
            3 => Some(MediaSetVersion::V3),
            4 => Some(MediaSetVersion::V4),
            5 => Some(MediaSetVersion::V5),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaSetVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Kind of content a load delivers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadType {
    #[default]
    Software,
    Data,
    Configuration,
}

impl LoadType {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadType::Software => "SOFTWARE",
            LoadType::Data => "DATA",
            LoadType::Configuration => "CONFIGURATION",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SOFTWARE" => Some(LoadType::Software),
            "DATA" => Some(LoadType::Data),
            "CONFIGURATION" => Some(LoadType::Configuration),
            _ => None,
        }
    }
}

/// A named, typed package of files delivered as one installable unit.
///
/// The files are held by value: metadata (and, when read from disk, the
/// payload) copied out of the owning directory tree, so the set stays an
/// aliasing-free owned structure.
#[derive(Clone, Debug, Default)]
pub struct Load {
    pub part_number: String,
    pub load_type: LoadType,
    pub description: Option<String>,
    pub files: Vec<File>,
    pub target_hardware_ids: Vec<String>,
    pub check_value: Option<u32>,
}

impl Load {
    pub fn new(part_number: impl Into<String>, load_type: LoadType) -> Self {
        Self { part_number: part_number.into(), load_type, ..Default::default() }
    }

    pub fn add_file(&mut self, file: File) {
        self.files.push(file);
    }

    pub fn add_target_hardware_id(&mut self, id: impl Into<String>) {
        self.target_hardware_ids.push(id.into());
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Deterministic 32-bit check value over the referenced file sizes:
    /// CRC-32 of each size as 8 little-endian bytes, in declaration order.
    pub fn calculate_check_value(&self) -> u32 {
        let mut hasher = Crc32::new();
        for file in &self.files {
            hasher.update(&file.size.to_le_bytes());
        }
        hasher.finalize()
    }
}

/// A named installation sequence. Loads are referenced by part number,
/// never owned; the execution order must stay within the referenced set
/// (checked by validation, not on construction).
#[derive(Clone, Debug, Default)]
pub struct Batch {
    pub name: String,
    pub description: Option<String>,
    pub loads: Vec<String>,
    pub execution_order: Vec<String>,
}

impl Batch {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Reference a load by part number. Duplicates are ignored.
    pub fn add_load(&mut self, part_number: impl Into<String>) {
        let pn = part_number.into();
        if !self.loads.contains(&pn) {
            self.loads.push(pn);
        }
    }

    /// Append to the execution order; a part number runs at most once.
    pub fn add_to_execution_order(&mut self, part_number: impl Into<String>) {
        let pn = part_number.into();
        if !self.execution_order.contains(&pn) {
            self.execution_order.push(pn);
        }
    }

    /// True when every part number in the execution order names a
    /// referenced load.
    pub fn execution_order_resolves(&self) -> bool {
        self.execution_order.iter().all(|pn| self.loads.contains(pn))
    }
}

/// The complete, versioned package of loads, batches and supporting files.
/// Owns every directory, load and batch reachable from it.
#[derive(Clone, Debug, Default)]
pub struct MediaSet {
    pub version: MediaSetVersion,
    pub directories: Vec<Directory>,
    pub loads: Vec<Load>,
    pub batches: Vec<Batch>,
}

impl MediaSet {
    pub fn new(version: MediaSetVersion) -> Self {
        Self { version, ..Default::default() }
    }

    pub fn add_directory(&mut self, dir: Directory) {
        self.directories.push(dir);
    }

    pub fn add_load(&mut self, load: Load) {
        self.loads.push(load);
    }

    pub fn add_batch(&mut self, batch: Batch) {
        self.batches.push(batch);
    }

    pub fn find_load(&self, part_number: &str) -> Option<&Load> {
        self.loads.iter().find(|l| l.part_number == part_number)
    }

    pub fn find_batch(&self, name: &str) -> Option<&Batch> {
        self.batches.iter().find(|b| b.name == name)
    }

    /// First file with the given name across the root directories,
    /// pre-order.
    pub fn find_file(&self, name: &str) -> Option<&File> {
        self.directories.iter().find_map(|d| d.find_file(name))
    }
}
