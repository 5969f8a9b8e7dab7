use std::{collections::HashMap, fs, path::Path, sync::Arc};

/// A named, immutable, random-access byte window. Sub-windows created with
/// [`VfsFile::slice`] share the backing buffer, so nested container lookups
/// never copy payload bytes.
#[derive(Clone, Debug)]
pub struct VfsFile {
    name: String,
    data: Arc<Vec<u8>>,
    offset: usize,
    len: usize,
}

impl VfsFile {
    pub fn new(name: &str, data: Vec<u8>) -> Self {
        let len = data.len();
        VfsFile {
            name: name.to_string(),
            data: Arc::new(data),
            offset: 0,
            len,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> u64 {
        self.len as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[self.offset..self.offset + self.len]
    }

    /// Bounds-checked read of `len` bytes starting at `offset`.
    pub fn read_at(&self, offset: u64, len: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(len)?;
        self.bytes().get(start..end)
    }

    /// A named sub-window of this file. Returns [`None`] when the requested
    /// region does not lie within this window.
    pub fn slice(&self, name: &str, offset: u64, len: u64) -> Option<VfsFile> {
        let rel = usize::try_from(offset).ok()?;
        let len = usize::try_from(len).ok()?;
        let start = self.offset.checked_add(rel)?;
        let end = start.checked_add(len)?;
        if end > self.offset + self.len {
            return None;
        }
        Some(VfsFile {
            name: name.to_string(),
            data: Arc::clone(&self.data),
            offset: start,
            len,
        })
    }
}

/// Read-only path lookup. Implementations return [`None`] for anything that
/// cannot be opened; the caller decides what a missing file means.
pub trait VirtualFilesystem {
    fn open(&self, path: &str) -> Option<VfsFile>;
}

/// Opens paths from the host filesystem, reading the whole file up front.
pub struct HostFilesystem;

impl VirtualFilesystem for HostFilesystem {
    fn open(&self, path: &str) -> Option<VfsFile> {
        let data = fs::read(path).ok()?;
        Some(VfsFile::new(file_name(path), data))
    }
}

/// A path -> bytes map. Used by the test suite and by embedders that already
/// hold container images in memory.
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, data: Vec<u8>) {
        self.files.insert(path.to_string(), data);
    }
}

impl VirtualFilesystem for MemoryFilesystem {
    fn open(&self, path: &str) -> Option<VfsFile> {
        let data = self.files.get(path)?.clone();
        Some(VfsFile::new(file_name(path), data))
    }
}

/// The final component of a path, or the path itself when it has none.
pub fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

/// The file name with its last extension removed.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}
