use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use sha2::{Digest, Sha256};

use crate::vfs::VfsFile;

/// Partition filesystem constants. PFS0 is the loose-package table of
/// contents; HFS0 is the card-image variant that additionally carries a
/// SHA-256 over the leading bytes of every entry.
pub const PFS0_MAGIC: &[u8; 4] = b"PFS0";
pub const HFS0_MAGIC: &[u8; 4] = b"HFS0";

const HEADER_SIZE: usize = 0x10;
const PFS0_ENTRY_SIZE: usize = 0x18;
const HFS0_ENTRY_SIZE: usize = 0x40;

/// The effective file list of one partition image.
#[derive(Clone, Debug, Default)]
pub struct Partition {
    files: Vec<VfsFile>,
}

impl Partition {
    pub fn files(&self) -> &[VfsFile] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&VfsFile> {
        self.files.iter().find(|file| file.name() == name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Whether `image` starts with the PFS0 magic.
pub fn is_pfs0(image: &VfsFile) -> bool {
    image.read_at(0, 4) == Some(&PFS0_MAGIC[..])
}

/// Parse a PFS0 image into its file list.
pub fn parse_pfs0(image: &VfsFile) -> Result<Partition, String> {
    let (count, table_size) = read_header(image, PFS0_MAGIC)?;
    let entries_end = HEADER_SIZE + count * PFS0_ENTRY_SIZE;
    let strings = string_table(image, entries_end, table_size)?;
    let data_base = (entries_end + table_size) as u64;

    let mut files = Vec::with_capacity(count);
    for index in 0..count {
        let entry = image
            .read_at((HEADER_SIZE + index * PFS0_ENTRY_SIZE) as u64, PFS0_ENTRY_SIZE)
            .ok_or_else(|| truncated(image, "entry table"))?;
        let mut cursor = Cursor::new(entry);
        let offset = read_u64(&mut cursor, image)?;
        let size = read_u64(&mut cursor, image)?;
        let name_offset = read_u32(&mut cursor, image)? as usize;

        let name = entry_name(strings, name_offset, image)?;
        let file = image
            .slice(&name, data_base + offset, size)
            .ok_or_else(|| format!("{}: entry '{}' lies outside the image", image.name(), name))?;
        files.push(file);
    }
    Ok(Partition { files })
}

/// Parse an HFS0 image into its file list, optionally checking each entry's
/// hash over its leading hashed-region bytes.
pub fn parse_hfs0(image: &VfsFile, verify: bool) -> Result<Partition, String> {
    let (count, table_size) = read_header(image, HFS0_MAGIC)?;
    let entries_end = HEADER_SIZE + count * HFS0_ENTRY_SIZE;
    let strings = string_table(image, entries_end, table_size)?;
    let data_base = (entries_end + table_size) as u64;

    let mut files = Vec::with_capacity(count);
    for index in 0..count {
        let entry = image
            .read_at((HEADER_SIZE + index * HFS0_ENTRY_SIZE) as u64, HFS0_ENTRY_SIZE)
            .ok_or_else(|| truncated(image, "entry table"))?;
        let mut cursor = Cursor::new(entry);
        let offset = read_u64(&mut cursor, image)?;
        let size = read_u64(&mut cursor, image)?;
        let name_offset = read_u32(&mut cursor, image)? as usize;
        let hashed_size = read_u32(&mut cursor, image)? as u64;

        let name = entry_name(strings, name_offset, image)?;
        let file = image
            .slice(&name, data_base + offset, size)
            .ok_or_else(|| format!("{}: entry '{}' lies outside the image", image.name(), name))?;

        if verify {
            let hashed = hashed_size.min(size) as usize;
            let region = file
                .read_at(0, hashed)
                .ok_or_else(|| format!("{}: hashed region of '{}' truncated", image.name(), name))?;
            let digest = Sha256::digest(region);
            if digest.as_slice() != &entry[0x20..0x40] {
                return Err(format!(
                    "{}: hash mismatch for entry '{}'",
                    image.name(),
                    name
                ));
            }
        }
        files.push(file);
    }
    Ok(Partition { files })
}

fn read_header(image: &VfsFile, magic: &[u8; 4]) -> Result<(usize, usize), String> {
    let header = image
        .read_at(0, HEADER_SIZE)
        .ok_or_else(|| truncated(image, "header"))?;
    if &header[0..4] != magic {
        return Err(format!("{}: bad partition magic", image.name()));
    }
    let mut cursor = Cursor::new(&header[4..]);
    let count = read_u32(&mut cursor, image)? as usize;
    let table_size = read_u32(&mut cursor, image)? as usize;
    Ok((count, table_size))
}

fn string_table<'a>(
    image: &'a VfsFile,
    offset: usize,
    size: usize,
) -> Result<&'a [u8], String> {
    image
        .read_at(offset as u64, size)
        .ok_or_else(|| truncated(image, "string table"))
}

fn entry_name(strings: &[u8], offset: usize, image: &VfsFile) -> Result<String, String> {
    let tail = strings
        .get(offset..)
        .ok_or_else(|| format!("{}: name offset outside string table", image.name()))?;
    let raw = tail
        .split(|byte| *byte == 0)
        .next()
        .unwrap_or(&[]);
    let name = std::str::from_utf8(raw)
        .map_err(|_| format!("{}: entry name is not UTF-8", image.name()))?;
    if name.is_empty() {
        return Err(format!("{}: empty entry name", image.name()));
    }
    Ok(name.to_string())
}

fn read_u32(cursor: &mut Cursor<&[u8]>, image: &VfsFile) -> Result<u32, String> {
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| format!("{}: short read: {}", image.name(), e))
}

fn read_u64(cursor: &mut Cursor<&[u8]>, image: &VfsFile) -> Result<u64, String> {
    cursor
        .read_u64::<LittleEndian>()
        .map_err(|e| format!("{}: short read: {}", image.name(), e))
}

fn truncated(image: &VfsFile, what: &str) -> String {
    format!("{}: truncated partition {}", image.name(), what)
}
