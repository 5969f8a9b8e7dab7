//! Writer counterparts to the readers in this crate. The test suite builds
//! its fixture images with these; embedders can use them to assemble
//! synthetic packages.

use sha2::{Digest, Sha256};

use crate::nca::{ContentType, NCA_MAGIC};
use crate::pfs::{HFS0_MAGIC, PFS0_MAGIC};
use crate::romfs::{NO_ENTRY, ROMFS_HEADER_SIZE};
use crate::xci::XCI_MAGIC;

const MEDIA_UNIT: usize = 0x200;

/// Assemble a PFS0 image from named payloads.
pub fn build_pfs0(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    build_partition(entries, PFS0_MAGIC, false)
}

/// Assemble an HFS0 image. Entry hashes cover the full payload, so any
/// corruption is caught by verification.
pub fn build_hfs0(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    build_partition(entries, HFS0_MAGIC, true)
}

fn build_partition(entries: &[(&str, Vec<u8>)], magic: &[u8; 4], hashed: bool) -> Vec<u8> {
    let entry_size = if hashed { 0x40 } else { 0x18 };

    let mut strings = Vec::new();
    let mut table = Vec::new();
    let mut data = Vec::new();
    for (name, payload) in entries {
        let name_offset = strings.len() as u32;
        strings.extend_from_slice(name.as_bytes());
        strings.push(0);

        table.extend_from_slice(&(data.len() as u64).to_le_bytes());
        table.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        table.extend_from_slice(&name_offset.to_le_bytes());
        if hashed {
            table.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            table.extend_from_slice(&0u64.to_le_bytes());
            table.extend_from_slice(Sha256::digest(payload).as_slice());
        } else {
            table.extend_from_slice(&0u32.to_le_bytes());
        }
        data.extend_from_slice(payload);
    }
    debug_assert_eq!(table.len(), entries.len() * entry_size);

    let mut out = Vec::with_capacity(0x10 + table.len() + strings.len() + data.len());
    out.extend_from_slice(magic);
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&table);
    out.extend_from_slice(&strings);
    out.extend_from_slice(&data);
    out
}

/// Assemble a plaintext content archive with up to four sections. Sections
/// are padded to media-unit boundaries; empty sections are omitted.
pub fn build_nca(content_type: ContentType, sections: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![0u8; 0x400];
    out[0x200..0x204].copy_from_slice(NCA_MAGIC);
    out[0x205] = content_type.as_raw();

    let mut start_units = (out.len() / MEDIA_UNIT) as u32;
    for (index, section) in sections.iter().take(4).enumerate() {
        if section.is_empty() {
            continue;
        }
        let units = section.len().div_ceil(MEDIA_UNIT) as u32;
        let entry = 0x240 + index * 0x10;
        out[entry..entry + 4].copy_from_slice(&start_units.to_le_bytes());
        out[entry + 4..entry + 8].copy_from_slice(&(start_units + units).to_le_bytes());
        start_units += units;
    }
    for section in sections.iter().take(4) {
        if section.is_empty() {
            continue;
        }
        let padded = section.len().div_ceil(MEDIA_UNIT) * MEDIA_UNIT;
        out.extend_from_slice(section);
        out.resize(out.len() + (padded - section.len()), 0);
    }
    out
}

/// Assemble packaged title metadata. `title_type` is the raw tag byte.
pub fn build_cnmt(title_id: u64, version: u32, title_type: u8) -> Vec<u8> {
    let mut out = vec![0u8; 0x20];
    out[0..8].copy_from_slice(&title_id.to_le_bytes());
    out[8..12].copy_from_slice(&version.to_le_bytes());
    out[0xC] = title_type;
    out
}

/// Assemble control metadata with the name in the first language entry.
pub fn build_nacp(application_name: &str, display_version: &str) -> Vec<u8> {
    let mut out = vec![0u8; 0x4000];
    write_padded(&mut out[..0x200], application_name);
    write_padded(&mut out[0x3060..0x3070], display_version);
    out
}

fn write_padded(field: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(field.len());
    field[..len].copy_from_slice(&bytes[..len]);
}

/// Assemble a filesystem image with the given files in its root directory.
pub fn build_romfs(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    // File metadata entries chain through byte offsets within the table.
    let mut entry_offsets = Vec::with_capacity(files.len());
    let mut offset = 0u32;
    for (name, _) in files {
        entry_offsets.push(offset);
        offset += 0x20 + name.len().div_ceil(4) as u32 * 4;
    }

    let mut file_meta = Vec::new();
    let mut data = Vec::new();
    for (index, (name, payload)) in files.iter().enumerate() {
        let sibling = entry_offsets.get(index + 1).copied().unwrap_or(NO_ENTRY);
        file_meta.extend_from_slice(&0u32.to_le_bytes()); // parent dir
        file_meta.extend_from_slice(&sibling.to_le_bytes());
        file_meta.extend_from_slice(&(data.len() as u64).to_le_bytes());
        file_meta.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        file_meta.extend_from_slice(&NO_ENTRY.to_le_bytes()); // hash chain
        file_meta.extend_from_slice(&(name.len() as u32).to_le_bytes());
        file_meta.extend_from_slice(name.as_bytes());
        file_meta.resize(file_meta.len().div_ceil(4) * 4, 0);
        data.extend_from_slice(payload);
    }

    let mut dir_meta = Vec::new();
    dir_meta.extend_from_slice(&0u32.to_le_bytes()); // parent (self)
    dir_meta.extend_from_slice(&NO_ENTRY.to_le_bytes()); // sibling
    dir_meta.extend_from_slice(&NO_ENTRY.to_le_bytes()); // first child dir
    let first_file = if files.is_empty() { NO_ENTRY } else { 0 };
    dir_meta.extend_from_slice(&first_file.to_le_bytes());
    dir_meta.extend_from_slice(&NO_ENTRY.to_le_bytes()); // hash chain
    dir_meta.extend_from_slice(&0u32.to_le_bytes()); // name length

    let dir_meta_offset = ROMFS_HEADER_SIZE;
    let file_meta_offset = dir_meta_offset + dir_meta.len() as u64;
    let data_offset = file_meta_offset + file_meta.len() as u64;

    let mut out = Vec::new();
    for field in [
        ROMFS_HEADER_SIZE,
        dir_meta_offset, // dir hash table (empty)
        0,
        dir_meta_offset,
        dir_meta.len() as u64,
        file_meta_offset, // file hash table (empty)
        0,
        file_meta_offset,
        file_meta.len() as u64,
        data_offset,
    ] {
        out.extend_from_slice(&field.to_le_bytes());
    }
    out.extend_from_slice(&dir_meta);
    out.extend_from_slice(&file_meta);
    out.extend_from_slice(&data);
    out
}

/// Assemble a card image from named HFS0 partition images.
pub fn build_xci(partitions: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let root = build_hfs0(partitions);
    let mut out = vec![0u8; 0x200];
    out[0x100..0x104].copy_from_slice(XCI_MAGIC);
    out[0x130..0x138].copy_from_slice(&0x200u64.to_le_bytes());
    out[0x138..0x140].copy_from_slice(&(root.len() as u64).to_le_bytes());
    out.extend_from_slice(&root);
    out
}
