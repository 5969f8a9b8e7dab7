use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::vfs::VfsFile;

/// Embedded filesystem image. The header is ten u64 fields; directory and
/// file metadata tables chain entries through byte offsets, with
/// 0xFFFFFFFF as the end-of-chain marker.
pub const ROMFS_HEADER_SIZE: u64 = 0x50;
pub const NO_ENTRY: u32 = 0xFFFF_FFFF;

const DIR_ENTRY_FIXED: usize = 0x18;
const FILE_ENTRY_FIXED: usize = 0x20;
const MAX_FILES: usize = 1 << 16;

struct Header {
    dir_meta_offset: u64,
    file_meta_offset: u64,
    data_offset: u64,
}

/// A flat view of the files reachable from the image's root directory.
/// Lookup is exact-name; callers own any case fallback.
#[derive(Clone, Debug)]
pub struct RomFs {
    files: Vec<VfsFile>,
}

impl RomFs {
    pub fn extract(image: &VfsFile) -> Result<RomFs, String> {
        let header = parse_header(image)?;

        // Root directory entry: fixed fields only, we need its first file.
        let root = image
            .read_at(header.dir_meta_offset, DIR_ENTRY_FIXED)
            .ok_or_else(|| truncated(image))?;
        let mut cursor = Cursor::new(&root[0xC..]);
        let mut next_file = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| format!("{}: {}", image.name(), e))?;

        let mut files = Vec::new();
        while next_file != NO_ENTRY {
            if files.len() >= MAX_FILES {
                return Err(format!("{}: file chain does not terminate", image.name()));
            }
            let entry_offset = header.file_meta_offset + next_file as u64;
            let fixed = image
                .read_at(entry_offset, FILE_ENTRY_FIXED)
                .ok_or_else(|| truncated(image))?;
            let mut cursor = Cursor::new(fixed);
            let _parent = cursor
                .read_u32::<LittleEndian>()
                .map_err(|e| format!("{}: {}", image.name(), e))?;
            let sibling = cursor
                .read_u32::<LittleEndian>()
                .map_err(|e| format!("{}: {}", image.name(), e))?;
            let data_offset = cursor
                .read_u64::<LittleEndian>()
                .map_err(|e| format!("{}: {}", image.name(), e))?;
            let data_size = cursor
                .read_u64::<LittleEndian>()
                .map_err(|e| format!("{}: {}", image.name(), e))?;
            let _hash_next = cursor
                .read_u32::<LittleEndian>()
                .map_err(|e| format!("{}: {}", image.name(), e))?;
            let name_len = cursor
                .read_u32::<LittleEndian>()
                .map_err(|e| format!("{}: {}", image.name(), e))? as usize;

            let name_bytes = image
                .read_at(entry_offset + FILE_ENTRY_FIXED as u64, name_len)
                .ok_or_else(|| truncated(image))?;
            let name = std::str::from_utf8(name_bytes)
                .map_err(|_| format!("{}: file name is not UTF-8", image.name()))?
                .to_string();

            let file = image
                .slice(&name, header.data_offset + data_offset, data_size)
                .ok_or_else(|| {
                    format!("{}: file '{}' lies outside the image", image.name(), name)
                })?;
            files.push(file);
            next_file = sibling;
        }

        Ok(RomFs { files })
    }

    pub fn files(&self) -> &[VfsFile] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&VfsFile> {
        self.files.iter().find(|file| file.name() == name)
    }
}

fn parse_header(image: &VfsFile) -> Result<Header, String> {
    let bytes = image
        .read_at(0, ROMFS_HEADER_SIZE as usize)
        .ok_or_else(|| truncated(image))?;
    let mut cursor = Cursor::new(bytes);
    let mut field = || {
        cursor
            .read_u64::<LittleEndian>()
            .map_err(|e| format!("{}: {}", image.name(), e))
    };
    let header_size = field()?;
    if header_size != ROMFS_HEADER_SIZE {
        return Err(format!("{}: bad filesystem image header", image.name()));
    }
    let _dir_hash_offset = field()?;
    let _dir_hash_size = field()?;
    let dir_meta_offset = field()?;
    let _dir_meta_size = field()?;
    let _file_hash_offset = field()?;
    let _file_hash_size = field()?;
    let file_meta_offset = field()?;
    let _file_meta_size = field()?;
    let data_offset = field()?;

    Ok(Header {
        dir_meta_offset,
        file_meta_offset,
        data_offset,
    })
}

fn truncated(image: &VfsFile) -> String {
    format!("{}: truncated filesystem image", image.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;

    #[test]
    fn extracts_root_files_with_exact_names() {
        let bytes = build::build_romfs(&[
            ("control.nacp", b"nacp-bytes".to_vec()),
            ("icon.dat", b"img".to_vec()),
        ]);
        let romfs = RomFs::extract(&VfsFile::new("section", bytes)).unwrap();

        assert_eq!(romfs.files().len(), 2);
        assert_eq!(romfs.file("control.nacp").unwrap().bytes(), b"nacp-bytes");
        assert_eq!(romfs.file("icon.dat").unwrap().bytes(), b"img");
        assert!(romfs.file("Control.nacp").is_none());
    }

    #[test]
    fn empty_image_extracts_to_no_files() {
        let bytes = build::build_romfs(&[]);
        let romfs = RomFs::extract(&VfsFile::new("section", bytes)).unwrap();
        assert!(romfs.files().is_empty());
        assert!(romfs.file("control.nacp").is_none());
    }

    #[test]
    fn corrupt_header_is_an_error() {
        assert!(RomFs::extract(&VfsFile::new("tiny", vec![0; 0x20])).is_err());

        let mut bytes = build::build_romfs(&[]);
        bytes[0] = 0x51; // header size field
        assert!(RomFs::extract(&VfsFile::new("bad", bytes)).is_err());
    }
}
