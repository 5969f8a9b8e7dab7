use crate::pfs::{self, Partition};
use crate::vfs::VfsFile;

/// Plaintext content-archive constants. The header block is 0x400 bytes; the
/// leading 0x200 are signature space and are not interpreted here (signature
/// validation sits with an external collaborator).
pub const NCA_MAGIC: &[u8; 4] = b"NCA3";

const HEADER_SIZE: usize = 0x400;
const MAGIC_OFFSET: u64 = 0x200;
const CONTENT_TYPE_OFFSET: usize = 0x205;
const SECTION_TABLE_OFFSET: usize = 0x240;
const SECTION_ENTRY_SIZE: usize = 0x10;
const SECTION_COUNT: usize = 4;
const MEDIA_UNIT: u64 = 0x200;

/// Purpose tag of a content archive.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ContentType {
    Program,
    Meta,
    Control,
    Manual,
    Data,
    PublicData,
}

impl ContentType {
    pub fn from_raw(raw: u8) -> Option<ContentType> {
        match raw {
            0 => Some(ContentType::Program),
            1 => Some(ContentType::Meta),
            2 => Some(ContentType::Control),
            3 => Some(ContentType::Manual),
            4 => Some(ContentType::Data),
            5 => Some(ContentType::PublicData),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> u8 {
        match self {
            ContentType::Program => 0,
            ContentType::Meta => 1,
            ContentType::Control => 2,
            ContentType::Manual => 3,
            ContentType::Data => 4,
            ContentType::PublicData => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Program => "Program",
            ContentType::Meta => "Meta",
            ContentType::Control => "Control",
            ContentType::Manual => "Manual",
            ContentType::Data => "Data",
            ContentType::PublicData => "PublicData",
        }
    }
}

/// A parsed plaintext content archive. Partition sections become
/// "subdirectories"; the first non-partition section is exposed as the
/// embedded RomFS image.
#[derive(Clone, Debug)]
pub struct Nca {
    name: String,
    content_type: ContentType,
    subdirectories: Vec<Partition>,
    romfs: Option<VfsFile>,
}

impl Nca {
    pub fn parse(file: &VfsFile) -> Result<Nca, String> {
        let magic = file
            .read_at(MAGIC_OFFSET, 4)
            .ok_or_else(|| format!("{}: content archive header truncated", file.name()))?;
        if magic != NCA_MAGIC {
            return Err(format!("{}: bad content archive magic", file.name()));
        }
        let header = file
            .read_at(0, HEADER_SIZE)
            .ok_or_else(|| format!("{}: content archive header truncated", file.name()))?;

        let raw_type = header[CONTENT_TYPE_OFFSET];
        let content_type = ContentType::from_raw(raw_type)
            .ok_or_else(|| format!("{}: unknown content type {:#x}", file.name(), raw_type))?;

        let mut subdirectories = Vec::new();
        let mut romfs = None;
        for index in 0..SECTION_COUNT {
            let entry = &header[SECTION_TABLE_OFFSET + index * SECTION_ENTRY_SIZE..];
            let start = u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]) as u64;
            let end = u32::from_le_bytes([entry[4], entry[5], entry[6], entry[7]]) as u64;
            if end <= start {
                continue;
            }
            let section_name = format!("{}:{}", file.name(), index);
            let section = file
                .slice(&section_name, start * MEDIA_UNIT, (end - start) * MEDIA_UNIT)
                .ok_or_else(|| {
                    format!("{}: section {} lies outside the archive", file.name(), index)
                })?;
            if pfs::is_pfs0(&section) {
                subdirectories.push(pfs::parse_pfs0(&section)?);
            } else if romfs.is_none() {
                romfs = Some(section);
            }
        }

        Ok(Nca {
            name: file.name().to_string(),
            content_type,
            subdirectories,
            romfs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Partition sections in declared order.
    pub fn subdirectories(&self) -> &[Partition] {
        &self.subdirectories
    }

    /// The embedded filesystem image, when one exists.
    pub fn romfs(&self) -> Option<&VfsFile> {
        self.romfs.as_ref()
    }
}
