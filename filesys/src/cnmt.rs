use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::vfs::VfsFile;

const MIN_SIZE: usize = 0x10;
const TYPE_APPLICATION: u8 = 0x80;
const TYPE_UPDATE: u8 = 0x81;
const TYPE_ADD_ON_CONTENT: u8 = 0x82;

/// Title class carried by packaged content metadata.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TitleType {
    Application,
    Update,
    AddOnContent,
    /// Anything we do not install through this pipeline; the raw tag is kept
    /// for diagnostics.
    Unknown(u8),
}

impl TitleType {
    pub fn from_raw(raw: u8) -> TitleType {
        match raw {
            TYPE_APPLICATION => TitleType::Application,
            TYPE_UPDATE => TitleType::Update,
            TYPE_ADD_ON_CONTENT => TitleType::AddOnContent,
            other => TitleType::Unknown(other),
        }
    }

    pub fn as_raw(&self) -> u8 {
        match self {
            TitleType::Application => TYPE_APPLICATION,
            TitleType::Update => TYPE_UPDATE,
            TitleType::AddOnContent => TYPE_ADD_ON_CONTENT,
            TitleType::Unknown(raw) => *raw,
        }
    }
}

/// Parsed title metadata: identity, version, and title class.
#[derive(Clone, Copy, Debug)]
pub struct Cnmt {
    title_id: u64,
    version: u32,
    title_type: TitleType,
}

impl Cnmt {
    pub fn parse(file: &VfsFile) -> Result<Cnmt, String> {
        let bytes = file
            .read_at(0, MIN_SIZE)
            .ok_or_else(|| format!("{}: title metadata truncated", file.name()))?;
        let mut cursor = Cursor::new(bytes);
        let title_id = cursor
            .read_u64::<LittleEndian>()
            .map_err(|e| format!("{}: {}", file.name(), e))?;
        let version = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| format!("{}: {}", file.name(), e))?;
        let raw_type = cursor
            .read_u8()
            .map_err(|e| format!("{}: {}", file.name(), e))?;

        Ok(Cnmt {
            title_id,
            version,
            title_type: TitleType::from_raw(raw_type),
        })
    }

    pub fn title_id(&self) -> u64 {
        self.title_id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn title_type(&self) -> TitleType {
        self.title_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;

    #[test]
    fn parses_identity_version_and_type() {
        let bytes = build::build_cnmt(0x0100_0000_0000_1234, 3, TYPE_UPDATE);
        let cnmt = Cnmt::parse(&VfsFile::new("title.cnmt", bytes)).unwrap();
        assert_eq!(cnmt.title_id(), 0x0100_0000_0000_1234);
        assert_eq!(cnmt.version(), 3);
        assert_eq!(cnmt.title_type(), TitleType::Update);
    }

    #[test]
    fn unknown_type_tags_are_retained() {
        let bytes = build::build_cnmt(1, 1, 0x03);
        let cnmt = Cnmt::parse(&VfsFile::new("title.cnmt", bytes)).unwrap();
        assert_eq!(cnmt.title_type(), TitleType::Unknown(0x03));
    }

    #[test]
    fn truncated_metadata_is_an_error() {
        assert!(Cnmt::parse(&VfsFile::new("short.cnmt", vec![0; 8])).is_err());
    }
}
