use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::nsp::Nsp;
use crate::pfs::{self, Partition};
use crate::vfs::VfsFile;

/// Card-image constants: "HEAD" magic after the 0x100-byte signature block,
/// then the root partition's offset and region size.
pub const XCI_MAGIC: &[u8; 4] = b"HEAD";
pub const SECURE_PARTITION: &str = "secure";

const MAGIC_OFFSET: u64 = 0x100;
const ROOT_OFFSET_FIELD: u64 = 0x130;

/// A parsed card image: the root HFS0's entries, each itself an HFS0
/// partition ("update", "normal", "secure", ...).
#[derive(Clone, Debug)]
pub struct Xci {
    partitions: Vec<(String, Partition)>,
}

impl Xci {
    pub fn parse(file: &VfsFile, verify: bool) -> Result<Xci, String> {
        let magic = file
            .read_at(MAGIC_OFFSET, 4)
            .ok_or_else(|| format!("{}: card image header truncated", file.name()))?;
        if magic != XCI_MAGIC {
            return Err(format!("{}: bad card image magic", file.name()));
        }

        let fields = file
            .read_at(ROOT_OFFSET_FIELD, 0x10)
            .ok_or_else(|| format!("{}: card image header truncated", file.name()))?;
        let mut cursor = Cursor::new(fields);
        let root_offset = cursor
            .read_u64::<LittleEndian>()
            .map_err(|e| format!("{}: {}", file.name(), e))?;
        let root_size = cursor
            .read_u64::<LittleEndian>()
            .map_err(|e| format!("{}: {}", file.name(), e))?;
        if root_size == 0 {
            return Err(format!("{}: card image has no root partition", file.name()));
        }

        let root_image = file
            .slice("root", root_offset, root_size)
            .ok_or_else(|| format!("{}: root partition lies outside the image", file.name()))?;
        let root = pfs::parse_hfs0(&root_image, verify)?;

        let mut partitions = Vec::with_capacity(root.len());
        for entry in root.files() {
            let partition = pfs::parse_hfs0(entry, verify)?;
            partitions.push((entry.name().to_string(), partition));
        }
        Ok(Xci { partitions })
    }

    pub fn partitions(&self) -> &[(String, Partition)] {
        &self.partitions
    }

    pub fn partition(&self, name: &str) -> Option<&Partition> {
        self.partitions
            .iter()
            .find(|(partition_name, _)| partition_name == name)
            .map(|(_, partition)| partition)
    }

    pub fn secure_partition(&self) -> Option<&Partition> {
        self.partition(SECURE_PARTITION)
    }

    /// The secure partition repackaged as a loose package named `name`.
    pub fn secure_partition_package(&self, name: &str) -> Option<Nsp> {
        self.secure_partition()
            .map(|partition| Nsp::from_partition(name, partition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;
    use crate::nca::ContentType;

    fn secure_with_meta() -> Vec<u8> {
        let cnmt = build::build_cnmt(11, 2, 0x82);
        let section = build::build_pfs0(&[("title.cnmt", cnmt)]);
        let meta = build::build_nca(ContentType::Meta, &[section]);
        build::build_hfs0(&[("meta.nca", meta)])
    }

    #[test]
    fn parses_named_partitions_and_repackages_secure() {
        let bytes = build::build_xci(&[
            ("update", build::build_hfs0(&[])),
            ("secure", secure_with_meta()),
        ]);
        let xci = Xci::parse(&VfsFile::new("Game.xci", bytes), true).unwrap();

        assert_eq!(xci.partitions().len(), 2);
        assert!(xci.partition("update").is_some());
        let package = xci.secure_partition_package("Game").unwrap();
        assert_eq!(package.name(), "Game");
        assert_eq!(package.ncas().len(), 1);
    }

    #[test]
    fn missing_secure_partition_yields_none() {
        let bytes = build::build_xci(&[("normal", build::build_hfs0(&[]))]);
        let xci = Xci::parse(&VfsFile::new("Game.xci", bytes), false).unwrap();
        assert!(xci.secure_partition().is_none());
        assert!(xci.secure_partition_package("Game").is_none());
    }

    #[test]
    fn rejects_bad_magic_and_corrupted_hashes() {
        assert!(Xci::parse(&VfsFile::new("tiny.xci", vec![0; 0x80]), false).is_err());

        let mut bytes = build::build_xci(&[("secure", secure_with_meta())]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(Xci::parse(&VfsFile::new("Game.xci", bytes.clone()), true).is_err());
        assert!(Xci::parse(&VfsFile::new("Game.xci", bytes), false).is_ok());
    }
}
