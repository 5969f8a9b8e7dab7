use std::collections::HashMap;

use crate::nca::{ContentType, Nca};
use crate::pfs::{self, Partition};
use crate::vfs::{self, VfsFile};

/// A loose package: a PFS0 whose `.nca` entries are the package's content
/// archives. Entries that are not content archives, or that fail to parse,
/// are ignored rather than failing the package.
#[derive(Clone, Debug)]
pub struct Nsp {
    name: String,
    ncas: Vec<Nca>,
}

impl Nsp {
    pub fn parse(file: &VfsFile) -> Result<Nsp, String> {
        let partition = pfs::parse_pfs0(file)?;
        Ok(Nsp::from_partition(vfs::file_stem(file.name()), &partition))
    }

    /// Repackage an already-parsed partition (the card-image secure
    /// partition path).
    pub fn from_partition(name: &str, partition: &Partition) -> Nsp {
        let ncas = partition
            .files()
            .iter()
            .filter(|entry| {
                entry
                    .name()
                    .rsplit_once('.')
                    .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("nca"))
            })
            .filter_map(|entry| Nca::parse(entry).ok())
            .collect();
        Nsp {
            name: name.to_string(),
            ncas,
        }
    }

    /// The package display name (the container file's stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content archives in partition-declared order, duplicates included.
    pub fn ncas(&self) -> &[Nca] {
        &self.ncas
    }

    /// The effective content list: one archive per content type, built by
    /// folding over the declared order so a later duplicate replaces an
    /// earlier one while keeping its position.
    pub fn ncas_collapsed(&self) -> Vec<&Nca> {
        let mut order: Vec<ContentType> = Vec::new();
        let mut by_type: HashMap<ContentType, &Nca> = HashMap::new();
        for nca in &self.ncas {
            if by_type.insert(nca.content_type(), nca).is_none() {
                order.push(nca.content_type());
            }
        }
        order.iter().map(|tag| by_type[tag]).collect()
    }

    /// Collapsed lookup for a single content type.
    pub fn content(&self, tag: ContentType) -> Option<&Nca> {
        self.ncas.iter().rev().find(|nca| nca.content_type() == tag)
    }
}
