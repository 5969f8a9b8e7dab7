use std::fmt;
use std::path::Path;

use filesys::{
    Cnmt, ContentType, Nacp, Nca, Nsp, RomFs, TitleType, VirtualFilesystem, Xci,
};
use settings::Settings;

use crate::logging::Logger;
use crate::manifest::{ManifestEntry, SelectionManifest};

/// Supported container formats, derived from the path extension alone.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContainerKind {
    /// A bare content archive, labeled by its own file name.
    Nca,
    /// A card image whose secure partition carries the package.
    Xci,
    /// A loose package.
    Nsp,
}

impl ContainerKind {
    /// Pure classification; never touches the file.
    pub fn classify(path: &str) -> Option<ContainerKind> {
        let extension = Path::new(path).extension()?.to_str()?;
        if extension.eq_ignore_ascii_case("nca") {
            Some(ContainerKind::Nca)
        } else if extension.eq_ignore_ascii_case("xci") {
            Some(ContainerKind::Xci)
        } else if extension.eq_ignore_ascii_case("nsp") {
            Some(ContainerKind::Nsp)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Nca => "content archive",
            ContainerKind::Xci => "card image",
            ContainerKind::Nsp => "package",
        }
    }
}

/// Why a candidate was excluded from the manifest. Logged, never surfaced
/// per-file: a partially-unrecognizable batch is a normal outcome.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DropReason {
    Unreadable,
    UnsupportedKind,
    OpenFailed,
    MissingMetaContent,
    UnsupportedTitleType,
    MalformedMetadata,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DropReason::Unreadable => "file could not be opened",
            DropReason::UnsupportedKind => "unsupported container kind",
            DropReason::OpenFailed => "container could not be parsed",
            DropReason::MissingMetaContent => "package has no meta content",
            DropReason::UnsupportedTitleType => "title type is not installable",
            DropReason::MalformedMetadata => "title metadata missing or malformed",
        };
        write!(f, "{}", reason)
    }
}

/// Resolve every candidate path into at most one manifest entry. A failure
/// at any stage drops that candidate and moves on; the batch never aborts.
pub fn resolve_files(
    vfs: &dyn VirtualFilesystem,
    paths: &[String],
    settings: &Settings,
    logger: &Logger,
) -> SelectionManifest {
    let mut manifest = SelectionManifest::new();
    for path in paths {
        match resolve_one(vfs, path, settings) {
            Ok(entry) => {
                logger.debug(&format!("resolved {} as \"{}\"", path, entry.label));
                manifest.push(entry);
            }
            Err(reason) => logger.info(&format!("skipped {}: {}", path, reason)),
        }
    }
    manifest
}

fn resolve_one(
    vfs: &dyn VirtualFilesystem,
    path: &str,
    settings: &Settings,
) -> Result<ManifestEntry, DropReason> {
    let file = vfs.open(path).ok_or(DropReason::Unreadable)?;
    let kind = ContainerKind::classify(path).ok_or(DropReason::UnsupportedKind)?;

    // A bare content archive is labeled by its own name; no unpacking.
    if kind == ContainerKind::Nca {
        return Ok(ManifestEntry::new(path, file.name()));
    }

    let package = match kind {
        ContainerKind::Xci => {
            let xci =
                Xci::parse(&file, settings.verify_hashes).map_err(|_| DropReason::OpenFailed)?;
            xci.secure_partition_package(filesys::vfs::file_stem(file.name()))
                .ok_or(DropReason::OpenFailed)?
        }
        ContainerKind::Nsp => Nsp::parse(&file).map_err(|_| DropReason::OpenFailed)?,
        ContainerKind::Nca => unreachable!(),
    };

    let collapsed = package.ncas_collapsed();
    let meta = collapsed
        .iter()
        .copied()
        .find(|nca| nca.content_type() == ContentType::Meta)
        .ok_or(DropReason::MissingMetaContent)?;
    let control = collapsed
        .iter()
        .copied()
        .find(|nca| nca.content_type() == ContentType::Control);

    let cnmt = title_meta(meta).ok_or(DropReason::MalformedMetadata)?;
    let type_label =
        title_type_label(cnmt.title_type()).ok_or(DropReason::UnsupportedTitleType)?;

    let label = match control.and_then(|nca| application_meta(nca)) {
        Some(nacp) => format!(
            "{} ({}) ({})",
            nacp.application_name(),
            type_label,
            nacp.display_version()
        ),
        None => format!("{} ({}) (v{})", package.name(), type_label, cnmt.version()),
    };
    Ok(ManifestEntry::new(path, &label))
}

/// Title metadata from a Meta archive: the first file of its first
/// subdirectory. Absent structure or a parse failure yields [`None`].
pub fn title_meta(meta: &Nca) -> Option<Cnmt> {
    let section = meta.subdirectories().first()?;
    let file = section.files().first()?;
    Cnmt::parse(file).ok()
}

/// Localized metadata from a Control archive: "control.nacp" inside the
/// extracted filesystem image, with the capitalized name as fallback.
/// Absence at any step yields [`None`]; the caller falls back to the
/// package name.
pub fn application_meta(control: &Nca) -> Option<Nacp> {
    let image = control.romfs()?;
    let extracted = RomFs::extract(image).ok()?;
    let file = extracted
        .file("control.nacp")
        .or_else(|| extracted.file("Control.nacp"))?;
    Nacp::parse(file).ok()
}

// Only updates and add-on content install through this pipeline.
fn title_type_label(title_type: TitleType) -> Option<&'static str> {
    match title_type {
        TitleType::Update => Some("Update"),
        TitleType::AddOnContent => Some("DLC"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filesys::build;
    use filesys::vfs::VfsFile;

    const TYPE_ADD_ON_CONTENT: u8 = 0x82;

    #[test]
    fn classification_is_extension_derived_and_case_insensitive() {
        assert_eq!(ContainerKind::classify("a.nca"), Some(ContainerKind::Nca));
        assert_eq!(ContainerKind::classify("a.NCA"), Some(ContainerKind::Nca));
        assert_eq!(ContainerKind::classify("b.Xci"), Some(ContainerKind::Xci));
        assert_eq!(
            ContainerKind::classify("dir/c.nsp"),
            Some(ContainerKind::Nsp)
        );
        assert_eq!(ContainerKind::classify("d.zip"), None);
        assert_eq!(ContainerKind::classify("no-extension"), None);
        // The extension must be the path's own, not a suffix of the name.
        assert_eq!(ContainerKind::classify("archive.nca.bak"), None);
    }

    #[test]
    fn title_meta_requires_a_populated_first_subdirectory() {
        let no_sections = build::build_nca(ContentType::Meta, &[]);
        let nca = Nca::parse(&VfsFile::new("meta.nca", no_sections)).unwrap();
        assert!(title_meta(&nca).is_none());

        let empty_section = build::build_nca(ContentType::Meta, &[build::build_pfs0(&[])]);
        let nca = Nca::parse(&VfsFile::new("meta.nca", empty_section)).unwrap();
        assert!(title_meta(&nca).is_none());

        let cnmt = build::build_cnmt(5, 7, TYPE_ADD_ON_CONTENT);
        let populated =
            build::build_nca(ContentType::Meta, &[build::build_pfs0(&[("t.cnmt", cnmt)])]);
        let nca = Nca::parse(&VfsFile::new("meta.nca", populated)).unwrap();
        let cnmt = title_meta(&nca).unwrap();
        assert_eq!(cnmt.version(), 7);
        assert_eq!(cnmt.title_type(), TitleType::AddOnContent);
    }

    #[test]
    fn application_meta_requires_an_embedded_image() {
        let bare = build::build_nca(ContentType::Control, &[]);
        let nca = Nca::parse(&VfsFile::new("control.nca", bare)).unwrap();
        assert!(application_meta(&nca).is_none());

        let empty_image = build::build_nca(ContentType::Control, &[build::build_romfs(&[])]);
        let nca = Nca::parse(&VfsFile::new("control.nca", empty_image)).unwrap();
        assert!(application_meta(&nca).is_none());
    }

    #[test]
    fn application_meta_prefers_the_lowercase_name() {
        let lower = build::build_nacp("Lowercase Wins", "1.0.0");
        let upper = build::build_nacp("Capitalized", "9.9.9");
        let image = build::build_romfs(&[("Control.nacp", upper), ("control.nacp", lower)]);
        let bytes = build::build_nca(ContentType::Control, &[image]);
        let nca = Nca::parse(&VfsFile::new("control.nca", bytes)).unwrap();

        let nacp = application_meta(&nca).unwrap();
        assert_eq!(nacp.application_name(), "Lowercase Wins");
    }

    #[test]
    fn application_meta_falls_back_to_the_capitalized_name() {
        let upper = build::build_nacp("Capitalized", "2.0.0");
        let image = build::build_romfs(&[("Control.nacp", upper)]);
        let bytes = build::build_nca(ContentType::Control, &[image]);
        let nca = Nca::parse(&VfsFile::new("control.nca", bytes)).unwrap();

        let nacp = application_meta(&nca).unwrap();
        assert_eq!(nacp.application_name(), "Capitalized");
        assert_eq!(nacp.display_version(), "2.0.0");
    }

    #[test]
    fn unsupported_title_types_have_no_label() {
        assert_eq!(title_type_label(TitleType::Update), Some("Update"));
        assert_eq!(title_type_label(TitleType::AddOnContent), Some("DLC"));
        assert_eq!(title_type_label(TitleType::Application), None);
        assert_eq!(title_type_label(TitleType::Unknown(0x01)), None);
    }
}
