use crate::vfs::VfsFile;

/// Application control metadata layout: sixteen 0x300-byte language entries
/// (0x200 name + 0x100 publisher), then fixed fields; the display version
/// string sits at 0x3060.
const LANGUAGE_ENTRIES: usize = 16;
const LANGUAGE_ENTRY_SIZE: usize = 0x300;
const NAME_SIZE: usize = 0x200;
const DISPLAY_VERSION_OFFSET: u64 = 0x3060;
const DISPLAY_VERSION_SIZE: usize = 0x10;

/// Localized display metadata for a title.
#[derive(Clone, Debug)]
pub struct Nacp {
    application_name: String,
    display_version: String,
}

impl Nacp {
    pub fn parse(file: &VfsFile) -> Result<Nacp, String> {
        let application_name = (0..LANGUAGE_ENTRIES)
            .find_map(|index| {
                let entry = file.read_at((index * LANGUAGE_ENTRY_SIZE) as u64, NAME_SIZE)?;
                let name = trimmed_string(entry)?;
                if name.is_empty() { None } else { Some(name) }
            })
            .ok_or_else(|| {
                format!("{}: no application name in any language entry", file.name())
            })?;

        let version_bytes = file
            .read_at(DISPLAY_VERSION_OFFSET, DISPLAY_VERSION_SIZE)
            .ok_or_else(|| format!("{}: control metadata truncated", file.name()))?;
        let display_version = trimmed_string(version_bytes)
            .ok_or_else(|| format!("{}: display version is not UTF-8", file.name()))?;

        Ok(Nacp {
            application_name,
            display_version,
        })
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn display_version(&self) -> &str {
        &self.display_version
    }
}

// NUL-padded fixed field to owned string.
fn trimmed_string(bytes: &[u8]) -> Option<String> {
    let raw = bytes.split(|byte| *byte == 0).next().unwrap_or(&[]);
    std::str::from_utf8(raw).ok().map(|s| s.to_string())
}
