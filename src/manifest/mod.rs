use serde::Serialize;

/// One row of the install confirmation list.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ManifestEntry {
    pub path: String,
    pub label: String,
    pub included: bool,
}

impl ManifestEntry {
    pub fn new(path: &str, label: &str) -> Self {
        ManifestEntry {
            path: path.to_string(),
            label: label.to_string(),
            included: true,
        }
    }
}

/// The ordered selection handed to the confirmation surface. Entries keep
/// the order candidates were supplied in; each surviving candidate
/// contributes exactly one entry.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SelectionManifest {
    entries: Vec<ManifestEntry>,
}

impl SelectionManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flip the inclusion flag of every entry recorded under `path`.
    /// Duplicate input paths name the same underlying file, so they toggle
    /// together. Returns whether anything matched.
    pub fn toggle(&mut self, path: &str) -> bool {
        let mut matched = false;
        for entry in &mut self.entries {
            if entry.path == path {
                entry.included = !entry.included;
                matched = true;
            }
        }
        matched
    }

    /// Paths still checked for installation, in manifest order.
    pub fn selected_paths(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.included)
            .map(|entry| entry.path.clone())
            .collect()
    }
}
