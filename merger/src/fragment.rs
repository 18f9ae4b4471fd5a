use std::path::{Path, PathBuf};

/// Marker inserted before the extension of a header-stripped fragment.
pub const STRIPPED_MARKER: &str = "_delete8";

/// Extension of the remuxed output container.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Number of fragments merged into one video (one video track, one audio track).
pub const FRAGMENTS_PER_UNIT: usize = 2;

/// File naming scheme for everything the pipeline writes inside a video unit.
///
/// Canonical fragments are `1.<ext>` and `2.<ext>`, stripped fragments are
/// `1_delete8.<ext>` and `2_delete8.<ext>`, the output is `<unit>.mp4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentNaming {
    extension: String,
}

impl FragmentNaming {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `true` for any file carrying the fragment extension.
    pub fn is_fragment(&self, name: &str) -> bool {
        name.strip_suffix(self.extension.as_str())
            .and_then(|stem| stem.strip_suffix('.'))
            .is_some()
    }

    /// Canonical name for a 1-based slot.
    pub fn canonical(&self, index: usize) -> String {
        format!("{}.{}", index, self.extension)
    }

    /// Stripped name for a 1-based slot.
    pub fn stripped(&self, index: usize) -> String {
        format!("{}{}.{}", index, STRIPPED_MARKER, self.extension)
    }

    pub fn canonical_names(&self) -> Vec<String> {
        (1..=FRAGMENTS_PER_UNIT).map(|i| self.canonical(i)).collect()
    }

    pub fn stripped_names(&self) -> Vec<String> {
        (1..=FRAGMENTS_PER_UNIT).map(|i| self.stripped(i)).collect()
    }

    /// Exact canonical name, as excluded from the raw fragment candidates.
    pub fn is_canonical(&self, name: &str) -> bool {
        self.canonical_names().iter().any(|c| c == name)
    }

    /// Any name already carrying the stripped marker.
    pub fn is_stripped(&self, name: &str) -> bool {
        name.contains(STRIPPED_MARKER)
    }

    /// Header stripper input: a name ending with a canonical name, not yet stripped.
    pub fn is_strip_source(&self, name: &str) -> bool {
        !self.is_stripped(name) && self.canonical_names().iter().any(|c| name.ends_with(c))
    }

    /// Derives the stripped name by inserting the marker before the extension.
    pub fn stripped_name_for(&self, name: &str) -> Option<String> {
        let stem = name.strip_suffix(self.extension.as_str())?.strip_suffix('.')?;
        Some(format!("{}{}.{}", stem, STRIPPED_MARKER, self.extension))
    }

    /// Output container of a unit directory, named after the directory.
    pub fn output_for(&self, unit_dir: &Path) -> Option<PathBuf> {
        let name = unit_dir.file_name()?.to_str()?;
        Some(unit_dir.join(format!("{}.{}", name, OUTPUT_EXTENSION)))
    }
}
