use crate::fragment::FragmentNaming;
use crate::scan;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A finished video, as shown in the gallery.
#[derive(Debug, Clone, Serialize)]
pub struct VideoCard {
    pub name: String,
    pub dir: PathBuf,
    pub output: PathBuf,
    pub created: DateTime<Local>,
}

impl VideoCard {
    pub fn created_label(&self) -> String {
        self.created.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// One card per unit with a merged output, most recently created unit first.
///
/// A missing or unreadable root yields no cards.
pub fn cards(root: &Path, naming: &FragmentNaming) -> Vec<VideoCard> {
    let mut units = match scan::list_units(root) {
        Ok(units) => units,
        Err(e) => {
            warn!("gallery {}: {}", root.display(), e);
            return Vec::new();
        }
    };
    units.sort_by(|a, b| b.created.cmp(&a.created).then(a.name.cmp(&b.name)));

    units
        .into_iter()
        .filter_map(|unit| {
            let output = naming.output_for(&unit.path)?;
            if !output.is_file() {
                return None;
            }
            Some(VideoCard {
                name: unit.name,
                dir: unit.path,
                output,
                created: DateTime::<Local>::from(unit.created),
            })
        })
        .collect()
}
