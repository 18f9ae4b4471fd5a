use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// A directory entry with the fields the stages sort on.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub created: SystemTime,
}

/// Creation time, or modification time where the platform has no birth time.
pub fn created_at(metadata: &Metadata) -> SystemTime {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(UNIX_EPOCH)
}

/// Immediate regular files of `dir`. Names that are not valid UTF-8 are ignored.
pub fn list_files(dir: &Path) -> io::Result<Vec<Entry>> {
    list(dir, |metadata| metadata.is_file())
}

/// Immediate subdirectories of `dir`, the video units of a cache root.
pub fn list_units(dir: &Path) -> io::Result<Vec<Entry>> {
    list(dir, |metadata| metadata.is_dir())
}

fn list(dir: &Path, keep: impl Fn(&Metadata) -> bool) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // dangling links are neither files nor units
        let Ok(metadata) = fs::metadata(entry.path()) else {
            continue;
        };
        if !keep(&metadata) {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };

        entries.push(Entry {
            name,
            path: entry.path(),
            created: created_at(&metadata),
        });
    }

    Ok(entries)
}
