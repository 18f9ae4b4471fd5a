use crate::config::Settings;
use crate::fragment::FragmentNaming;
use crate::report::{SkipReason, UnitOutcome};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Stage two: writes a copy of every canonical fragment without the
/// client's leading header, as `<n>_delete8.<ext>` next to it.
///
/// Walks the whole subtree. A failure on one file is recorded and the walk
/// goes on with the next one.
#[derive(Debug, Clone)]
pub struct HeaderStripper {
    naming: FragmentNaming,
    header_size: usize,
}

impl HeaderStripper {
    pub fn new(settings: &Settings) -> Self {
        Self {
            naming: FragmentNaming::new(settings.fragments.extension.clone()),
            header_size: settings.fragments.header_size,
        }
    }

    /// One outcome per canonical fragment found under `root`.
    pub fn strip(&self, root: &Path) -> Vec<UnitOutcome> {
        let mut outcomes = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    warn!("walk {}: {}", path.display(), e);
                    outcomes.push(UnitOutcome::failed(path, e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !self.naming.is_strip_source(name) {
                continue;
            }
            let Some(stripped) = self.naming.stripped_name_for(name) else {
                continue;
            };

            let source = entry.path();
            let target = source.with_file_name(&stripped);
            outcomes.push(self.strip_file(source, &target));
        }

        outcomes
    }

    /// Writes `target` as `source` minus the header, unless `target` exists.
    pub fn strip_file(&self, source: &Path, target: &Path) -> UnitOutcome {
        if target.exists() {
            info!("{} already exists, skipping", target.display());
            return UnitOutcome::skipped(target, SkipReason::AlreadyStripped);
        }

        match self.copy_without_header(source, target) {
            Ok(len) => {
                info!("stripped {} ({} bytes)", target.display(), len);
                UnitOutcome::done(target, format!("{} bytes", len))
            }
            Err(e) => {
                warn!("strip {}: {}", source.display(), e);
                UnitOutcome::failed(source, e)
            }
        }
    }

    /// Writes into a `.part` staging file and renames it to `target` once
    /// complete. `target` never exists unless it holds the stripped bytes.
    fn copy_without_header(&self, source: &Path, target: &Path) -> io::Result<usize> {
        let staging = staging_path(target);
        let result = self
            .write_without_header(source, &staging)
            .and_then(|len| fs::rename(&staging, target).map(|_| len));
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result
    }

    fn write_without_header(&self, source: &Path, staging: &Path) -> io::Result<usize> {
        let content = fs::read(source)?;
        let body = content.get(self.header_size..).unwrap_or_default();

        let mut file = File::create(staging)?;
        file.write_all(body)?;
        file.sync_all()?;

        Ok(body.len())
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}
