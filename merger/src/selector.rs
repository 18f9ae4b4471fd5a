use crate::config::{SelectionKey, Settings};
use crate::fragment::{FragmentNaming, FRAGMENTS_PER_UNIT};
use crate::report::{SkipReason, UnitOutcome};
use crate::scan::{self, Entry};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Stage one: picks two raw fragments per directory and copies them to the
/// canonical `1.<ext>` / `2.<ext>` slots.
///
/// Walks the whole subtree, the root included.
#[derive(Debug, Clone)]
pub struct FragmentSelector {
    naming: FragmentNaming,
    key: SelectionKey,
}

impl FragmentSelector {
    pub fn new(settings: &Settings) -> Self {
        Self {
            naming: FragmentNaming::new(settings.fragments.extension.clone()),
            key: settings.fragments.selection,
        }
    }

    /// Runs selection on every directory under `root`, one outcome per directory.
    pub fn select(&self, root: &Path) -> Vec<UnitOutcome> {
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

            if entry.file_type().is_dir() {
                outcomes.push(self.select_dir(entry.path()));
            }
        }

        outcomes
    }

    /// Runs selection on a single directory.
    pub fn select_dir(&self, dir: &Path) -> UnitOutcome {
        let files = match scan::list_files(dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("list {}: {}", dir.display(), e);
                return UnitOutcome::failed(dir, e);
            }
        };

        let canonical = self.naming.canonical_names();
        if canonical.iter().all(|c| files.iter().any(|f| &f.name == c)) {
            info!("{}: canonical fragments already present, skipping", dir.display());
            return UnitOutcome::skipped(dir, SkipReason::AlreadySelected);
        }

        let candidates = self.candidates(files);
        if candidates.is_empty() {
            info!("{}: no fragment files found, skipping", dir.display());
            return UnitOutcome::skipped(dir, SkipReason::NoFragments);
        }

        let mut copied = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            let name = self.naming.canonical(index + 1);
            if let Err(e) = replace_with_copy(&candidate.path, &dir.join(&name)) {
                warn!("{}: copy {} -> {}: {}", dir.display(), candidate.name, name, e);
                return UnitOutcome::failed(dir, format!("copy {}: {}", candidate.name, e));
            }

            info!("copied {} -> {} in {}", candidate.name, name, dir.display());
            copied.push(format!("{} -> {}", candidate.name, name));
        }

        UnitOutcome::done(dir, copied.join(", "))
    }

    /// Raw fragments ordered by the selection key, at most one per canonical slot.
    fn candidates(&self, files: Vec<Entry>) -> Vec<Entry> {
        let mut candidates: Vec<Entry> = files
            .into_iter()
            .filter(|f| self.naming.is_fragment(&f.name) && !self.naming.is_canonical(&f.name))
            .collect();

        match self.key {
            SelectionKey::Name => candidates.sort_by(|a, b| a.name.cmp(&b.name)),
            SelectionKey::Created => {
                candidates.sort_by(|a, b| a.created.cmp(&b.created).then(a.name.cmp(&b.name)))
            }
        }

        candidates.truncate(FRAGMENTS_PER_UNIT);
        candidates
    }
}

/// Copies `source` over `target`, removing a stale `target` first.
fn replace_with_copy(source: &Path, target: &Path) -> io::Result<()> {
    match fs::remove_file(target) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    fs::copy(source, target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::UnitStatus;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn selector(key: SelectionKey) -> FragmentSelector {
        let mut settings = Settings::default();
        settings.fragments.selection = key;
        FragmentSelector::new(&settings)
    }

    #[test]
    fn picks_first_two_by_name() {
        let root = TempDir::new().unwrap();
        let unit = root.path().join("videoA");
        fs::create_dir(&unit).unwrap();
        fs::write(unit.join("30280.m4s"), b"video").unwrap();
        fs::write(unit.join("30216.m4s"), b"audio").unwrap();
        fs::write(unit.join("30232.m4s"), b"retry").unwrap();
        fs::write(unit.join("entry.json"), b"{}").unwrap();

        let outcome = selector(SelectionKey::Name).select_dir(&unit);
        assert!(outcome.is_done());

        assert_eq!(fs::read(unit.join("1.m4s")).unwrap(), b"audio");
        assert_eq!(fs::read(unit.join("2.m4s")).unwrap(), b"retry");
        // raw fragments stay untouched
        assert_eq!(fs::read(unit.join("30280.m4s")).unwrap(), b"video");
    }

    #[test]
    fn picks_oldest_first_by_creation_time() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("z.m4s"), b"older").unwrap();
        thread::sleep(Duration::from_millis(1100));
        fs::write(root.path().join("a.m4s"), b"newer").unwrap();

        let outcome = selector(SelectionKey::Created).select_dir(root.path());
        assert!(outcome.is_done());

        assert_eq!(fs::read(root.path().join("1.m4s")).unwrap(), b"older");
        assert_eq!(fs::read(root.path().join("2.m4s")).unwrap(), b"newer");
    }

    #[test]
    fn both_canonical_present_is_a_noop() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("1.m4s"), b"first").unwrap();
        fs::write(root.path().join("2.m4s"), b"second").unwrap();
        fs::write(root.path().join("a.m4s"), b"other").unwrap();

        let outcome = selector(SelectionKey::Name).select_dir(root.path());
        assert_eq!(outcome.skip_reason(), Some(&SkipReason::AlreadySelected));
        assert_eq!(fs::read(root.path().join("1.m4s")).unwrap(), b"first");
        assert_eq!(fs::read(root.path().join("2.m4s")).unwrap(), b"second");
    }

    #[test]
    fn stale_canonical_copy_is_replaced() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("1.m4s"), b"stale").unwrap();
        fs::write(root.path().join("a.m4s"), b"fresh-a").unwrap();
        fs::write(root.path().join("b.m4s"), b"fresh-b").unwrap();

        let outcome = selector(SelectionKey::Name).select_dir(root.path());
        assert_eq!(
            outcome.status,
            UnitStatus::Done("a.m4s -> 1.m4s, b.m4s -> 2.m4s".to_string())
        );
        assert_eq!(fs::read(root.path().join("1.m4s")).unwrap(), b"fresh-a");
        assert_eq!(fs::read(root.path().join("2.m4s")).unwrap(), b"fresh-b");
    }

    #[test]
    fn single_fragment_fills_first_slot_only() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("only.m4s"), b"data").unwrap();

        let outcome = selector(SelectionKey::Name).select_dir(root.path());
        assert!(outcome.is_done());
        assert!(root.path().join("1.m4s").is_file());
        assert!(!root.path().join("2.m4s").exists());
    }

    #[test]
    fn directory_without_fragments_is_skipped() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("cover.jpg"), b"img").unwrap();

        let outcome = selector(SelectionKey::Name).select_dir(root.path());
        assert_eq!(outcome.skip_reason(), Some(&SkipReason::NoFragments));
    }

    #[test]
    fn walk_visits_root_and_nested_directories() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("videoA").join("c_123");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("x.m4s"), b"x").unwrap();
        fs::write(nested.join("y.m4s"), b"y").unwrap();

        let outcomes = selector(SelectionKey::Name).select(root.path());
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].path, root.path());
        assert_eq!(outcomes[0].skip_reason(), Some(&SkipReason::NoFragments));
        assert_eq!(outcomes[2].path, nested);
        assert!(outcomes[2].is_done());
        assert_eq!(fs::read(nested.join("1.m4s")).unwrap(), b"x");
        assert_eq!(fs::read(nested.join("2.m4s")).unwrap(), b"y");
    }
}
