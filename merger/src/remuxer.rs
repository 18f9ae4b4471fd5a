use crate::config::{Settings, UnitOrder};
use crate::ffmpeg::Ffmpeg;
use crate::fragment::FragmentNaming;
use crate::report::{Progress, SkipReason, UnitOutcome};
use crate::scan::{self, Entry};
use std::path::Path;
use tracing::{error, info, warn};

/// Stage three: merges the two stripped fragments of every video unit into
/// `<unit>.mp4` with the external tool.
///
/// Only the immediate subdirectories of the root are units; unlike the first
/// two stages this one does not recurse.
#[derive(Debug, Clone)]
pub struct Remuxer {
    naming: FragmentNaming,
    ffmpeg: Ffmpeg,
    order: UnitOrder,
}

impl Remuxer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            naming: FragmentNaming::new(settings.fragments.extension.clone()),
            ffmpeg: Ffmpeg::new(settings.paths.ffmpeg_path.clone()),
            order: settings.remux.order,
        }
    }

    pub fn remux(&self, root: &Path) -> Vec<UnitOutcome> {
        self.remux_with_progress(root, |_| {})
    }

    /// Processes every unit in order, calling `on_progress` before each one.
    pub fn remux_with_progress<F>(&self, root: &Path, mut on_progress: F) -> Vec<UnitOutcome>
    where
        F: FnMut(Progress),
    {
        let units = match self.units(root) {
            Ok(units) => units,
            Err(e) => {
                warn!("list units of {}: {}", root.display(), e);
                return vec![UnitOutcome::failed(root, e)];
            }
        };

        let total = units.len();
        let mut outcomes = Vec::with_capacity(total);
        for (i, unit) in units.iter().enumerate() {
            on_progress(Progress {
                current: i + 1,
                total,
                message: format!("processing {}", unit.name),
            });
            outcomes.push(self.remux_unit(&unit.path));
        }

        outcomes
    }

    /// Merges a single unit directory.
    pub fn remux_unit(&self, unit: &Path) -> UnitOutcome {
        let Some(output) = self.naming.output_for(unit) else {
            return UnitOutcome::failed(unit, "unit name is not valid UTF-8");
        };

        if output.is_file() {
            info!("{} already exists, skipping", output.display());
            return UnitOutcome::skipped(unit, SkipReason::AlreadyMerged);
        }

        let inputs: Vec<_> = self
            .naming
            .stripped_names()
            .into_iter()
            .map(|name| (unit.join(&name), name))
            .collect();
        let missing: Vec<String> = inputs
            .iter()
            .filter(|(path, _)| !path.is_file())
            .map(|(_, name)| name.clone())
            .collect();
        if !missing.is_empty() {
            warn!("{}: missing {}", unit.display(), missing.join(", "));
            return UnitOutcome::skipped(unit, SkipReason::MissingFragments(missing));
        }

        info!("merging {}", unit.display());
        let mut cmd = self
            .ffmpeg
            .merge_command(&inputs[0].0, &inputs[1].0, &output);
        match self.ffmpeg.run(&mut cmd) {
            Ok(()) => {
                info!("merged {}", output.display());
                UnitOutcome::done(unit, output.display().to_string())
            }
            Err(e) => {
                error!("merge failed for {}: {}", unit.display(), e);
                UnitOutcome::failed(unit, e)
            }
        }
    }

    fn units(&self, root: &Path) -> std::io::Result<Vec<Entry>> {
        let mut units = scan::list_units(root)?;
        match self.order {
            UnitOrder::Newest => {
                units.sort_by(|a, b| b.created.cmp(&a.created).then(a.name.cmp(&b.name)))
            }
            UnitOrder::Name => units.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use std::{fs, thread};
    use tempfile::TempDir;

    fn remuxer(order: UnitOrder) -> Remuxer {
        let mut settings = Settings::default();
        settings.paths.ffmpeg_path = "/nonexistent/ffmpeg-for-tests".into();
        settings.remux.order = order;
        Remuxer::new(&settings)
    }

    #[test]
    fn existing_output_skips_without_invoking_the_tool() {
        let root = TempDir::new().unwrap();
        let unit = root.path().join("videoA");
        fs::create_dir(&unit).unwrap();
        fs::write(unit.join("videoA.mp4"), b"done").unwrap();
        fs::write(unit.join("1_delete8.m4s"), b"v").unwrap();
        fs::write(unit.join("2_delete8.m4s"), b"a").unwrap();

        // the configured tool does not exist, so any invocation would fail
        let outcome = remuxer(UnitOrder::Name).remux_unit(&unit);
        assert_eq!(outcome.skip_reason(), Some(&SkipReason::AlreadyMerged));
        assert_eq!(fs::read(unit.join("videoA.mp4")).unwrap(), b"done");
    }

    #[test]
    fn missing_fragment_is_named() {
        let root = TempDir::new().unwrap();
        let unit = root.path().join("videoA");
        fs::create_dir(&unit).unwrap();
        fs::write(unit.join("1_delete8.m4s"), b"v").unwrap();

        let outcome = remuxer(UnitOrder::Name).remux_unit(&unit);
        assert_eq!(
            outcome.skip_reason(),
            Some(&SkipReason::MissingFragments(vec!["2_delete8.m4s".to_string()]))
        );
        assert!(!unit.join("videoA.mp4").exists());
    }

    #[test]
    fn tool_start_failure_fails_only_that_unit() {
        let root = TempDir::new().unwrap();
        for name in ["a", "b"] {
            let unit = root.path().join(name);
            fs::create_dir(&unit).unwrap();
            fs::write(unit.join("1_delete8.m4s"), b"v").unwrap();
            fs::write(unit.join("2_delete8.m4s"), b"a").unwrap();
        }

        let outcomes = remuxer(UnitOrder::Name).remux(root.path());
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(UnitOutcome::is_failed));
        // inputs survive a failed merge
        assert!(root.path().join("a").join("1_delete8.m4s").is_file());
    }

    #[test]
    fn progress_is_reported_before_each_unit() {
        let root = TempDir::new().unwrap();
        for name in ["b", "a", "c"] {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        fs::write(root.path().join("stray.m4s"), b"x").unwrap();

        let mut ticks = Vec::new();
        let outcomes =
            remuxer(UnitOrder::Name).remux_with_progress(root.path(), |p| ticks.push(p));

        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            ticks,
            vec![
                Progress {
                    current: 1,
                    total: 3,
                    message: "processing a".to_string()
                },
                Progress {
                    current: 2,
                    total: 3,
                    message: "processing b".to_string()
                },
                Progress {
                    current: 3,
                    total: 3,
                    message: "processing c".to_string()
                },
            ]
        );
    }

    #[test]
    fn does_not_recurse_into_nested_directories() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("videoA").join("inner");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("1_delete8.m4s"), b"v").unwrap();
        fs::write(nested.join("2_delete8.m4s"), b"a").unwrap();

        let outcomes = remuxer(UnitOrder::Name).remux(root.path());
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].path, root.path().join("videoA"));
        assert!(matches!(
            outcomes[0].skip_reason(),
            Some(SkipReason::MissingFragments(names)) if names.len() == 2
        ));
    }

    #[test]
    fn missing_root_is_one_failure() {
        let root = TempDir::new().unwrap();
        let outcomes = remuxer(UnitOrder::Newest).remux(&root.path().join("gone"));
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_failed());
    }

    #[test]
    fn newest_unit_goes_first_by_default() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("b-older")).unwrap();
        thread::sleep(Duration::from_millis(1100));
        fs::create_dir(root.path().join("a-newer")).unwrap();

        let mut settings = Settings::default();
        settings.paths.ffmpeg_path = "/nonexistent/ffmpeg-for-tests".into();
        assert_eq!(settings.remux.order, UnitOrder::Newest);

        let mut messages = Vec::new();
        Remuxer::new(&settings).remux_with_progress(root.path(), |p| messages.push(p.message));
        assert_eq!(messages, vec!["processing a-newer", "processing b-older"]);
    }
}
