use crate::config::Settings;
use crate::error::MergerError;
use crate::remuxer::Remuxer;
use crate::report::{Counts, Progress, RunReport};
use crate::selector::FragmentSelector;
use crate::stripper::HeaderStripper;
use std::path::{Path, PathBuf};
use tracing::info;

/// Stage announced to the caller between pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Select,
    Strip,
    Remux,
}

impl ToString for Stage {
    fn to_string(&self) -> String {
        match self {
            Stage::Select => "selecting fragments",
            Stage::Strip => "stripping headers",
            Stage::Remux => "merging videos",
        }
        .to_string()
    }
}

/// Runs select, strip and remux over one video directory.
///
/// Selection and stripping cover the whole tree before any remux starts.
/// Everything runs on the calling thread.
#[derive(Debug, Clone)]
pub struct Pipeline {
    root: PathBuf,
    selector: FragmentSelector,
    stripper: HeaderStripper,
    remuxer: Remuxer,
}

impl Pipeline {
    /// Builds the stages from `settings`; fails before touching any file if the
    /// video directory is unset or missing.
    pub fn new(settings: &Settings) -> Result<Self, MergerError> {
        let root = settings.video_dir()?.to_path_buf();
        Ok(Self::with_root(root, settings))
    }

    pub fn with_root(root: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self {
            root: root.into(),
            selector: FragmentSelector::new(settings),
            stripper: HeaderStripper::new(settings),
            remuxer: Remuxer::new(settings),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run(&self) -> Result<RunReport, MergerError> {
        self.run_with_progress(|_| {}, |_| {})
    }

    /// `on_stage` fires when a stage begins, `on_progress` before each remuxed unit.
    pub fn run_with_progress<S, P>(
        &self,
        mut on_stage: S,
        on_progress: P,
    ) -> Result<RunReport, MergerError>
    where
        S: FnMut(Stage),
        P: FnMut(Progress),
    {
        if !self.root.is_dir() {
            return Err(MergerError::InputError(format!(
                "video directory '{}' does not exist or is not a directory",
                self.root.display()
            )));
        }

        let mut report = RunReport::default();

        on_stage(Stage::Select);
        report.selected = self.selector.select(&self.root);
        info!("selection: {}", Counts::of(&report.selected));

        on_stage(Stage::Strip);
        report.stripped = self.stripper.strip(&self.root);
        info!("stripping: {}", Counts::of(&report.stripped));

        on_stage(Stage::Remux);
        report.remuxed = self.remuxer.remux_with_progress(&self.root, on_progress);
        info!("merging: {}", Counts::of(&report.remuxed));

        Ok(report)
    }
}
