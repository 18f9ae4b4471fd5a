use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Why a unit (or a single fragment) was left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Both canonical fragments are already in place.
    AlreadySelected,
    /// No raw fragment to choose from.
    NoFragments,
    /// The stripped copy exists from an earlier run.
    AlreadyStripped,
    /// The output container exists from an earlier run.
    AlreadyMerged,
    /// Stripped fragments absent at remux time, by file name.
    MissingFragments(Vec<String>),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadySelected => write!(f, "canonical fragments already present"),
            SkipReason::NoFragments => write!(f, "no fragment files found"),
            SkipReason::AlreadyStripped => write!(f, "stripped fragment already present"),
            SkipReason::AlreadyMerged => write!(f, "output already exists"),
            SkipReason::MissingFragments(names) => write!(f, "missing {}", names.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum UnitStatus {
    Done(String),
    Skipped(SkipReason),
    Failed(String),
}

/// Result of one stage for one directory or file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: UnitStatus,
}

impl UnitOutcome {
    pub fn done(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: UnitStatus::Done(detail.into()),
        }
    }

    pub fn skipped(path: impl Into<PathBuf>, reason: SkipReason) -> Self {
        Self {
            path: path.into(),
            status: UnitStatus::Skipped(reason),
        }
    }

    pub fn failed(path: impl Into<PathBuf>, error: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            status: UnitStatus::Failed(error.to_string()),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.status, UnitStatus::Done(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, UnitStatus::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, UnitStatus::Failed(_))
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.status {
            UnitStatus::Skipped(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Per-status totals of one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Counts {
    pub fn of(outcomes: &[UnitOutcome]) -> Self {
        outcomes.iter().fold(Counts::default(), |mut c, o| {
            match o.status {
                UnitStatus::Done(_) => c.done += 1,
                UnitStatus::Skipped(_) => c.skipped += 1,
                UnitStatus::Failed(_) => c.failed += 1,
            }
            c
        })
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} done, {} skipped, {} failed",
            self.done, self.skipped, self.failed
        )
    }
}

/// Everything one pipeline run did, stage by stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub selected: Vec<UnitOutcome>,
    pub stripped: Vec<UnitOutcome>,
    pub remuxed: Vec<UnitOutcome>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.outcomes().any(UnitOutcome::is_failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes().filter(|o| o.is_failed())
    }

    fn outcomes(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.selected
            .iter()
            .chain(self.stripped.iter())
            .chain(self.remuxed.iter())
    }
}

/// One progress tick emitted by the remuxer before it handles a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 1-based index of the unit about to be processed.
    pub current: usize,
    pub total: usize,
    pub message: String,
}
