//! Rebuilds playable MP4 files from the fragment pairs a streaming client
//! leaves in its cache, one subdirectory per video.

pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod fragment;
pub mod gallery;
pub mod pipeline;
pub mod remuxer;
pub mod report;
pub mod scan;
pub mod selector;
pub mod stripper;
pub mod thumbnail;

pub use config::Settings;
pub use error::MergerError;
pub use pipeline::{Pipeline, Stage};
pub use report::{Progress, RunReport, SkipReason, UnitOutcome, UnitStatus};
