use crate::error::MergerError;
use common::defaults::Bool;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Main configuration structure for the merger.
///
/// Loaded once at startup and handed to each pipeline component; any change
/// is persisted by rewriting the whole file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub fragments: Fragments,
    #[serde(default)]
    pub remux: Remux,
    #[serde(default)]
    pub preview: Preview,
}

/// Locations chosen by the user.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Paths {
    /// Cache directory of the streaming client, one subdirectory per video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_dir: Option<PathBuf>,
    /// Executable (or command on `PATH`) used for remuxing and frame extraction.
    #[serde(default = "Paths::default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
}

impl Paths {
    fn default_ffmpeg_path() -> PathBuf {
        PathBuf::from("ffmpeg")
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            video_dir: None,
            ffmpeg_path: Self::default_ffmpeg_path(),
        }
    }
}

/// How cached fragments are recognised and cleaned.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Fragments {
    /// Extension of the fragment files, without the leading dot.
    #[serde(default = "Fragments::default_extension")]
    pub extension: String,
    /// Length of the proprietary prefix the client writes before the stream data.
    #[serde(default = "Fragments::default_header_size")]
    pub header_size: usize,
    #[serde(default)]
    pub selection: SelectionKey,
}

impl Fragments {
    fn default_extension() -> String {
        "m4s".to_string()
    }

    fn default_header_size() -> usize {
        9
    }
}

impl Default for Fragments {
    fn default() -> Self {
        Self {
            extension: Self::default_extension(),
            header_size: Self::default_header_size(),
            selection: SelectionKey::default(),
        }
    }
}

/// Order in which raw fragments compete for the two canonical slots.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKey {
    /// Lexical file name order
    Name,
    /// File creation time, oldest first
    Created,
}

impl Default for SelectionKey {
    fn default() -> Self {
        SelectionKey::Name
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Remux {
    #[serde(default)]
    pub order: UnitOrder,
}

/// Order in which video units are handed to the remux tool.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitOrder {
    /// Most recently created unit first
    Newest,
    /// Directory name order
    Name,
}

impl Default for UnitOrder {
    fn default() -> Self {
        UnitOrder::Newest
    }
}

/// Preview image settings for the gallery.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Preview {
    /// Position of the extracted frame, skipping black leading frames.
    #[serde(default = "Preview::default_offset", with = "humantime_serde")]
    pub offset: Duration,
    /// JPEG quality scale passed as `-q:v` (2 is best).
    #[serde(default = "Preview::default_quality")]
    pub quality: u8,
    #[serde(default = "Preview::default_width")]
    pub width: u32,
    #[serde(default = "Preview::default_height")]
    pub height: u32,
    /// Ask the tool for a frame when no sibling image exists.
    #[serde(default = "Bool::r#true")]
    pub extract: bool,
}

impl Preview {
    fn default_offset() -> Duration {
        Duration::from_secs(5)
    }

    fn default_quality() -> u8 {
        2
    }

    fn default_width() -> u32 {
        200
    }

    fn default_height() -> u32 {
        120
    }
}

impl Default for Preview {
    fn default() -> Self {
        Self {
            offset: Self::default_offset(),
            quality: Self::default_quality(),
            width: Self::default_width(),
            height: Self::default_height(),
            extract: true,
        }
    }
}

impl Settings {
    /// Reads the configuration file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MergerError> {
        let path = path.as_ref();
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("config file '{}' not found, using defaults", path.display());
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(MergerError::ConfigError(format!(
                    "Failed to read '{}': {}",
                    path.display(),
                    e
                )))
            }
        };

        let settings: Settings = toml::from_str(&data)
            .map_err(|e| MergerError::ConfigError(format!("Invalid configuration: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rewrites the configuration file in full.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MergerError> {
        let path = path.as_ref();
        let data = toml::to_string_pretty(self)
            .map_err(|e| MergerError::ConfigError(format!("Failed to encode: {}", e)))?;

        fs::write(path, data).map_err(|e| {
            MergerError::ConfigError(format!("Failed to write '{}': {}", path.display(), e))
        })?;

        debug!("configuration saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), MergerError> {
        let ext = &self.fragments.extension;
        if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
            return Err(MergerError::ConfigError(format!(
                "fragments.extension must be a bare extension, got '{}'",
                ext
            )));
        }
        if self.preview.width == 0 || self.preview.height == 0 {
            return Err(MergerError::ConfigError(
                "preview size must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// The configured video directory, checked to exist and be a directory.
    pub fn video_dir(&self) -> Result<&Path, MergerError> {
        let dir = self.paths.video_dir.as_deref().ok_or_else(|| {
            MergerError::InputError("video directory is not set, use `set-dir` first".to_string())
        })?;

        if !dir.is_dir() {
            return Err(MergerError::InputError(format!(
                "video directory '{}' does not exist or is not a directory",
                dir.display()
            )));
        }

        Ok(dir)
    }
}
