//! Preview images for finished videos.

use crate::config::Settings;
use crate::ffmpeg::Ffmpeg;
use image::imageops::FilterType;
use image::io::Reader as ImageReader;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Sibling image extensions accepted as an existing preview, in lookup order.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];

/// Fill colour of the placeholder shown when no frame could be obtained.
pub const PLACEHOLDER_COLOR: [u8; 3] = [200, 200, 200];

/// Where a preview came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewSource {
    /// An image that was already next to the video.
    Existing(PathBuf),
    /// A frame the tool extracted during this call.
    Extracted(PathBuf),
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct Preview {
    /// Scaled to fit the display size, aspect ratio kept.
    pub image: DynamicImage,
    pub source: PreviewSource,
}

/// Finds or generates the still image shown for an output container.
#[derive(Debug, Clone)]
pub struct PreviewResolver {
    ffmpeg: Ffmpeg,
    offset: Duration,
    quality: u8,
    width: u32,
    height: u32,
    extract: bool,
}

impl PreviewResolver {
    pub fn new(settings: &Settings) -> Self {
        Self {
            ffmpeg: Ffmpeg::new(settings.paths.ffmpeg_path.clone()),
            offset: settings.preview.offset,
            quality: settings.preview.quality,
            width: settings.preview.width,
            height: settings.preview.height,
            extract: settings.preview.extract,
        }
    }

    pub fn resolve(&self, video: &Path) -> Preview {
        if let Some(existing) = sibling_image(video) {
            return match self.load(&existing) {
                Some(image) => Preview {
                    image,
                    source: PreviewSource::Existing(existing),
                },
                None => self.placeholder(),
            };
        }

        let target = video.with_extension(IMAGE_EXTENSIONS[0]);
        if self.extract {
            let mut cmd = self
                .ffmpeg
                .frame_command(video, self.offset, self.quality, &target);
            if let Err(e) = self.ffmpeg.run_quiet(&mut cmd) {
                debug!("frame extraction for {}: {}", video.display(), e);
            }
        }

        if target.is_file() {
            if let Some(image) = self.load(&target) {
                return Preview {
                    image,
                    source: PreviewSource::Extracted(target),
                };
            }
        }

        self.placeholder()
    }

    fn load(&self, path: &Path) -> Option<DynamicImage> {
        let decoded = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(image::ImageError::IoError)
            .and_then(|reader| reader.decode());

        match decoded {
            Ok(image) => Some(image.resize(self.width, self.height, FilterType::Triangle)),
            Err(e) => {
                warn!("preview {}: {}", path.display(), e);
                None
            }
        }
    }

    fn placeholder(&self) -> Preview {
        let image = RgbImage::from_pixel(self.width, self.height, Rgb(PLACEHOLDER_COLOR));
        Preview {
            image: DynamicImage::ImageRgb8(image),
            source: PreviewSource::Placeholder,
        }
    }
}

/// `<base>.jpg`, `<base>.png` or `<base>.jpeg` next to the video, first found.
pub fn sibling_image(video: &Path) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| video.with_extension(ext))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use std::fs;
    use tempfile::TempDir;

    fn resolver(extract: bool) -> PreviewResolver {
        let mut settings = Settings::default();
        settings.paths.ffmpeg_path = "/nonexistent/ffmpeg-for-tests".into();
        settings.preview.extract = extract;
        PreviewResolver::new(&settings)
    }

    #[test]
    fn existing_sibling_is_scaled_to_fit() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("videoA.mp4");
        fs::write(&video, b"mp4").unwrap();
        let png = dir.path().join("videoA.png");
        RgbImage::from_pixel(400, 100, Rgb([10, 20, 30]))
            .save(&png)
            .unwrap();

        let preview = resolver(true).resolve(&video);
        assert_eq!(preview.source, PreviewSource::Existing(png));
        assert_eq!(preview.image.dimensions(), (200, 50));
    }

    #[test]
    fn jpg_wins_over_png() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("v.mp4");
        fs::write(dir.path().join("v.png"), b"x").unwrap();
        fs::write(dir.path().join("v.jpg"), b"x").unwrap();

        assert_eq!(sibling_image(&video), Some(dir.path().join("v.jpg")));
    }

    #[test]
    fn failed_extraction_falls_back_to_placeholder() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("short.mp4");
        fs::write(&video, b"mp4").unwrap();

        let preview = resolver(true).resolve(&video);
        assert_eq!(preview.source, PreviewSource::Placeholder);
        assert_eq!(preview.image.dimensions(), (200, 120));
        assert_eq!(preview.image.to_rgb8().get_pixel(0, 0), &Rgb(PLACEHOLDER_COLOR));
        assert!(!dir.path().join("short.jpg").exists());
    }

    #[test]
    fn undecodable_sibling_falls_back_to_placeholder() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("v.mp4");
        fs::write(dir.path().join("v.jpg"), b"not an image").unwrap();

        let preview = resolver(false).resolve(&video);
        assert_eq!(preview.source, PreviewSource::Placeholder);
        // a broken user image is not replaced
        assert_eq!(fs::read(dir.path().join("v.jpg")).unwrap(), b"not an image");
    }
}
