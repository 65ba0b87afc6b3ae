// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame sources.
//
// A source yields frames on demand and returns `None` for a frame it could
// not produce; the caller skips that iteration.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbImage;
use scanwerk_core::config::SourceConfig;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, warn};

/// File extensions read by [`DirectorySource`].
const FRAME_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tif"];

pub trait FrameSource {
    /// The next frame, or `None` when none is available right now.
    fn next_frame(&mut self) -> Option<RgbImage>;

    /// True once the source will never produce another frame.
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

// -- Still image --------------------------------------------------------------

/// Repeats one image forever.
pub struct StillImageSource {
    path: PathBuf,
    frame: RgbImage,
}

impl StillImageSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let frame = image::open(path)
            .map_err(|err| ScanwerkError::Source(format!("{}: {err}", path.display())))?
            .to_rgb8();
        Ok(Self {
            path: path.to_path_buf(),
            frame,
        })
    }
}

impl FrameSource for StillImageSource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        Some(self.frame.clone())
    }

    fn describe(&self) -> String {
        format!("still image {}", self.path.display())
    }
}

// -- Directory ----------------------------------------------------------------

/// Plays the images in a folder in file-name order.
pub struct DirectorySource {
    folder: PathBuf,
    frames: Vec<PathBuf>,
    next: usize,
    looping: bool,
}

impl DirectorySource {
    pub fn open(folder: impl AsRef<Path>, looping: bool) -> Result<Self> {
        let folder = folder.as_ref();
        let mut frames: Vec<PathBuf> = std::fs::read_dir(folder)
            .map_err(|err| ScanwerkError::Source(format!("{}: {err}", folder.display())))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_frame_file(path))
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(ScanwerkError::Source(format!(
                "{} holds no image frames",
                folder.display()
            )));
        }
        debug!(folder = %folder.display(), count = frames.len(), "frame directory indexed");
        Ok(Self {
            folder: folder.to_path_buf(),
            frames,
            next: 0,
            looping,
        })
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

impl FrameSource for DirectorySource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        if self.next >= self.frames.len() {
            if !self.looping {
                return None;
            }
            self.next = 0;
        }
        let path = &self.frames[self.next];
        self.next += 1;

        match image::open(path) {
            Ok(frame) => Some(frame.to_rgb8()),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable frame skipped");
                None
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        !self.looping && self.next >= self.frames.len()
    }

    fn describe(&self) -> String {
        format!("frame directory {}", self.folder.display())
    }
}

// -- Opening ------------------------------------------------------------------

/// Open a source from its identifier.
///
/// `still:<file>` and `dir:<folder>` are explicit; a bare path is a
/// directory source if it names a folder and a still image otherwise.
pub fn open_source(target: &str, looping: bool) -> Result<Box<dyn FrameSource>> {
    if let Some(path) = target.strip_prefix("still:") {
        return Ok(Box::new(StillImageSource::open(path)?));
    }
    if let Some(path) = target.strip_prefix("dir:") {
        return Ok(Box::new(DirectorySource::open(path, looping)?));
    }
    if target.contains("://") {
        return Err(ScanwerkError::Source(format!(
            "streaming source `{target}` is not supported"
        )));
    }

    let path = Path::new(target);
    if path.is_dir() {
        Ok(Box::new(DirectorySource::open(path, looping)?))
    } else {
        Ok(Box::new(StillImageSource::open(path)?))
    }
}

/// Open `primary`, or `fallback` if that fails. Both failing is fatal.
pub fn open_with_fallback(
    primary: &str,
    fallback: Option<&str>,
    looping: bool,
) -> Result<Box<dyn FrameSource>> {
    let primary_err = match open_source(primary, looping) {
        Ok(source) => {
            info!(source = %source.describe(), "video source opened");
            return Ok(source);
        }
        Err(err) => err,
    };
    warn!(primary, error = %primary_err, "primary video source unavailable");

    let Some(fallback) = fallback else {
        return Err(ScanwerkError::NoSource {
            primary: primary_err.to_string(),
            fallback: "none configured".into(),
        });
    };

    match open_source(fallback, looping) {
        Ok(source) => {
            info!(source = %source.describe(), "fallback video source opened");
            Ok(source)
        }
        Err(fallback_err) => Err(ScanwerkError::NoSource {
            primary: primary_err.to_string(),
            fallback: fallback_err.to_string(),
        }),
    }
}

/// Normalise a raw frame: resize to the configured resolution and mirror.
pub fn prepare_frame(frame: RgbImage, config: &SourceConfig) -> RgbImage {
    let target = (config.frame_width, config.frame_height);
    let sized = if frame.dimensions() == target {
        frame
    } else {
        imageops::resize(&frame, target.0, target.1, FilterType::Triangle)
    };
    if config.mirror {
        imageops::flip_horizontal(&sized)
    } else {
        sized
    }
}
