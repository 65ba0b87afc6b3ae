// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture persistence: one JPEG per saved document.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::{ImageFormat, RgbImage};
use scanwerk_core::CaptureKind;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{info, instrument};

/// Local-time stamp used in capture file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Writes rectified captures into a folder.
#[derive(Debug, Clone)]
pub struct CaptureStore {
    folder: PathBuf,
}

impl CaptureStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Create the capture folder if it does not exist yet.
    pub fn ensure_folder(&self) -> Result<()> {
        std::fs::create_dir_all(&self.folder)?;
        Ok(())
    }

    /// `<prefix>_<timestamp>_<sequence>.jpg`
    pub fn file_name(kind: CaptureKind, timestamp: &DateTime<Local>, sequence: u64) -> String {
        format!(
            "{}_{}_{}.jpg",
            kind.file_prefix(),
            timestamp.format(TIMESTAMP_FORMAT),
            sequence
        )
    }

    /// Encode `image` as JPEG under a fresh name and return its path.
    #[instrument(skip(self, image))]
    pub fn persist(&self, image: &RgbImage, kind: CaptureKind, sequence: u64) -> Result<PathBuf> {
        let path = self
            .folder
            .join(Self::file_name(kind, &Local::now(), sequence));

        image
            .save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|err| ScanwerkError::Persist {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;

        info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "capture saved"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::Rgb;

    #[test]
    fn file_names_follow_pattern() {
        let ts = Local.with_ymd_and_hms(2026, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            CaptureStore::file_name(CaptureKind::Automatic, &ts, 4),
            "doc_2026-03-09_07-05-01_4.jpg"
        );
        assert_eq!(
            CaptureStore::file_name(CaptureKind::Manual, &ts, 12),
            "manual_2026-03-09_07-05-01_12.jpg"
        );
    }

    #[test]
    fn persist_writes_a_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let store = CaptureStore::new(dir.path().join("captures"));
        store.ensure_folder().unwrap();

        let image = RgbImage::from_pixel(320, 300, Rgb([200, 200, 200]));
        let path = store.persist(&image, CaptureKind::Automatic, 1).unwrap();

        assert!(path.starts_with(store.folder()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("doc_") && name.ends_with("_1.jpg"), "{name}");

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 300));
    }

    /// A folder that cannot be written surfaces a persistence error.
    #[test]
    fn unwritable_folder_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = CaptureStore::new(file.path().join("inside-a-file"));
        let image = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));

        let result = store.persist(&image, CaptureKind::Manual, 1);
        assert!(matches!(result, Err(ScanwerkError::Persist { .. })));
        assert!(store.ensure_folder().is_err());
    }
}
