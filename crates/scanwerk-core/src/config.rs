// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.
//
// Loaded once at startup from JSON and shared read-only afterwards. Every
// section defaults independently, so a partial file overrides only what it
// names.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanwerkError};

/// Environment variable naming the config file when no CLI argument is given.
pub const CONFIG_ENV: &str = "SCANWERK_CONFIG";

/// Complete scanner settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub source: SourceConfig,
    pub detection: DetectionConfig,
    pub capture: CaptureConfig,
    pub controller: ControllerConfig,
}

/// Where frames come from and how they are normalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Primary source: `still:<file>`, `dir:<folder>`, or a bare path.
    pub primary: String,
    /// Tried once if the primary cannot be opened.
    pub fallback: Option<String>,
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: u32,
    /// Flip frames horizontally before analysis.
    pub mirror: bool,
    /// Restart a directory source from its first frame when it runs out.
    pub looping: bool,
}

impl SourceConfig {
    /// Time between frames at the configured rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            primary: "dir:frames".into(),
            fallback: Some("still:scan.jpg".into()),
            frame_width: 480,
            frame_height: 360,
            fps: 30,
            mirror: true,
            looping: false,
        }
    }
}

/// Tunables for conditioning and locating the document outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub min_area: f64,
    pub max_area: f64,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub epsilon_factor: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Minimum distance in pixels between any corner and the frame border.
    pub border_margin: i32,
    /// Intersect the edge mask with the paper-colour mask.
    pub color_assist: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_area: 1500.0,
            max_area: 300_000.0,
            canny_low: 20.0,
            canny_high: 100.0,
            epsilon_factor: 0.02,
            min_aspect: 0.2,
            max_aspect: 5.0,
            border_margin: 10,
            color_assist: true,
        }
    }
}

/// Capture timing, quality gate and output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// How long a document must stay valid before it is saved.
    pub dwell_seconds: u64,
    /// Minimum composite quality score (0-100).
    pub quality_threshold: u8,
    /// Apply contrast enhancement to saved captures.
    pub auto_enhance: bool,
    /// Frames are ignored for this long after an automatic save.
    pub post_save_pause_ms: u64,
    pub save_folder: PathBuf,
    /// Write annotated preview images next to the captures.
    pub preview: bool,
}

impl CaptureConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_secs(self.dwell_seconds)
    }

    pub fn post_save_pause(&self) -> Duration {
        Duration::from_millis(self.post_save_pause_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            dwell_seconds: 5,
            quality_threshold: 60,
            auto_enhance: true,
            post_save_pause_ms: 1500,
            save_folder: default_save_folder(),
            preview: false,
        }
    }
}

/// Connection to the external controller device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// `serial:<device>`, `tcp:<host:port>`, or `none`.
    pub link: String,
    /// Upper bound on one send, reopening the link included.
    pub write_timeout_ms: u64,
    /// Quiet period after opening a serial device; sends during it are held.
    pub settle_ms: u64,
}

impl ControllerConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            link: "none".into(),
            write_timeout_ms: 10,
            settle_ms: 500,
        }
    }
}

// -- Loading ----------------------------------------------------------------

impl ScannerConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to validated defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Reject values that cannot produce a working scanner.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        if d.min_area < 0.0 || d.min_area > d.max_area {
            return Err(ScanwerkError::Config(format!(
                "area bounds inverted: min {} > max {}",
                d.min_area, d.max_area
            )));
        }
        if d.canny_low < 0.0 || d.canny_low > d.canny_high {
            return Err(ScanwerkError::Config(format!(
                "edge thresholds inverted: low {} > high {}",
                d.canny_low, d.canny_high
            )));
        }
        if d.epsilon_factor <= 0.0 {
            return Err(ScanwerkError::Config(
                "approximation tolerance must be positive".into(),
            ));
        }
        if d.min_aspect <= 0.0 || d.min_aspect > d.max_aspect {
            return Err(ScanwerkError::Config(format!(
                "aspect bounds inverted: min {} > max {}",
                d.min_aspect, d.max_aspect
            )));
        }
        if d.border_margin < 0 {
            return Err(ScanwerkError::Config("border margin is negative".into()));
        }

        let s = &self.source;
        if s.fps == 0 {
            return Err(ScanwerkError::Config("frame rate must be non-zero".into()));
        }
        if s.frame_width == 0 || s.frame_height == 0 {
            return Err(ScanwerkError::Config(format!(
                "frame resolution {}x{} is empty",
                s.frame_width, s.frame_height
            )));
        }

        if self.capture.quality_threshold > 100 {
            return Err(ScanwerkError::Config(format!(
                "quality threshold {} exceeds 100",
                self.capture.quality_threshold
            )));
        }
        Ok(())
    }
}

/// Default capture folder under the user's data directory.
pub fn default_save_folder() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        PathBuf::from("/tmp")
    };
    base.join("scanwerk").join("captures")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ScannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.min_area, 1500.0);
        assert_eq!(config.capture.dwell(), Duration::from_secs(5));
        assert_eq!(config.capture.post_save_pause(), Duration::from_millis(1500));
        assert_eq!(config.controller.write_timeout(), Duration::from_millis(10));
    }

    /// A partial file overrides only the fields it names.
    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "capture": {{ "dwell_seconds": 2 }}, "detection": {{ "color_assist": false }} }}"#
        )
        .unwrap();

        let config = ScannerConfig::load(file.path()).unwrap();
        assert_eq!(config.capture.dwell_seconds, 2);
        assert_eq!(config.capture.quality_threshold, 60);
        assert!(!config.detection.color_assist);
        assert_eq!(config.detection.canny_high, 100.0);
        assert_eq!(config.source.fps, 30);
    }

    #[test]
    fn inverted_area_bounds_rejected() {
        let mut config = ScannerConfig::default();
        config.detection.min_area = 10_000.0;
        config.detection.max_area = 100.0;
        assert!(matches!(config.validate(), Err(ScanwerkError::Config(_))));
    }

    #[test]
    fn zero_fps_rejected() {
        let mut config = ScannerConfig::default();
        config.source.fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_canny_rejected() {
        let mut config = ScannerConfig::default();
        config.detection.canny_low = 200.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ScannerConfig::load_or_default(Some(&dir.path().join("absent.json")));
        assert!(matches!(result, Err(ScanwerkError::Io(_))));
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let result = ScannerConfig::load(file.path());
        assert!(matches!(result, Err(ScanwerkError::Serialization(_))));
    }

    /// Line settings belong to the OS; the controller section only names the
    /// link and its timing.
    #[test]
    fn controller_section_has_no_line_settings() {
        let json = serde_json::to_value(ControllerConfig::default()).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["link", "settle_ms", "write_timeout_ms"]);
    }

    #[test]
    fn frame_interval_matches_rate() {
        let source = SourceConfig {
            fps: 10,
            ..SourceConfig::default()
        };
        assert_eq!(source.frame_interval(), Duration::from_millis(100));
    }
}
