// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanwerkError {
    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Video source --
    #[error("video source unavailable: {0}")]
    Source(String),

    #[error("no video source could be opened (primary: {primary}, fallback: {fallback})")]
    NoSource { primary: String, fallback: String },

    // -- Vision --
    #[error("degenerate geometry: {0}")]
    Geometry(String),

    // -- Persistence --
    #[error("failed to save capture to {path}: {reason}")]
    Persist { path: String, reason: String },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Every variant, as the workspace raises it. Adding a variant means
    /// adding the code that raises it here too.
    fn raised() -> Vec<ScanwerkError> {
        vec![
            ScanwerkError::Config("fps is zero".into()),
            ScanwerkError::Source("dir:frames".into()),
            ScanwerkError::NoSource {
                primary: "dir:frames".into(),
                fallback: "still:scan.jpg".into(),
            },
            ScanwerkError::Geometry("collinear corners".into()),
            ScanwerkError::Persist {
                path: "/tmp/x.jpg".into(),
                reason: "read-only".into(),
            },
            std::io::Error::from(std::io::ErrorKind::NotFound).into(),
            serde_json::from_str::<u8>("x").unwrap_err().into(),
        ]
    }

    fn concern(err: &ScanwerkError) -> &'static str {
        match err {
            ScanwerkError::Config(_) => "configuration",
            ScanwerkError::Source(_) | ScanwerkError::NoSource { .. } => "video source",
            ScanwerkError::Geometry(_) => "vision",
            ScanwerkError::Persist { .. } | ScanwerkError::Io(_) => "persistence",
            ScanwerkError::Serialization(_) => "configuration",
        }
    }

    #[test]
    fn every_variant_is_raised_and_described() {
        let errors = raised();
        assert_eq!(errors.len(), 7);
        for err in &errors {
            assert!(!err.to_string().is_empty());
            assert!(!concern(err).is_empty());
        }
        assert_eq!(
            errors[2].to_string(),
            "no video source could be opened (primary: dir:frames, fallback: still:scan.jpg)"
        );
    }
}
