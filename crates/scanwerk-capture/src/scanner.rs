// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The per-frame scanning pipeline.
//
// Conditioning, outline search, rectification and scoring feed the capture
// state machine; its directives are carried out here (persistence and
// controller notifications).

use std::path::PathBuf;
use std::time::Instant;

use image::{GrayImage, RgbImage};
use scanwerk_core::config::ScannerConfig;
use scanwerk_core::error::Result;
use scanwerk_core::{CaptureKind, CaptureState, ControllerEvent, QualityMetrics, Quad};
use scanwerk_vision::{DocumentLocator, FrameConditioner, PerspectiveRectifier, QualityAssessor};
use tracing::{debug, error, info, instrument};

use crate::link::ControllerLink;
use crate::notify::NotificationChannel;
use crate::session::{CaptureStateMachine, Directive, Observation};
use crate::store::CaptureStore;

/// Everything the operator display needs about one processed frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// The conditioned mask the outline search ran on.
    pub mask: GrayImage,
    /// The located document, if any.
    pub quad: Option<Quad>,
    pub quality: Option<QualityMetrics>,
    pub state: CaptureState,
    /// Countdown to an automatic save while detecting.
    pub remaining_seconds: Option<u64>,
    /// Path of a capture written during this frame.
    pub saved: Option<PathBuf>,
    /// Why an automatic save during this frame failed.
    pub save_error: Option<String>,
}

pub struct Scanner<L> {
    config: ScannerConfig,
    machine: CaptureStateMachine,
    store: CaptureStore,
    channel: NotificationChannel<L>,
    rectifier: PerspectiveRectifier,
    assessor: QualityAssessor,
    /// Document located in the most recently processed frame.
    last_quad: Option<Quad>,
}

impl<L: ControllerLink> Scanner<L> {
    // -- Construction ---------------------------------------------------------

    /// Validate `config` and prepare the capture folder.
    pub fn new(config: ScannerConfig, channel: NotificationChannel<L>) -> Result<Self> {
        config.validate()?;
        let store = CaptureStore::new(&config.capture.save_folder);
        store.ensure_folder()?;

        Ok(Self {
            machine: CaptureStateMachine::new(
                config.capture.dwell(),
                config.capture.post_save_pause(),
            ),
            store,
            channel,
            rectifier: PerspectiveRectifier::new(config.capture.auto_enhance),
            assessor: QualityAssessor::new(config.capture.quality_threshold),
            last_quad: None,
            config,
        })
    }

    // -- Per-frame ------------------------------------------------------------

    /// Analyse one frame and carry out whatever the state machine asks for.
    #[instrument(skip_all)]
    pub async fn process_frame(&mut self, frame: &RgbImage, now: Instant) -> FrameReport {
        let detection = &self.config.detection;
        let mask = FrameConditioner::new(detection).condition(frame);
        let candidate = DocumentLocator::new(detection).locate(&mask, frame.dimensions());
        let quad = candidate.as_ref().and_then(|c| c.quad());

        let mut rectified = quad.and_then(|q| match self.rectifier.rectify(frame, &q) {
            Ok(flat) => Some((q, flat)),
            Err(err) => {
                debug!(error = %err, "candidate could not be rectified");
                None
            }
        });
        let quality = rectified.as_ref().map(|(_, flat)| self.assessor.assess(flat));
        self.last_quad = quad;

        let observation = Observation {
            candidate: quad,
            quality_acceptable: quality.is_some_and(|q| q.acceptable),
        };

        let mut saved = None;
        let mut save_error = None;
        for directive in self.machine.observe(observation, now) {
            match directive {
                Directive::Notify(event) => {
                    if event == ControllerEvent::Detected {
                        info!(
                            area = candidate.as_ref().map(|c| c.area),
                            quality = quality.map(|q| q.overall_score),
                            "document in view; holding for capture"
                        );
                    }
                    self.channel.notify(event).await;
                }
                Directive::Save(best) => match self.save_automatic(frame, &best, &mut rectified) {
                    Ok(path) => {
                        let sequence = self.machine.save_succeeded(now);
                        info!(
                            sequence,
                            quality = quality.map(|q| q.overall_score),
                            path = %path.display(),
                            "document captured"
                        );
                        self.channel.notify(ControllerEvent::Saved).await;
                        saved = Some(path);
                    }
                    Err(err) => {
                        error!(error = %err, "automatic capture failed; retrying on the next good frame");
                        self.machine.save_failed();
                        save_error = Some(err.to_string());
                    }
                },
            }
        }

        FrameReport {
            mask,
            quad,
            quality,
            state: self.machine.state(),
            remaining_seconds: self.machine.remaining_seconds(now),
            saved,
            save_error,
        }
    }

    /// Save the document located in the last processed frame, whatever the
    /// automatic state. `Ok(None)` when no document was in view.
    pub async fn capture_manual(&mut self, frame: &RgbImage) -> Result<Option<PathBuf>> {
        let Some(quad) = self.last_quad else {
            info!("manual capture requested with no document in view");
            return Ok(None);
        };

        let path = self.save(frame, &quad, CaptureKind::Manual)?;
        let sequence = self.machine.manual_saved();
        info!(sequence, path = %path.display(), "manual capture saved");
        self.channel.notify(ControllerEvent::Saved).await;
        Ok(Some(path))
    }

    /// Tell the controller the scanner is going away.
    pub async fn shutdown(&mut self) {
        self.channel.notify(ControllerEvent::Shutdown).await;
        info!(saved = self.saved_count(), "scanner stopped");
    }

    /// Persist `best`, reusing this frame's scoring rectification when it was
    /// cut from the same outline.
    fn save_automatic(
        &self,
        frame: &RgbImage,
        best: &Quad,
        rectified: &mut Option<(Quad, RgbImage)>,
    ) -> Result<PathBuf> {
        let flat = match reuse_rectified(rectified, best) {
            Some(flat) => flat,
            None => self.rectifier.rectify(frame, best)?,
        };
        self.persist(flat, CaptureKind::Automatic)
    }

    fn save(&self, frame: &RgbImage, quad: &Quad, kind: CaptureKind) -> Result<PathBuf> {
        let flat = self.rectifier.rectify(frame, quad)?;
        self.persist(flat, kind)
    }

    fn persist(&self, flat: RgbImage, kind: CaptureKind) -> Result<PathBuf> {
        let output = self.rectifier.finish(flat);
        self.store.persist(&output, kind, self.machine.next_sequence())
    }

    // -- Accessors ------------------------------------------------------------

    pub fn saved_count(&self) -> u64 {
        self.machine.saved_count()
    }

    pub fn state(&self) -> CaptureState {
        self.machine.state()
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn channel(&self) -> &NotificationChannel<L> {
        &self.channel
    }

    pub fn store(&self) -> &CaptureStore {
        &self.store
    }
}

/// The flat image already rectified from `quad`, if any.
fn reuse_rectified(rectified: &mut Option<(Quad, RgbImage)>, quad: &Quad) -> Option<RgbImage> {
    rectified.take_if(|(cut_from, _)| *cut_from == *quad).map(|(_, flat)| flat)
}
