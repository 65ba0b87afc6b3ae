// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture state machine.
//
// Debounces the per-frame "good document in view" signal into a single save
// per uninterrupted streak. The machine performs no I/O: it returns
// directives, and the caller reports back whether a requested save worked.

use std::time::{Duration, Instant};

use scanwerk_core::{CaptureState, ControllerEvent, Quad};
use tracing::{debug, info};

/// What the vision stage saw in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// The located document outline, if any.
    pub candidate: Option<Quad>,
    /// Whether the rectified candidate passed the quality gate.
    pub quality_acceptable: bool,
}

impl Observation {
    pub fn is_valid(&self) -> bool {
        self.candidate.is_some() && self.quality_acceptable
    }
}

/// Side effects requested by the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive {
    /// Relay an event to the controller.
    Notify(ControllerEvent),
    /// Rectify and persist this outline against the current frame, then call
    /// [`CaptureStateMachine::save_succeeded`] or
    /// [`CaptureStateMachine::save_failed`].
    Save(Quad),
}

/// Mutable state carried across frames.
#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    pub state: CaptureState,
    pub detection_started: Option<Instant>,
    pub best_quad: Option<Quad>,
    pub saved: bool,
    pub saved_at: Option<Instant>,
    /// Number of captures written so far, automatic and manual.
    pub sequence: u64,
}

pub struct CaptureStateMachine {
    dwell: Duration,
    pause: Duration,
    session: CaptureSession,
}

impl CaptureStateMachine {
    pub fn new(dwell: Duration, pause: Duration) -> Self {
        Self {
            dwell,
            pause,
            session: CaptureSession::default(),
        }
    }

    // -- Transitions ----------------------------------------------------------

    /// Advance on one frame's observation.
    pub fn observe(&mut self, observation: Observation, now: Instant) -> Vec<Directive> {
        let mut directives = Vec::new();

        if self.session.state == CaptureState::Saved {
            let paused = self
                .session
                .saved_at
                .is_some_and(|at| now.saturating_duration_since(at) < self.pause);
            if paused {
                return directives;
            }
            self.session.state = CaptureState::Idle;
            self.session.saved = false;
            self.session.saved_at = None;
            debug!("post-save pause over");
        }

        let valid = observation.is_valid();
        match (self.session.state, valid) {
            (CaptureState::Idle, true) => {
                self.session.state = CaptureState::Detecting;
                self.session.detection_started = Some(now);
                self.session.best_quad = observation.candidate;
                info!("document detected");
                directives.push(Directive::Notify(ControllerEvent::Detected));
            }
            (CaptureState::Detecting, true) => {
                self.session.best_quad = observation.candidate;
            }
            (CaptureState::Detecting, false) => {
                self.reset();
                info!("document lost");
                directives.push(Directive::Notify(ControllerEvent::Lost));
            }
            (CaptureState::Idle, false) | (CaptureState::Saved, _) => {}
        }

        if valid && self.dwell_elapsed(now) {
            if let Some(quad) = self.session.best_quad {
                directives.push(Directive::Save(quad));
            }
        }
        directives
    }

    /// Record a completed automatic save. Returns its sequence number.
    pub fn save_succeeded(&mut self, now: Instant) -> u64 {
        self.session.sequence += 1;
        self.session.state = CaptureState::Saved;
        self.session.saved = true;
        self.session.saved_at = Some(now);
        self.session.detection_started = None;
        self.session.best_quad = None;
        self.session.sequence
    }

    /// An automatic save could not be written. The machine stays in
    /// `Detecting` and asks again on the next qualifying frame.
    pub fn save_failed(&mut self) {
        debug!("save failed; staying in detecting");
    }

    /// Record a manual capture. Automatic state is untouched.
    pub fn manual_saved(&mut self) -> u64 {
        self.session.sequence += 1;
        self.session.sequence
    }

    fn reset(&mut self) {
        self.session.state = CaptureState::Idle;
        self.session.detection_started = None;
        self.session.best_quad = None;
    }

    fn dwell_elapsed(&self, now: Instant) -> bool {
        self.session.state == CaptureState::Detecting
            && self
                .session
                .detection_started
                .is_some_and(|start| now.saturating_duration_since(start) >= self.dwell)
    }

    // -- Accessors ------------------------------------------------------------

    pub fn state(&self) -> CaptureState {
        self.session.state
    }

    pub fn best_quad(&self) -> Option<Quad> {
        self.session.best_quad
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Whole seconds left before an automatic save, while detecting.
    pub fn remaining_seconds(&self, now: Instant) -> Option<u64> {
        if self.session.state != CaptureState::Detecting {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.session.detection_started?);
        Some(self.dwell.as_secs().saturating_sub(elapsed.as_secs()))
    }

    /// Sequence number the next capture will get.
    pub fn next_sequence(&self) -> u64 {
        self.session.sequence + 1
    }

    /// Captures written so far.
    pub fn saved_count(&self) -> u64 {
        self.session.sequence
    }
}
