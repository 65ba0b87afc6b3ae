// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame rate meter for the HUD.

use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Counts frames over one-second windows.
#[derive(Debug, Default)]
pub struct FrameRateMeter {
    window_start: Option<Instant>,
    frames: u32,
    rate: u32,
}

impl FrameRateMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now` and return the rate of the last full window.
    pub fn tick(&mut self, now: Instant) -> u32 {
        let start = *self.window_start.get_or_insert(now);
        if now.duration_since(start) >= WINDOW {
            self.rate = self.frames;
            self.frames = 0;
            self.window_start = Some(now);
        }
        self.frames += 1;
        self.rate
    }
}
