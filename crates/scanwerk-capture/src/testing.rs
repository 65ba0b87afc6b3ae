// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory controller links for tests and dry runs.

use std::sync::{Arc, Mutex};

use crate::link::ControllerLink;

/// Shared view of the tokens a [`RecordingLink`] has accepted.
#[derive(Debug, Clone, Default)]
pub struct TokenLog(Arc<Mutex<Vec<String>>>);

impl TokenLog {
    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().map(|tokens| tokens.clone()).unwrap_or_default()
    }

    fn push(&self, token: &str) {
        if let Ok(mut tokens) = self.0.lock() {
            tokens.push(token.to_owned());
        }
    }
}

/// Accepts every token and remembers it.
#[derive(Debug, Default)]
pub struct RecordingLink {
    tokens: TokenLog,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that stays readable after the link is moved away.
    pub fn tokens(&self) -> TokenLog {
        self.tokens.clone()
    }
}

impl ControllerLink for RecordingLink {
    async fn send(&mut self, token: &str) -> bool {
        self.tokens.push(token);
        true
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn reconnect(&mut self) -> bool {
        true
    }
}

/// A controller that is never there.
#[derive(Debug, Default)]
pub struct FailingLink {
    attempts: usize,
}

impl FailingLink {
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl ControllerLink for FailingLink {
    async fn send(&mut self, _token: &str) -> bool {
        self.attempts += 1;
        false
    }

    fn is_connected(&self) -> bool {
        false
    }

    async fn reconnect(&mut self) -> bool {
        false
    }
}
