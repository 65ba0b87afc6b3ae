// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator commands read from stdin.

use std::io::BufRead;

use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Save the document in view now.
    Capture,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "c" | "capture" => Some(Self::Capture),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Read commands on a plain thread; the channel closes when stdin does.
pub fn spawn_reader() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "stdin closed");
                    break;
                }
            };
            match Command::parse(&line) {
                Some(command) => {
                    if tx.blocking_send(command).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => debug!(input = %line.trim(), "unknown command ignored"),
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operator_keys() {
        assert_eq!(Command::parse("c"), Some(Command::Capture));
        assert_eq!(Command::parse(" Q \n"), Some(Command::Quit));
        assert_eq!(Command::parse("capture"), Some(Command::Capture));
        assert_eq!(Command::parse("x"), None);
        assert_eq!(Command::parse(""), None);
    }
}
