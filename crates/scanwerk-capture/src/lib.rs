// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk capture: turns per-frame detections into saved documents and
// controller notifications.

pub mod link;
pub mod notify;
pub mod scanner;
pub mod session;
pub mod source;
pub mod store;
pub mod testing;

pub use link::{AnyLink, ControllerLink, NullLink, SerialLink, TcpLink, link_from_config};
pub use notify::NotificationChannel;
pub use scanner::{FrameReport, Scanner};
pub use session::{CaptureStateMachine, Directive, Observation};
pub use source::{FrameSource, open_source, open_with_fallback, prepare_frame};
pub use store::CaptureStore;
