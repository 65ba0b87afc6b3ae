// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Notification channel: relays capture events to the controller link.
// Delivery failures are logged and otherwise ignored.

use std::collections::VecDeque;

use scanwerk_core::ControllerEvent;
use tracing::{debug, warn};

use crate::link::ControllerLink;

/// How many recent notifications are remembered.
const HISTORY_LIMIT: usize = 64;

/// One notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub event: ControllerEvent,
    pub delivered: bool,
}

pub struct NotificationChannel<L> {
    link: L,
    history: VecDeque<Notification>,
}

impl<L: ControllerLink> NotificationChannel<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// Send `event` to the controller. Returns whether it was delivered.
    pub async fn notify(&mut self, event: ControllerEvent) -> bool {
        let delivered = self.link.send(event.token()).await;
        if delivered {
            debug!(%event, "controller notified");
        } else {
            warn!(%event, "controller notification not delivered; will reconnect on next event");
        }

        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(Notification { event, delivered });
        delivered
    }

    /// Recent notification attempts, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Notification> {
        self.history.iter()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}
