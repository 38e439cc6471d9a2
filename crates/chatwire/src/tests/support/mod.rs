//! Shared fixtures and helpers for client tests.

mod scripted;
mod world;

use std::sync::{Condvar, Mutex};
use std::time::Instant;

use rstest::fixture;

use crate::registry::MessageHandler;
use crate::session::SessionConfig;

pub use scripted::{ScriptedConnector, ScriptedTransport, WAIT_LIMIT};
pub use world::ClientWorld;

/// Session used throughout the client tests.
#[fixture]
pub fn session() -> SessionConfig {
    SessionConfig::new("h", 6697, "bot", "oauth:abc", "#room")
}

/// Handler recording every dispatched line.
#[derive(Default)]
pub struct LineRecorder {
    lines: Mutex<Vec<String>>,
    changed: Condvar,
}

impl LineRecorder {
    /// Lines received so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// Waits until at least `count` lines arrived, then returns them all.
    #[must_use]
    pub fn wait_for(&self, count: usize) -> Vec<String> {
        let deadline = Instant::now() + WAIT_LIMIT;
        let mut lines = self
            .lines
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        loop {
            let now = Instant::now();
            if lines.len() >= count || now >= deadline {
                return lines.clone();
            }
            lines = self
                .changed
                .wait_timeout(lines, deadline - now)
                .unwrap_or_else(|poison| poison.into_inner())
                .0;
        }
    }
}

impl MessageHandler for LineRecorder {
    fn handle(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(line.to_owned());
        self.changed.notify_all();
    }
}
