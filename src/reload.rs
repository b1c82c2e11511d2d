//! Live-reload state shared between the watcher and the dev server.
//!
//! Every successful rebuild bumps a version counter. Browsers long-poll
//! with the last version they saw and are answered as soon as the counter
//! moves past it, or with the unchanged version when the poll times out.
//!
//! A poll that missed several changes gets the strongest kind among them:
//! a page rebuild followed by a stylesheet rebuild still reloads the page.

use serde::Serialize;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// What the browser should do with a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    /// Swap stylesheets in place.
    Css,
    /// Reload the page.
    Full,
}

/// Answer to a live-reload poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadState {
    pub version: u64,
    pub kind: ReloadKind,
}

impl Default for ReloadState {
    fn default() -> Self {
        Self {
            version: 0,
            kind: ReloadKind::Full,
        }
    }
}

#[derive(Debug, Default)]
struct Counter {
    latest: ReloadState,
    /// Version of the most recent full-reload change, 0 if none.
    last_full: u64,
}

impl Counter {
    fn since(&self, since: u64) -> ReloadState {
        if self.latest.version != since && self.last_full > since {
            ReloadState {
                version: self.latest.version,
                kind: ReloadKind::Full,
            }
        } else {
            self.latest
        }
    }
}

#[derive(Debug, Default)]
pub struct ReloadHub {
    state: Mutex<Counter>,
    changed: Condvar,
}

impl ReloadHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ReloadState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).latest
    }

    /// Record a change and wake every waiting poll.
    pub fn notify(&self, kind: ReloadKind) -> ReloadState {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.latest.version += 1;
        state.latest.kind = kind;
        if kind == ReloadKind::Full {
            state.last_full = state.latest.version;
        }
        let snapshot = state.latest;
        drop(state);
        self.changed.notify_all();
        snapshot
    }

    /// Block until the version differs from `since`, or `timeout` passes.
    ///
    /// The kind is `Full` if any change after `since` asked for a reload.
    pub fn wait_since(&self, since: u64, timeout: Duration) -> ReloadState {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (state, _) = self
            .changed
            .wait_timeout_while(state, timeout, |s| s.latest.version == since)
            .unwrap_or_else(PoisonError::into_inner);
        state.since(since)
    }
}
