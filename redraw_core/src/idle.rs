// Copyright 2026 the Redraw Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Idle timeout for the refresh loop.
//!
//! The loop keeps re-arming for a grace window after the last redraw request
//! or hook invocation, even when nothing is dirty. Hooks that request another
//! frame from inside a tick therefore find the loop still running instead of
//! having to restart it, and a quiet loop stops on its own once the window
//! passes.

use crate::time::{Duration, HostTime};

/// A rolling deadline after which an idle loop may stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdlePolicy {
    window: Duration,
    deadline: Option<HostTime>,
}

impl IdlePolicy {
    /// Creates a policy with the given grace window and no deadline yet.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// The grace window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// The current deadline, if any activity has been recorded.
    #[must_use]
    pub const fn deadline(&self) -> Option<HostTime> {
        self.deadline
    }

    /// Records activity at `now`, pushing the deadline to `now + window`.
    ///
    /// The deadline never moves backwards.
    pub fn extend(&mut self, now: HostTime) {
        let candidate = now.saturating_add(self.window);
        self.deadline = Some(match self.deadline {
            Some(current) if current > candidate => current,
            _ => candidate,
        });
    }

    /// Sets the deadline to `now + window` unconditionally.
    pub fn reset(&mut self, now: HostTime) {
        self.deadline = Some(now.saturating_add(self.window));
    }

    /// Returns `true` while the deadline lies strictly after `now`.
    #[must_use]
    pub fn is_active(&self, now: HostTime) -> bool {
        self.deadline.is_some_and(|deadline| now < deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_activity_means_idle() {
        let policy = IdlePolicy::new(Duration(100));
        assert!(!policy.is_active(HostTime(0)));
        assert_eq!(policy.deadline(), None);
    }

    #[test]
    fn deadline_is_exclusive() {
        let mut policy = IdlePolicy::new(Duration(100));
        policy.extend(HostTime(1_000));
        assert!(policy.is_active(HostTime(1_099)));
        assert!(!policy.is_active(HostTime(1_100)), "window has elapsed");
    }

    #[test]
    fn extend_never_moves_backwards() {
        let mut policy = IdlePolicy::new(Duration(100));
        policy.extend(HostTime(500));
        policy.extend(HostTime(400));
        assert_eq!(policy.deadline(), Some(HostTime(600)));
    }

    #[test]
    fn reset_overrides_deadline() {
        let mut policy = IdlePolicy::new(Duration(100));
        policy.extend(HostTime(500));
        policy.reset(HostTime(50));
        assert_eq!(policy.deadline(), Some(HostTime(150)));
    }
}
