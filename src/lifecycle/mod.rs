//! Lifecycle Guard
//!
//! One scene instance per [`Engine`](crate::Engine). The guard is a small
//! state machine:
//!
//! ```text
//!  Idle --begin--> Initializing --complete--> Active
//!   ^                   |                       |
//!   +------abort--------+                       |
//!   +---------------teardown--------------------+
//! ```
//!
//! Every `begin` and every `teardown` bumps a generation counter. A load
//! batch carries the [`LoadTicket`] it was started with, and is only applied
//! while that generation is still current, so a teardown that lands while
//! decodes are in flight makes their results inert.

pub mod disposer;

use serde::Serialize;

use crate::errors::{MirageError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Idle,
    Initializing,
    Active,
}

impl LifecycleState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Active => "active",
        }
    }
}

/// Who asked for initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartTrigger {
    /// A user action. Allowed whenever the guard is idle.
    Explicit,
    /// An environment re-invocation (reload, remount). Refused once any
    /// start has succeeded in this engine.
    Automatic,
}

/// Proof that a load was started by a particular initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    #[inline]
    #[must_use]
    pub fn generation(self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleGuard {
    state: LifecycleState,
    has_started: bool,
    started_before_begin: bool,
    generation: u64,
}

impl Default for LifecycleGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Idle,
            has_started: false,
            started_before_begin: false,
            generation: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.has_started
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    /// Moves `Idle -> Initializing`.
    pub fn begin(&mut self, trigger: StartTrigger) -> Result<LoadTicket> {
        if self.state != LifecycleState::Idle {
            return Err(MirageError::AlreadyRunning(self.state.as_str()));
        }
        if trigger == StartTrigger::Automatic && self.has_started {
            return Err(MirageError::AutoStartSuppressed);
        }
        self.started_before_begin = self.has_started;
        self.has_started = true;
        self.generation += 1;
        self.state = LifecycleState::Initializing;
        Ok(LoadTicket {
            generation: self.generation,
        })
    }

    /// Rolls a failed `begin` back to `Idle`, as if it never happened.
    pub fn abort(&mut self) {
        if self.state == LifecycleState::Initializing {
            self.state = LifecycleState::Idle;
            self.has_started = self.started_before_begin;
            self.generation += 1;
        }
    }

    /// `true` while `ticket` belongs to the initialization in progress.
    #[must_use]
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.state == LifecycleState::Initializing && ticket.generation == self.generation
    }

    /// Moves `Initializing -> Active` if `ticket` is still current.
    pub fn activate(&mut self, ticket: LoadTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.state = LifecycleState::Active;
        true
    }

    /// Returns to `Idle` and invalidates every outstanding ticket.
    pub fn teardown(&mut self) {
        self.state = LifecycleState::Idle;
        self.generation += 1;
    }
}
