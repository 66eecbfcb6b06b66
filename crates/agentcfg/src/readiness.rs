//! Lock-free readiness state consulted on every lookup.

use crate::error::FetchError;
use std::sync::atomic::{AtomicU8, Ordering};

/// Whether the cache can serve lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    /// No refresh has succeeded yet.
    NotReady,
    /// At least one refresh succeeded; later failures leave this in place.
    Ready,
    /// Upstream access was permanently denied before any refresh succeeded.
    PermanentlyInvalid,
}

impl ReadinessState {
    const fn to_u8(self) -> u8 {
        match self {
            Self::NotReady => 0,
            Self::Ready => 1,
            Self::PermanentlyInvalid => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Ready,
            2 => Self::PermanentlyInvalid,
            _ => Self::NotReady,
        }
    }

    /// Lowercase name used in logs and health output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotReady => "not_ready",
            Self::Ready => "ready",
            Self::PermanentlyInvalid => "invalid",
        }
    }
}

/// Tri-state readiness flag.
///
/// Only `NotReady` ever transitions. `Ready` survives later permanent
/// failures so that a stale snapshot keeps being served, and
/// `PermanentlyInvalid` is terminal for the life of the process.
#[derive(Debug)]
pub struct ReadinessGate {
    state: AtomicU8,
}

impl ReadinessGate {
    /// Creates a gate in the `NotReady` state.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ReadinessState::NotReady.to_u8()),
        }
    }

    /// Current state.
    pub fn state(&self) -> ReadinessState {
        ReadinessState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Records a successful publish. Returns the state after the call.
    pub fn mark_ready(&self) -> ReadinessState {
        self.transition_from_not_ready(ReadinessState::Ready)
    }

    /// Records a permanent upstream failure. Returns the state after the call.
    pub fn mark_invalid(&self) -> ReadinessState {
        self.transition_from_not_ready(ReadinessState::PermanentlyInvalid)
    }

    fn transition_from_not_ready(&self, target: ReadinessState) -> ReadinessState {
        match self.state.compare_exchange(
            ReadinessState::NotReady.to_u8(),
            target.to_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => target,
            Err(current) => ReadinessState::from_u8(current),
        }
    }

    /// Ok when lookups may be served from the cache.
    pub fn check(&self) -> Result<(), FetchError> {
        match self.state() {
            ReadinessState::Ready => Ok(()),
            ReadinessState::PermanentlyInvalid => Err(FetchError::ConfigInvalid),
            ReadinessState::NotReady => Err(FetchError::NotReady),
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
