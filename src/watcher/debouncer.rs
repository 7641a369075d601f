//! Duplicate-notification gate for file change events.
//!
//! Editors and some platforms report a single save several times. After a
//! read is accepted for a key, the gate for that key stays closed for a fixed
//! window; repeats of the same content inside the window are suppressed.
//! A save with different content is accepted straight away and restarts the
//! window, so rapid distinct edits are never lost.
//!
//! Time comes from a [`Clock`], so the gate can be driven without sleeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the component under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Gate state for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Next read is accepted.
    Idle,
    /// A read was accepted; identical content is dropped until `until`.
    Suppressing { until: Instant, digest: [u8; 32] },
}

/// Outcome of offering a read to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Suppressed,
}

/// Per-key suppression windows.
#[derive(Debug)]
pub struct Debouncer<C: Clock = SystemClock> {
    gates: HashMap<String, GateState>,
    window: Duration,
    clock: C,
}

impl Debouncer<SystemClock> {
    /// Create a debouncer with the given window in milliseconds.
    pub fn new(window_ms: u64) -> Self {
        Self::with_clock(Duration::from_millis(window_ms), SystemClock)
    }
}

impl<C: Clock> Debouncer<C> {
    pub fn with_clock(window: Duration, clock: C) -> Self {
        Self {
            gates: HashMap::new(),
            window,
            clock,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Offer a read of `key` with `content` to the gate.
    ///
    /// Accepting closes the gate for the window. Suppression does not extend it.
    pub fn admit(&mut self, key: &str, content: &[u8]) -> Admission {
        let now = self.clock.now();
        self.expire(now);

        let digest: [u8; 32] = Sha256::digest(content).into();
        if let Some(GateState::Suppressing { digest: held, .. }) = self.gates.get(key) {
            if *held == digest {
                return Admission::Suppressed;
            }
        }

        self.gates.insert(
            key.to_string(),
            GateState::Suppressing {
                until: now + self.window,
                digest,
            },
        );
        Admission::Accepted
    }

    /// Current gate state for `key`.
    pub fn state(&mut self, key: &str) -> GateState {
        let now = self.clock.now();
        self.expire(now);
        self.gates.get(key).copied().unwrap_or(GateState::Idle)
    }

    /// Number of keys whose window is still open.
    pub fn suppressing_count(&mut self) -> usize {
        let now = self.clock.now();
        self.expire(now);
        self.gates.len()
    }

    /// Drop every window that has closed.
    fn expire(&mut self, now: Instant) {
        self.gates.retain(|_, gate| match gate {
            GateState::Suppressing { until, .. } => now < *until,
            GateState::Idle => false,
        });
    }
}
