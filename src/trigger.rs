//! "Advance to the next pattern" trigger.
//!
//! Anything in the host can hold a [`PatternTrigger`] and fire it; the engine
//! drains the channel once per frame. Events carry no payload. Requests that
//! arrive mid-transition are dropped by the controller, not queued.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

/// Cloneable sender side of the trigger channel.
#[derive(Debug, Clone)]
pub struct PatternTrigger {
    tx: Sender<()>,
}

impl PatternTrigger {
    /// Ask for the next pattern. Returns `false` once the backdrop is gone.
    pub fn fire(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Receiving side, owned by the engine.
#[derive(Debug)]
pub(crate) struct TriggerListener {
    rx: Receiver<()>,
}

impl TriggerListener {
    /// Number of events received since the last drain.
    pub(crate) fn drain(&self) -> usize {
        let mut n = 0;
        loop {
            match self.rx.try_recv() {
                Ok(()) => n += 1,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return n,
            }
        }
    }
}

pub(crate) fn channel() -> (PatternTrigger, TriggerListener) {
    let (tx, rx) = mpsc::channel();
    (PatternTrigger { tx }, TriggerListener { rx })
}

/// Rate limiter for turning a continuous input stream (pointer motion) into
/// discrete triggers.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Returns `true` if at least `interval` has passed since the last `true`.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
