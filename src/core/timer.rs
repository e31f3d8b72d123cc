//! # Timers
//!
//! Named interval tickers that request a re-render without any keypress
//! (spinner frames in the prompt prefix, elapsed-time displays).
//!
//! ```text
//! TimerSpec (config)  →  Timers::start()  →  tick().await  →  TimerSnapshot  →  render
//!                                                            ↑
//!                                    stop_all() on close ────┘ (no more ticks)
//! ```
//!
//! Ticks never go through the keypress path. They only refresh the
//! snapshot in `PromptState::timers` and trigger a render.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::poll_fn;
use std::task::Poll;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

pub const DEFAULT_INTERVAL_MS: u64 = 120;

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_MS
}

/// Configuration for one named timer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimerSpec {
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default)]
    pub frames: Vec<String>,
}

impl Default for TimerSpec {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_MS,
            frames: Vec::new(),
        }
    }
}

/// What a render sees of a timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub name: String,
    /// Milliseconds since the timer started.
    pub ms: u64,
    pub tick: u64,
    pub frame: Option<String>,
}

struct Timer {
    name: String,
    start: Instant,
    tick: u64,
    frames: Vec<String>,
    interval: Interval,
}

impl Timer {
    fn snapshot(&self) -> TimerSnapshot {
        let frame = if self.frames.is_empty() {
            None
        } else {
            Some(self.frames[(self.tick as usize) % self.frames.len()].clone())
        };
        TimerSnapshot {
            name: self.name.clone(),
            ms: self.start.elapsed().as_millis() as u64,
            tick: self.tick,
            frame,
        }
    }
}

/// The set of timers owned by one prompt.
///
/// Intervals are created on `start()` rather than at construction, so a prompt
/// can be built outside a runtime.
#[derive(Default)]
pub struct Timers {
    specs: BTreeMap<String, TimerSpec>,
    running: Vec<Timer>,
}

impl Timers {
    pub fn new(specs: BTreeMap<String, TimerSpec>) -> Self {
        Self {
            specs,
            running: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.running.is_empty()
    }

    /// Start every configured timer. A second call is a no-op.
    pub fn start(&mut self) -> Vec<TimerSnapshot> {
        if self.is_running() {
            return Vec::new();
        }
        let now = Instant::now();
        for (name, spec) in &self.specs {
            let period = Duration::from_millis(spec.interval.max(1));
            let mut interval = tokio::time::interval_at(now + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            self.running.push(Timer {
                name: name.clone(),
                start: now,
                tick: 0,
                frames: spec.frames.clone(),
                interval,
            });
        }
        self.running.iter().map(Timer::snapshot).collect()
    }

    /// Wait for the next tick of any running timer.
    ///
    /// Never resolves when nothing is running, which makes it safe as a
    /// `select!` branch.
    pub async fn tick(&mut self) -> TimerSnapshot {
        poll_fn(|cx| {
            for timer in &mut self.running {
                if timer.interval.poll_tick(cx).is_ready() {
                    timer.tick += 1;
                    return Poll::Ready(timer.snapshot());
                }
            }
            Poll::Pending
        })
        .await
    }

    pub fn stop_all(&mut self) {
        if !self.running.is_empty() {
            log::debug!("stopping {} timer(s)", self.running.len());
        }
        self.running.clear();
    }
}
