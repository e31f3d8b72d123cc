//! Quick-jump digit buffer.
//!
//! Typing `1` then `2` in a 20-item list focuses the 12th choice. Digits
//! accumulate until one of:
//!
//! - the buffer can't grow without exceeding the list length (`2` in a
//!   15-item list): flush now
//! - the buffer already exceeds the list length, or is `0`: reject
//! - the debounce deadline passes with no further digit: flush
//!
//! The buffer only decides. The caller owns the clock and the list.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpDecision {
    /// Jump to this 1-based choice number now.
    Flush(usize),
    /// Wait for another digit until the deadline.
    Wait(Instant),
    /// Impossible number. Ring the bell.
    Reject,
}

#[derive(Debug, Clone)]
pub struct QuickJump {
    digits: String,
    delay: Duration,
    deadline: Option<Instant>,
}

impl QuickJump {
    pub fn new(delay: Duration) -> Self {
        Self {
            digits: String::new(),
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn pending(&self) -> Option<&str> {
        (!self.digits.is_empty()).then_some(self.digits.as_str())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Feed one digit typed at `now` into a list of `len` choices.
    pub fn push(&mut self, digit: char, len: usize, now: Instant) -> JumpDecision {
        if !digit.is_ascii_digit() {
            return JumpDecision::Reject;
        }
        self.digits.push(digit);
        let Ok(number) = self.digits.parse::<usize>() else {
            self.clear();
            return JumpDecision::Reject;
        };
        if number == 0 || number > len {
            self.clear();
            return JumpDecision::Reject;
        }
        if number.saturating_mul(10) > len {
            self.clear();
            return JumpDecision::Flush(number);
        }
        let deadline = now + self.delay;
        self.deadline = Some(deadline);
        JumpDecision::Wait(deadline)
    }

    /// The debounce window elapsed. Returns the buffered number, if any.
    pub fn expire(&mut self) -> Option<usize> {
        let number = self.digits.parse::<usize>().ok();
        self.clear();
        number
    }

    pub fn clear(&mut self) {
        self.digits.clear();
        self.deadline = None;
    }
}
