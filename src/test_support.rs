//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::time::Duration;

use crate::core::config::ResolvedConfig;
use crate::core::lifecycle::LifecycleRegistry;
use crate::prompts::{Answer, Prompt, PromptError, PromptOptions};
use crate::tui::terminal::VirtualTerminal;

/// Upper bound on how long a test waits for a prompt that should settle.
pub const SETTLE: Duration = Duration::from_secs(2);

/// Colourless config so screen assertions see plain text.
pub fn config() -> ResolvedConfig {
    ResolvedConfig {
        color: false,
        ..Default::default()
    }
}

pub fn options(name: &str, message: &str) -> PromptOptions {
    PromptOptions::new(name, message)
}

/// Build a `kind` prompt, queue `chunks` as separate reads and run it on an
/// 80x24 virtual terminal.
pub async fn run_headless(
    kind: &str,
    options: PromptOptions,
    chunks: &[&str],
) -> (Result<Answer, PromptError>, VirtualTerminal) {
    let prompt = Prompt::build(kind, options, &config(), LifecycleRegistry::without_signals())
        .await
        .expect("test prompt should build");
    let (keyboard, mut terminal) = VirtualTerminal::new(80, 24);
    for chunk in chunks {
        keyboard.press(chunk);
    }
    let outcome = tokio::time::timeout(SETTLE, prompt.run(&mut terminal))
        .await
        .expect("prompt should settle");
    (outcome, keyboard)
}
