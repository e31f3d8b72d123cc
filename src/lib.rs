//! askit library exports: the pure engine, the terminal adapter and the prompts.

pub mod core;
pub mod prompts;
pub mod tui;

#[cfg(test)]
pub mod test_support;
