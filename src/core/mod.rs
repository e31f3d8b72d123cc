//! # Core Prompt Engine
//!
//! The terminal-independent half of askit. Everything here is plain data and
//! pure transitions; nothing writes to a terminal.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • KeyEvent → Action    │
//!                    │  • PromptState          │
//!                    │  • ChoiceList           │
//!                    │  • timers, exit hook    │
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┴───────────────────┐
//!            ▼                                       ▼
//!     ┌────────────┐                          ┌────────────┐
//!     │  prompts   │  controller + variants   │    tui     │
//!     │            │ ───────────────────────► │ decode,    │
//!     │            │                          │ paint      │
//!     └────────────┘                          └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`action`]: `Action` (what a key means) and `Effect` (what a handler asks for)
//! - [`keymap`]: the Action Mapper, four modifier tiers plus overrides
//! - [`state`]: `PromptState`, the per-prompt record
//! - [`editable`]: cursor/edit operations over any text buffer
//! - [`choice`] / [`choice_list`]: choice records and the list engine
//! - [`quick_jump`]: the numeric jump buffer
//! - [`timer`]: tick sources for animated renders
//! - [`lifecycle`]: the shared exit hook
//! - [`config`]: `~/.askit/config.toml` loading and resolution

pub mod action;
pub mod choice;
pub mod choice_list;
pub mod config;
pub mod editable;
pub mod keymap;
pub mod lifecycle;
pub mod quick_jump;
pub mod state;
pub mod timer;

pub use action::{Action, Effect};
pub use keymap::{KeyEvent, Keymap, KeymapOverrides};
pub use state::{PromptState, Status};
