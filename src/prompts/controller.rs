//! # Prompt Controller
//!
//! Runs one prompt from first paint to settled answer.
//!
//! ```text
//!              ┌──────────── pending ─────────────┐
//!   start() ──►│  keypress ─► handle ─► Effect     │
//!              │  tick     ─► render               │
//!              │  deadline ─► expire ─► Effect     │
//!              └──────┬───────────────────┬────────┘
//!          submit ok  │                   │ cancel / exit signal
//!                     ▼                   ▼
//!                 submitted           cancelled
//!                     └────── close() ────┘   (exactly once)
//! ```
//!
//! ## Ordering
//!
//! A single `select!` loop owns the state. A keypress is handled to the end
//! (including awaited validate / submit hooks) before the next input chunk is
//! even read, so key events queue in the channel and drain in arrival order.
//! Timer ticks only re-render; they never mutate what a handler is using.

use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::core::action::{Action, Effect};
use crate::core::choice::ChoiceId;
use crate::core::config::ResolvedConfig;
use crate::core::keymap::{KeyEvent, Keymap};
use crate::core::lifecycle::{LifecycleRegistry, Registration};
use crate::core::state::{PromptState, Status};
use crate::core::timer::Timers;
use crate::prompts::autocomplete::Autocomplete;
use crate::prompts::boolean::{Confirm, Toggle};
use crate::prompts::form::Form;
use crate::prompts::number::NumberPrompt;
use crate::prompts::select::{Select, SelectMode};
use crate::prompts::text::{Text, TextMode};
use crate::prompts::{
    Answer, Hooks, PromptCore, PromptError, PromptEvent, PromptKind, PromptOptions, Validation,
};
use crate::tui::render::{self, Frame, Margin, Painted};
use crate::tui::terminal::Terminal;
use crate::tui::theme::{Role, Theme};
use crate::tui::{ansi, keypress};

/// Rows kept free for the prompt line itself when sizing a choice window.
const RESERVED_ROWS: usize = 2;

enum Flow {
    Continue,
    Submitted(Answer),
    Cancelled,
}

pub struct Prompt {
    core: PromptCore,
    kind: Box<dyn PromptKind>,
    keymap: Keymap,
    hooks: Hooks,
    margin: Margin,
    timers: Timers,
    lifecycle: LifecycleRegistry,
    registration: Option<Registration>,
    events: Option<mpsc::UnboundedSender<PromptEvent>>,
    started: bool,
}

impl Prompt {
    /// Build a prompt of type `kind` (`"input"`, `"select"`, ...).
    ///
    /// Choice sources are resolved here, so every construction-time error
    /// (unknown type, no selectable choices, bad quiz index) surfaces before
    /// `run()`.
    pub async fn build(
        kind: &str,
        mut options: PromptOptions,
        config: &ResolvedConfig,
        lifecycle: LifecycleRegistry,
    ) -> Result<Prompt, PromptError> {
        let source = std::mem::take(&mut options.choices);
        let choices = source.resolve().await;
        let delay = config.quick_jump_delay;
        let limit = options.limit.or(config.limit);

        let variant: Box<dyn PromptKind> = match kind {
            "input" | "text" => Box::new(Text::new(TextMode::Plain, &options)),
            "password" => Box::new(Text::new(TextMode::Password, &options)),
            "invisible" => Box::new(Text::new(TextMode::Invisible, &options)),
            "list" => Box::new(Text::new(TextMode::List, &options)),
            "number" | "numeral" => Box::new(NumberPrompt::new(&options)?),
            "confirm" => Box::new(Confirm::new(&options)),
            "toggle" => Box::new(Toggle::new(&options)),
            "select" => {
                let mode = if options.multiple {
                    SelectMode::Multiple
                } else {
                    SelectMode::Single
                };
                Box::new(Select::new(mode, &options, &choices, limit, delay)?)
            }
            "multiselect" => Box::new(Select::new(
                SelectMode::Multiple,
                &options,
                &choices,
                limit,
                delay,
            )?),
            "sort" => Box::new(Select::new(SelectMode::Sort, &options, &choices, limit, delay)?),
            "quiz" => Box::new(Select::new(SelectMode::Quiz, &options, &choices, limit, delay)?),
            "autocomplete" => Box::new(Autocomplete::new(&options, &choices, limit)?),
            "form" => Box::new(Form::new(&options, &choices)?),
            other => return Err(PromptError::Config(format!("unknown prompt type {other:?}"))),
        };
        Ok(Prompt::new(variant, options, config, lifecycle))
    }

    /// Wrap an already-built variant.
    pub fn new(
        kind: Box<dyn PromptKind>,
        options: PromptOptions,
        config: &ResolvedConfig,
        lifecycle: LifecycleRegistry,
    ) -> Prompt {
        let mut state = PromptState::new(kind.type_name(), &options.name, &options.message);
        state.header = options.header.clone().unwrap_or_default();
        state.footer = options.footer.clone().unwrap_or_default();
        state.hint = options.hint.clone();
        if options.required {
            state.required.insert(options.name.clone());
        }
        kind.init_state(&mut state);

        let theme = Theme::new(config.color, &config.styles, &config.symbols)
            .merged(&options.styles, &options.symbols);
        let keymap = Keymap::with_overrides(&config.actions.merged_with(&options.actions));

        Prompt {
            core: PromptCore { state, theme },
            kind,
            keymap,
            hooks: options.hooks,
            margin: options.margin,
            timers: Timers::new(options.timers),
            lifecycle,
            registration: None,
            events: None,
            started: false,
        }
    }

    /// Send lifecycle notifications to `events`.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<PromptEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn name(&self) -> &str {
        &self.core.state.name
    }

    pub fn state(&self) -> &PromptState {
        &self.core.state
    }

    /// Run on `terminal` until submitted (`Ok`) or cancelled (`Err`).
    pub async fn run(self, terminal: &mut Terminal) -> Result<Answer, PromptError> {
        self.run_with(terminal, &Value::Null).await
    }

    /// Like [`run`](Self::run), with the answers collected so far (for `skip`).
    pub async fn run_with(
        mut self,
        terminal: &mut Terminal,
        answers: &Answer,
    ) -> Result<Answer, PromptError> {
        if self.hooks.skip.as_ref().is_some_and(|skip| skip(answers)) {
            return Ok(self.skip().await);
        }
        if let Some(signal) = self.lifecycle.fired() {
            return Err(PromptError::Terminated(signal));
        }

        let outcome = match self.start(terminal) {
            Ok(()) => self.event_loop(terminal).await,
            Err(e) => Err(e),
        };
        self.close(terminal);

        match &outcome {
            Ok(value) => info!("prompt {:?} submitted: {}", self.name(), value),
            Err(e) => info!("prompt {:?} ended: {e}", self.name()),
        }
        outcome
    }

    async fn skip(mut self) -> Answer {
        info!("prompt {:?} skipped", self.name());
        let value = self.kind.value(&self.core);
        self.core.state.mark_submitted();
        self.core.state.close();
        let value = self.finish_value(value).await;
        self.emit(PromptEvent::Submit {
            name: self.name().to_string(),
            value: value.clone(),
        });
        value
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Take over the terminal and paint the first frame. Idempotent.
    fn start(&mut self, terminal: &mut Terminal) -> Result<(), PromptError> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        if let Err(e) = terminal.enable_raw() {
            warn!("raw mode unavailable: {e}");
        }
        self.registration = Some(self.lifecycle.register(terminal.restore_hook()));
        if self.kind.hides_cursor() {
            terminal.write(&ansi::hide_cursor())?;
        }
        for snapshot in self.timers.start() {
            self.core.state.timers.insert(snapshot.name.clone(), snapshot);
        }
        info!(
            "prompt {:?} ({}) started",
            self.core.state.name, self.core.state.kind
        );
        self.emit(PromptEvent::Start {
            name: self.name().to_string(),
        });
        self.render(terminal)?;
        self.emit(PromptEvent::Run {
            name: self.name().to_string(),
        });
        Ok(())
    }

    /// Release everything the prompt holds. Only the first call does anything.
    fn close(&mut self, terminal: &mut Terminal) {
        if !self.core.state.close() {
            return;
        }
        self.timers.stop_all();
        if self.started {
            let mut out = render::finish(&self.painted());
            if self.kind.hides_cursor() {
                out.push_str(&ansi::show_cursor());
            }
            if let Err(e) = terminal.write(&out) {
                warn!("failed to release prompt region: {e}");
            }
            if let Err(e) = terminal.disable_raw() {
                warn!("failed to leave raw mode: {e}");
            }
        }
        self.core.state.rows_below = 0;
        if let Some(registration) = self.registration.take() {
            registration.release();
        }
        debug!("prompt {:?} closed", self.core.state.name);
        self.emit(PromptEvent::Close {
            name: self.name().to_string(),
        });
    }

    async fn event_loop(&mut self, terminal: &mut Terminal) -> Result<Answer, PromptError> {
        let mut exit = self.lifecycle.subscribe();
        let mut watching = true;
        loop {
            let deadline = self.kind.deadline();
            let flow = tokio::select! {
                chunk = terminal.recv() => {
                    let Some(bytes) = chunk else {
                        return Err(PromptError::InputClosed);
                    };
                    self.input(terminal, &bytes).await?
                }
                snapshot = self.timers.tick() => {
                    self.core.state.timers.insert(snapshot.name.clone(), snapshot);
                    self.render(terminal)?;
                    Flow::Continue
                }
                _ = sleep_until(deadline) => {
                    let effect = self.kind.expire(&mut self.core);
                    self.apply(terminal, effect).await?
                }
                changed = exit.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                    }
                    let fired = *exit.borrow();
                    if let Some(signal) = fired {
                        self.core.state.mark_cancelled();
                        return Err(PromptError::Terminated(signal));
                    }
                    Flow::Continue
                }
            };
            match flow {
                Flow::Continue => {}
                Flow::Submitted(value) => return Ok(value),
                Flow::Cancelled => return Err(PromptError::Cancelled),
            }
        }
    }

    /// One input chunk may hold several keys (fast typing, pastes). They are
    /// dispatched one by one; anything after the prompt settles is dropped.
    async fn input(&mut self, terminal: &mut Terminal, bytes: &[u8]) -> Result<Flow, PromptError> {
        for key in keypress::decode_bytes(bytes) {
            match self.keypress(terminal, key).await? {
                Flow::Continue => {}
                settled => return Ok(settled),
            }
        }
        Ok(Flow::Continue)
    }

    async fn keypress(&mut self, terminal: &mut Terminal, key: KeyEvent) -> Result<Flow, PromptError> {
        if !self.core.state.is_pending() || self.core.state.is_closed() {
            debug!("dropping key after prompt settled");
            return Ok(Flow::Continue);
        }
        self.core.state.keypressed = true;
        self.emit(PromptEvent::Keypress {
            name: self.name().to_string(),
            key: key.clone(),
        });

        let had_error = self.core.state.error.take().is_some();
        let action = self.keymap.resolve(&key);
        debug!("key {:?} -> {:?}", key.name, action.map(|a| a.name()));
        let focus = self.focus();

        let effect = match action {
            Some(Action::Submit) => Effect::Submit,
            Some(Action::Cancel) => Effect::Cancel,
            _ => self.kind.handle(&mut self.core, action, &key),
        };
        let effect = match effect {
            Effect::None if had_error => Effect::Render,
            Effect::Alert if had_error => {
                self.render(terminal)?;
                Effect::Alert
            }
            other => other,
        };
        let flow = self.apply(terminal, effect).await?;

        if self.core.state.is_pending() && self.focus() != focus {
            self.emit_focus();
        }
        Ok(flow)
    }

    async fn apply(&mut self, terminal: &mut Terminal, effect: Effect) -> Result<Flow, PromptError> {
        match effect {
            Effect::None => Ok(Flow::Continue),
            Effect::Render => {
                self.render(terminal)?;
                Ok(Flow::Continue)
            }
            Effect::Alert => {
                self.alert(terminal)?;
                Ok(Flow::Continue)
            }
            Effect::Submit => self.submit(terminal).await,
            Effect::Cancel => self.cancel(terminal).await,
        }
    }

    fn alert(&mut self, terminal: &mut Terminal) -> Result<(), PromptError> {
        terminal.write(ansi::BELL)?;
        self.emit(PromptEvent::Alert {
            name: self.name().to_string(),
        });
        Ok(())
    }

    // ========================================================================
    // Submit / cancel
    // ========================================================================

    async fn submit(&mut self, terminal: &mut Terminal) -> Result<Flow, PromptError> {
        if !self.core.state.is_pending() {
            return Ok(Flow::Continue);
        }
        self.core.state.validating = true;
        let value = self.kind.value(&self.core);

        if let Some(on_submit) = self.hooks.on_submit.clone() {
            on_submit.call(&self.core.state.name, &value).await;
        }

        let mut verdict = match self.kind.validatable() {
            Some(v) => v.check(&self.core, &value),
            None => Validation::Valid,
        };
        if verdict.is_valid() {
            if let Some(validate) = self.hooks.validate.clone() {
                verdict = validate.validate(&value, &self.core.state).await;
            }
        }

        if let Validation::Invalid(message) = verdict {
            warn!("prompt {:?} failed validation: {message}", self.name());
            self.core.state.validating = false;
            let pointer = &self.core.theme.symbols.pointer;
            self.core.state.error = Some(format!("{pointer} {}", message.trim()));
            self.render(terminal)?;
            self.alert(terminal)?;
            return Ok(Flow::Continue);
        }

        self.core.state.mark_submitted();
        self.render(terminal)?;
        self.close(terminal);
        let value = self.finish_value(value).await;
        self.emit(PromptEvent::Submit {
            name: self.name().to_string(),
            value: value.clone(),
        });
        Ok(Flow::Submitted(value))
    }

    async fn finish_value(&self, value: Answer) -> Answer {
        let value = self.kind.result(&self.core, value);
        match &self.hooks.result {
            Some(transform) => transform.transform(value).await,
            None => value,
        }
    }

    async fn cancel(&mut self, terminal: &mut Terminal) -> Result<Flow, PromptError> {
        if !self.core.state.mark_cancelled() {
            return Ok(Flow::Continue);
        }
        self.render(terminal)?;
        self.close(terminal);
        if let Some(on_cancel) = self.hooks.on_cancel.clone() {
            let value = self.kind.value(&self.core);
            on_cancel.call(&self.core.state.name, &value).await;
        }
        self.emit(PromptEvent::Cancel {
            name: self.name().to_string(),
        });
        Ok(Flow::Cancelled)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    fn painted(&self) -> Painted {
        Painted {
            buffer: self.core.state.buffer.clone(),
            rows_below: self.core.state.rows_below,
        }
    }

    fn render(&mut self, terminal: &mut Terminal) -> Result<(), PromptError> {
        if self.core.state.is_closed() {
            return Ok(());
        }
        let (columns, rows) = terminal.size();
        if let Some(list) = self.kind.selectable_mut() {
            let spare = rows.saturating_sub(RESERVED_ROWS + self.margin.top + self.margin.bottom);
            list.choices_mut().set_height(spare.max(1));
        }

        let frame = self.frame();
        let paint = render::paint(&self.painted(), &frame, &self.margin, columns);
        terminal.write(&paint.output)?;
        self.core.state.buffer = paint.painted.buffer;
        self.core.state.rows_below = paint.painted.rows_below;
        self.core.state.index = self
            .kind
            .selectable()
            .map(|s| s.choices().index())
            .unwrap_or(self.core.state.index);

        self.emit(PromptEvent::State {
            name: self.name().to_string(),
            state: self.core.state.clone(),
        });
        Ok(())
    }

    fn frame(&self) -> Frame {
        let state = &self.core.state;
        let theme = &self.core.theme;
        let status = state.status();

        let animated = |timer: &str, fallback: &str| {
            state
                .timers
                .get(timer)
                .and_then(|t| t.frame.clone())
                .unwrap_or_else(|| fallback.to_string())
        };
        let prefix = animated("prefix", theme.symbols.prefix(status));
        let separator = animated("separator", theme.symbols.separator(status));
        let prompt = format!(
            "{} {} {} ",
            theme.styles.paint(Role::for_status(status), &prefix),
            theme.styles.strong(&state.message),
            theme.styles.muted(&separator),
        );

        let (value, cursor) = match status {
            Status::Pending => {
                let (value, cursor) = self.kind.render_value(&self.core);
                match (&state.hint, value.is_empty()) {
                    (Some(hint), true) => (theme.styles.muted(hint), cursor.map(|_| 0)),
                    _ => (value, cursor),
                }
            }
            Status::Submitted => {
                let answer = self.kind.value(&self.core);
                let shown = match &self.hooks.format {
                    Some(format) => format(&answer, state),
                    None => self.kind.render_answer(&self.core, &answer),
                };
                (shown, None)
            }
            Status::Cancelled => {
                let (value, _) = self.kind.render_value(&self.core);
                (theme.styles.muted(&ansi::strip(&value)), None)
            }
        };

        let mut body = String::new();
        if status == Status::Pending {
            body = self.kind.body(&self.core);
            if let Some(error) = &state.error {
                if !body.is_empty() {
                    body.push('\n');
                }
                body.push_str(&theme.styles.danger(error));
            }
        }

        Frame {
            header: state.header.clone(),
            prompt,
            value,
            cursor,
            body,
            footer: state.footer.clone(),
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    fn emit(&self, event: PromptEvent) {
        if let Some(events) = &self.events {
            // A listener that went away doesn't stop the prompt.
            let _ = events.send(event);
        }
    }

    fn focus(&self) -> Option<ChoiceId> {
        self.kind.selectable().and_then(|s| s.choices().focused_id())
    }

    fn emit_focus(&self) {
        let choice = self
            .kind
            .selectable()
            .and_then(|s| s.choices().focused())
            .cloned();
        if let Some(choice) = choice {
            self.emit(PromptEvent::Choice {
                name: self.name().to_string(),
                choice,
            });
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
