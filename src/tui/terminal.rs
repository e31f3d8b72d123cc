//! # Terminal Streams
//!
//! A prompt talks to a [`Terminal`]: raw byte chunks in, escape sequences out,
//! a raw-mode switch and a size. Two backends exist:
//!
//! ```text
//!   Terminal::stdio()          VirtualTerminal::new(cols, rows)
//!   ┌──────────────────┐       ┌──────────────────────────────┐
//!   │ stdin thread ──► │       │ press("12\r") ──► channel    │
//!   │ stdout           │       │ output() ◄── captured bytes  │
//!   │ crossterm raw    │       │ raw flag (AtomicBool)        │
//!   └──────────────────┘       └──────────────────────────────┘
//! ```
//!
//! The virtual backend lets whole prompt sessions run headless in tests.

use log::{debug, warn};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::tui::ansi;

static RAW_MODE_ENABLED: AtomicBool = AtomicBool::new(false);

/// Put the real terminal back the way we found it: cooked mode, visible caret.
/// Safe to call any number of times, from any thread.
pub fn restore_terminal() {
    if RAW_MODE_ENABLED.swap(false, Ordering::SeqCst) {
        let _ = disable_raw_mode();
    }
    let mut stdout = io::stdout();
    let _ = stdout.write_all(ansi::show_cursor().as_bytes());
    let _ = stdout.flush();
}

enum Backend {
    Stdio,
    Virtual {
        raw: Arc<AtomicBool>,
        size: (usize, usize),
    },
}

pub struct Terminal {
    input: mpsc::UnboundedReceiver<Vec<u8>>,
    output: Box<dyn Write + Send>,
    backend: Backend,
}

impl Terminal {
    /// The process's own stdin/stdout.
    ///
    /// Stdin is read on a dedicated thread; each `read()` becomes one chunk.
    pub fn stdio() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let mut stdin = io::stdin();
            let mut buf = [0u8; 1024];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) => {
                        debug!("stdin closed");
                        break;
                    }
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
        });
        Self {
            input: rx,
            output: Box::new(io::stdout()),
            backend: Backend::Stdio,
        }
    }

    /// Next raw chunk. `None` once the input side is gone.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.input.recv().await
    }

    pub fn write(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }

    /// `(columns, rows)`.
    pub fn size(&self) -> (usize, usize) {
        match &self.backend {
            Backend::Stdio => crossterm::terminal::size()
                .map(|(c, r)| (usize::from(c), usize::from(r)))
                .unwrap_or((80, 24)),
            Backend::Virtual { size, .. } => *size,
        }
    }

    pub fn enable_raw(&mut self) -> io::Result<()> {
        match &self.backend {
            Backend::Stdio => {
                enable_raw_mode()?;
                RAW_MODE_ENABLED.store(true, Ordering::SeqCst);
            }
            Backend::Virtual { raw, .. } => raw.store(true, Ordering::SeqCst),
        }
        Ok(())
    }

    pub fn disable_raw(&mut self) -> io::Result<()> {
        match &self.backend {
            Backend::Stdio => {
                if RAW_MODE_ENABLED.swap(false, Ordering::SeqCst) {
                    disable_raw_mode()?;
                }
            }
            Backend::Virtual { raw, .. } => raw.store(false, Ordering::SeqCst),
        }
        Ok(())
    }

    /// A callback that undoes raw mode and cursor hiding, for the lifecycle
    /// registry to run if the process is told to exit mid-prompt.
    pub fn restore_hook(&self) -> impl FnOnce() + Send + 'static {
        let raw = match &self.backend {
            Backend::Stdio => None,
            Backend::Virtual { raw, .. } => Some(raw.clone()),
        };
        move || match raw {
            Some(raw) => raw.store(false, Ordering::SeqCst),
            None => restore_terminal(),
        }
    }
}

// ============================================================================
// Virtual terminal
// ============================================================================

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn bytes(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The test side of an in-memory terminal.
#[derive(Clone)]
pub struct VirtualTerminal {
    keys: mpsc::UnboundedSender<Vec<u8>>,
    screen: Capture,
    raw: Arc<AtomicBool>,
}

impl VirtualTerminal {
    /// A keyboard/screen pair plus the [`Terminal`] a prompt runs on.
    pub fn new(columns: usize, rows: usize) -> (VirtualTerminal, Terminal) {
        let (tx, rx) = mpsc::unbounded_channel();
        let screen = Capture::default();
        let raw = Arc::new(AtomicBool::new(false));
        let terminal = Terminal {
            input: rx,
            output: Box::new(screen.clone()),
            backend: Backend::Virtual {
                raw: raw.clone(),
                size: (columns.max(1), rows.max(1)),
            },
        };
        let keyboard = VirtualTerminal {
            keys: tx,
            screen,
            raw,
        };
        (keyboard, terminal)
    }

    /// Deliver `text` as one input chunk.
    pub fn press(&self, text: &str) {
        self.press_bytes(text.as_bytes());
    }

    pub fn press_bytes(&self, bytes: &[u8]) {
        if self.keys.send(bytes.to_vec()).is_err() {
            debug!("virtual terminal: input dropped, no reader");
        }
    }

    /// Everything written so far, escapes included.
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.screen.bytes()).into_owned()
    }

    /// Everything written so far with escapes stripped.
    pub fn plain_output(&self) -> String {
        ansi::strip(&self.output())
    }

    /// Drain the captured output.
    pub fn take_output(&self) -> String {
        let bytes = std::mem::take(&mut *self.screen.bytes());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn is_raw(&self) -> bool {
        self.raw.load(Ordering::SeqCst)
    }
}
