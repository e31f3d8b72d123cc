//! # Lifecycle Registry
//!
//! Shared, reference-counted exit hook. Every running prompt that changed the
//! terminal (raw mode, hidden cursor) registers a restore callback here.
//!
//! ```text
//! register() ──► count 0 → 1 ──► start signal listener thread (SIGINT / SIGTERM)
//!     │
//!     ▼
//! Registration (drop = unregister) ──► count 1 → 0 ──► close listener
//!                                                      └─► default action restored
//!
//! signal ──► fire() ──► every callback runs exactly once
//!                   └─► subscribers see Some(ExitSignal) and close their prompt
//! ```
//!
//! While no registry is listening, SIGINT and SIGTERM get the default action
//! again, so the process dies as if askit had never touched them.
//!
//! The registry is passed into each prompt rather than living in a global, so
//! tests can build one with signals turned off and fire it by hand.

use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSignal {
    Interrupt,
    Terminate,
}

impl ExitSignal {
    /// Conventional process exit code for this signal (128 + signo).
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitSignal::Interrupt => 130,
            ExitSignal::Terminate => 143,
        }
    }
}

impl fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitSignal::Interrupt => write!(f, "SIGINT"),
            ExitSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

type Cleanup = Box<dyn FnOnce() + Send>;

struct Inner {
    next_id: u64,
    callbacks: BTreeMap<u64, Cleanup>,
    fired: Option<ExitSignal>,
    listener: Option<os::Listener>,
    signals: bool,
}

#[derive(Clone)]
pub struct LifecycleRegistry {
    inner: Arc<Mutex<Inner>>,
    fired_tx: Arc<watch::Sender<Option<ExitSignal>>>,
}

impl Default for LifecycleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleRegistry {
    /// A registry that listens for process signals while anything is registered.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// A registry that never installs signal handlers. `fire()` still works.
    pub fn without_signals() -> Self {
        Self::build(false)
    }

    fn build(signals: bool) -> Self {
        let (fired_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 0,
                callbacks: BTreeMap::new(),
                fired: None,
                listener: None,
                signals,
            })),
            fired_tx: Arc::new(fired_tx),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking callback can't leave the map half-updated, so a poisoned
        // lock is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of live registrations.
    pub fn active(&self) -> usize {
        self.lock().callbacks.len()
    }

    pub fn is_listening(&self) -> bool {
        self.lock().listener.is_some()
    }

    pub fn fired(&self) -> Option<ExitSignal> {
        self.lock().fired
    }

    /// Receiver that flips to `Some` when the hook fires.
    pub fn subscribe(&self) -> watch::Receiver<Option<ExitSignal>> {
        self.fired_tx.subscribe()
    }

    /// Register a restore callback. Dropping the returned guard unregisters it
    /// without running it.
    pub fn register<F>(&self, cleanup: F) -> Registration
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.callbacks.insert(id, Box::new(cleanup));
        let count = inner.callbacks.len();
        if count == 1 && inner.signals && inner.fired.is_none() {
            inner.listener = os::Listener::spawn(self);
        }
        debug!("lifecycle: registered #{id} ({count} active)");
        Registration {
            registry: self.clone(),
            id: Some(id),
        }
    }

    fn unregister(&self, id: u64) {
        let mut inner = self.lock();
        if inner.callbacks.remove(&id).is_none() {
            return;
        }
        let count = inner.callbacks.len();
        if count == 0 {
            if let Some(listener) = inner.listener.take() {
                listener.close();
            }
        }
        debug!("lifecycle: unregistered #{id} ({count} active)");
    }

    /// Run every registered callback, once. Later calls do nothing.
    pub fn fire(&self, signal: ExitSignal) {
        let callbacks = {
            let mut inner = self.lock();
            if inner.fired.is_some() {
                return;
            }
            inner.fired = Some(signal);
            if let Some(listener) = inner.listener.take() {
                listener.close();
            }
            std::mem::take(&mut inner.callbacks)
        };
        info!("lifecycle: {signal} received, running {} cleanup(s)", callbacks.len());
        for (_, cleanup) in callbacks {
            cleanup();
        }
        self.fired_tx.send_replace(Some(signal));
    }
}

// ============================================================================
// OS signals
// ============================================================================

#[cfg(unix)]
mod os {
    use super::{ExitSignal, LifecycleRegistry};
    use log::{debug, warn};
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::{Handle, Signals};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, OnceLock};
    use std::thread;

    /// Process-wide fallback: while `idle` is set, SIGINT/SIGTERM run the
    /// default action (the process terminates).
    struct DefaultAction {
        listening: AtomicUsize,
        idle: Arc<AtomicBool>,
    }

    impl DefaultAction {
        fn get() -> &'static DefaultAction {
            static ACTION: OnceLock<DefaultAction> = OnceLock::new();
            ACTION.get_or_init(|| {
                let idle = Arc::new(AtomicBool::new(true));
                for signal in [SIGINT, SIGTERM] {
                    if let Err(e) =
                        signal_hook::flag::register_conditional_default(signal, idle.clone())
                    {
                        warn!("lifecycle: default action for signal {signal} not installed: {e}");
                    }
                }
                DefaultAction {
                    listening: AtomicUsize::new(0),
                    idle,
                }
            })
        }

        fn attach(&self) {
            if self.listening.fetch_add(1, Ordering::SeqCst) == 0 {
                self.idle.store(false, Ordering::SeqCst);
            }
        }

        fn detach(&self) {
            if self.listening.fetch_sub(1, Ordering::SeqCst) == 1 {
                self.idle.store(true, Ordering::SeqCst);
                debug!("lifecycle: default signal action restored");
            }
        }
    }

    impl ExitSignal {
        fn from_raw(signo: i32) -> Self {
            if signo == SIGTERM {
                ExitSignal::Terminate
            } else {
                ExitSignal::Interrupt
            }
        }
    }

    /// Listener thread that fires the registry on the first SIGINT/SIGTERM.
    pub(super) struct Listener {
        handle: Handle,
    }

    impl Listener {
        pub(super) fn spawn(registry: &LifecycleRegistry) -> Option<Listener> {
            let action = DefaultAction::get();
            action.attach();
            let mut signals = match Signals::new([SIGINT, SIGTERM]) {
                Ok(signals) => signals,
                Err(e) => {
                    warn!("lifecycle: signal listener not installed: {e}");
                    action.detach();
                    return None;
                }
            };
            let handle = signals.handle();
            let registry = registry.clone();
            let spawned = thread::Builder::new()
                .name("askit-signal-listener".to_owned())
                .spawn(move || {
                    if let Some(signo) = signals.forever().next() {
                        registry.fire(ExitSignal::from_raw(signo));
                    }
                });
            if let Err(e) = spawned {
                warn!("lifecycle: signal listener thread not started: {e}");
                handle.close();
                action.detach();
                return None;
            }
            debug!("lifecycle: signal listener attached");
            Some(Listener { handle })
        }

        pub(super) fn close(self) {
            self.handle.close();
            DefaultAction::get().detach();
            debug!("lifecycle: signal listener detached");
        }
    }
}

#[cfg(not(unix))]
mod os {
    use super::LifecycleRegistry;
    use log::warn;

    pub(super) struct Listener;

    impl Listener {
        pub(super) fn spawn(_registry: &LifecycleRegistry) -> Option<Listener> {
            warn!("lifecycle: signal listener not supported on this platform");
            None
        }

        pub(super) fn close(self) {}
    }
}

/// Live registration. Unregisters on drop.
pub struct Registration {
    registry: LifecycleRegistry,
    id: Option<u64>,
}

impl Registration {
    pub fn release(mut self) {
        if let Some(id) = self.id.take() {
            self.registry.unregister(id);
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.registry.unregister(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_registration_is_reference_counted() {
        let registry = LifecycleRegistry::without_signals();
        let a = registry.register(|| {});
        let b = registry.register(|| {});
        assert_eq!(registry.active(), 2);
        drop(a);
        assert_eq!(registry.active(), 1);
        b.release();
        assert_eq!(registry.active(), 0);
    }

    #[test]
    fn test_fire_runs_each_callback_once() {
        let registry = LifecycleRegistry::without_signals();
        let (count, cleanup) = counter();
        let _reg = registry.register(cleanup);
        registry.fire(ExitSignal::Terminate);
        registry.fire(ExitSignal::Terminate);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(registry.fired(), Some(ExitSignal::Terminate));
        assert_eq!(registry.active(), 0);
    }

    #[test]
    fn test_unregistered_callback_never_runs() {
        let registry = LifecycleRegistry::without_signals();
        let (count, cleanup) = counter();
        registry.register(cleanup).release();
        registry.fire(ExitSignal::Interrupt);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_subscribers_see_fire() {
        let registry = LifecycleRegistry::without_signals();
        let mut rx = registry.subscribe();
        let _reg = registry.register(|| {});
        registry.fire(ExitSignal::Interrupt);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(ExitSignal::Interrupt));
    }

    #[cfg(unix)]
    #[test]
    fn test_listener_attached_while_registered() {
        let registry = LifecycleRegistry::new();
        assert!(!registry.is_listening());
        let reg = registry.register(|| {});
        assert!(registry.is_listening());
        drop(reg);
        assert!(!registry.is_listening());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitSignal::Interrupt.exit_code(), 130);
        assert_eq!(ExitSignal::Terminate.to_string(), "SIGTERM");
    }
}
