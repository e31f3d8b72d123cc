#![cfg(unix)]

use askit::core::lifecycle::{ExitSignal, LifecycleRegistry};
use signal_hook::consts::signal::SIGTERM;
use signal_hook::low_level::raise;
use std::os::unix::process::ExitStatusExt;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

const CHILD_ENV: &str = "ASKIT_SIGNAL_CHILD";

// ============================================================================
// Helper Functions
// ============================================================================

fn wait_for_fire(registry: &LifecycleRegistry) -> Option<ExitSignal> {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if let Some(signal) = registry.fired() {
            return Some(signal);
        }
        thread::sleep(Duration::from_millis(10));
    }
    None
}

// ============================================================================
// Signal Handling
// ============================================================================

#[test]
fn test_sigterm_fires_registry_while_registered() {
    let registry = LifecycleRegistry::new();
    let _registration = registry.register(|| {});
    assert!(registry.is_listening());

    raise(SIGTERM).expect("SIGTERM should be raised");
    assert_eq!(wait_for_fire(&registry), Some(ExitSignal::Terminate));
    assert!(!registry.is_listening());
}

/// Re-runs itself in a child process. The child registers, unregisters and
/// raises SIGTERM, which must kill it.
#[test]
fn test_default_action_restored_after_last_registration() {
    if std::env::var_os(CHILD_ENV).is_some() {
        let registry = LifecycleRegistry::new();
        let registration = registry.register(|| {});
        drop(registration);
        assert!(!registry.is_listening());

        raise(SIGTERM).expect("SIGTERM should be raised");
        thread::sleep(Duration::from_secs(2));
        std::process::exit(0);
    }

    let exe = std::env::current_exe().expect("test binary path");
    let status = Command::new(exe)
        .args([
            "--exact",
            "test_default_action_restored_after_last_registration",
            "--test-threads=1",
        ])
        .env(CHILD_ENV, "1")
        .status()
        .expect("child test should start");
    assert_eq!(status.signal(), Some(SIGTERM));
}
