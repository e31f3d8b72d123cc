//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.askit/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::keymap::KeymapOverrides;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AskitConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    /// Style role → colour name (`primary = "blue"`).
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
    /// Symbol name → replacement text (`pointer = ">"`).
    #[serde(default)]
    pub symbols: BTreeMap<String, String>,
    #[serde(default)]
    pub actions: KeymapOverrides,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub quick_jump_delay_ms: Option<u64>,
    pub color: Option<bool>,
    pub limit: Option<usize>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_QUICK_JUMP_DELAY_MS: u64 = 400;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub quick_jump_delay: Duration,
    pub color: bool,
    pub limit: Option<usize>,
    pub styles: BTreeMap<String, String>,
    pub symbols: BTreeMap<String, String>,
    pub actions: KeymapOverrides,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve_with_env(&AskitConfig::default(), false, |_| None)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the directory `~/.askit`.
pub fn askit_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".askit"))
}

/// Returns the path to `~/.askit/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    askit_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.askit/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `AskitConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<AskitConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(AskitConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(AskitConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config = parse_config(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<AskitConfig, ConfigError> {
    toml::from_str(contents).map_err(ConfigError::Parse)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# askit configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# quick_jump_delay_ms = 400     # Or set ASKIT_QUICK_JUMP_MS
# color = true                  # NO_COLOR or --no-color turn this off
# limit = 10                    # Visible choices in list prompts

# [styles]
# primary = "cyan"
# success = "green"
# danger = "magenta"
# muted = "dark_grey"
# disabled = "grey"

# [symbols]
# pointer = "❯"
# check = "✔"
# cross = "✖"

# [actions.ctrl]
# x = "toggleCursor"

# [actions.keys]
# q = "cancel"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_no_color` is the `--no-color` flag.
pub fn resolve(config: &AskitConfig, cli_no_color: bool) -> ResolvedConfig {
    resolve_with_env(config, cli_no_color, |key| std::env::var(key).ok())
}

fn resolve_with_env<F>(config: &AskitConfig, cli_no_color: bool, env: F) -> ResolvedConfig
where
    F: Fn(&str) -> Option<String>,
{
    // Quick-jump delay: env → config → default
    let quick_jump_ms = env("ASKIT_QUICK_JUMP_MS")
        .and_then(|v| match v.trim().parse::<u64>() {
            Ok(ms) => Some(ms),
            Err(_) => {
                warn!("Ignoring invalid ASKIT_QUICK_JUMP_MS={v:?}");
                None
            }
        })
        .or(config.general.quick_jump_delay_ms)
        .unwrap_or(DEFAULT_QUICK_JUMP_DELAY_MS);

    // Colour: CLI → NO_COLOR → config → on
    let no_color_env = env("NO_COLOR").is_some_and(|v| !v.is_empty());
    let color = !cli_no_color && !no_color_env && config.general.color.unwrap_or(true);

    ResolvedConfig {
        quick_jump_delay: Duration::from_millis(quick_jump_ms),
        color,
        limit: config.general.limit.filter(|l| *l > 0),
        styles: config.styles.clone(),
        symbols: config.symbols.clone(),
        actions: config.actions.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::Action;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&AskitConfig::default(), false, no_env);
        assert_eq!(resolved.quick_jump_delay, Duration::from_millis(400));
        assert!(resolved.color);
        assert!(resolved.limit.is_none());
        assert!(resolved.actions.is_empty());
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config = parse_config(
            r#"
[general]
limit = 7
"#,
        )
        .unwrap();
        assert_eq!(config.general.limit, Some(7));
        assert!(config.general.quick_jump_delay_ms.is_none());
        assert!(config.styles.is_empty());
    }

    #[test]
    fn test_full_toml_parses() {
        let config = parse_config(
            r#"
[general]
quick_jump_delay_ms = 250
color = false

[styles]
primary = "blue"

[symbols]
pointer = ">"

[actions.ctrl]
x = "submit"

[actions.option]
up = "pageUp"
"#,
        )
        .unwrap();
        assert_eq!(config.general.quick_jump_delay_ms, Some(250));
        assert_eq!(config.styles.get("primary").map(String::as_str), Some("blue"));
        assert_eq!(config.symbols.get("pointer").map(String::as_str), Some(">"));
        assert_eq!(config.actions.ctrl.get("x"), Some(&Action::Submit));
        assert_eq!(config.actions.option.get("up"), Some(&Action::PageUp));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = parse_config("[general\nlimit = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("config parse error"));
    }

    #[test]
    fn test_unknown_action_is_parse_error() {
        let err = parse_config("[actions.keys]\nq = \"explode\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides_config() {
        let config = AskitConfig {
            general: GeneralConfig {
                quick_jump_delay_ms: Some(250),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, false, |key| match key {
            "ASKIT_QUICK_JUMP_MS" => Some("900".to_string()),
            _ => None,
        });
        assert_eq!(resolved.quick_jump_delay, Duration::from_millis(900));
    }

    #[test]
    fn test_invalid_env_falls_back_to_config() {
        let config = AskitConfig {
            general: GeneralConfig {
                quick_jump_delay_ms: Some(250),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, false, |key| match key {
            "ASKIT_QUICK_JUMP_MS" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(resolved.quick_jump_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_no_color_sources() {
        let config = AskitConfig::default();
        assert!(!resolve_with_env(&config, true, no_env).color);

        let resolved = resolve_with_env(&config, false, |key| {
            (key == "NO_COLOR").then(|| "1".to_string())
        });
        assert!(!resolved.color);

        // An empty NO_COLOR doesn't count
        let resolved = resolve_with_env(&config, false, |key| {
            (key == "NO_COLOR").then(String::new)
        });
        assert!(resolved.color);
    }

    #[test]
    fn test_zero_limit_means_unlimited() {
        let config = parse_config("[general]\nlimit = 0").unwrap();
        assert!(resolve_with_env(&config, false, no_env).limit.is_none());
    }
}
