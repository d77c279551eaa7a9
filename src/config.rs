//! Application configuration.
//!
//! The configuration is loaded from a JSON file whose path is passed on the
//! command line (`--config <path>`), falling back to
//! `$XDG_CONFIG_HOME/hyprzones/config.json`.  A missing file is not an
//! error: every section falls back to its compiled-in default.
//!
//! # Example
//!
//! ```json
//! {
//!   "settings": {
//!     "move_window_across_monitors": true,
//!     "display_change_move_windows": true,
//!     "excluded_apps": "firefox\nSteam"
//!   },
//!   "default_layout": { "type": "Columns", "zone_count": 2 },
//!   "store_path": "/home/me/.local/state/hyprzones/layouts.json"
//! }
//! ```

use crate::layout::LayoutDescriptor;
use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Top-level configuration.
///
/// Every field is optional; a minimal `{}` file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Behaviour switches, also replaceable at runtime through
    /// [`Event::SettingsChanged`](crate::event::Event::SettingsChanged).
    #[serde(default)]
    pub settings: Settings,

    /// Layout seeded for work areas that have never been seen before.
    /// Defaults to [`LayoutDescriptor::default`].
    #[serde(default)]
    pub default_layout: Option<LayoutDescriptor>,

    /// Where the layout store is snapshotted.  `None` keeps it in memory.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

/// Runtime behaviour switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Handle the directional snap hotkeys.  When off, snap hotkey events
    /// are ignored.
    pub override_snap_hotkeys: bool,
    /// Let snap hotkeys and directional moves cross to adjacent monitors.
    pub move_window_across_monitors: bool,
    /// Restore zone assignments after a monitor or work-area change.
    pub display_change_move_windows: bool,
    /// Restore zone assignments after the layout editor exits.
    pub zone_set_change_move_windows: bool,
    /// Put newly created windows back into the zones their application
    /// last used.
    pub app_last_zone_move_windows: bool,
    /// Applications never placed into zones.
    pub excluded_apps: ExcludedApps,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            override_snap_hotkeys: true,
            move_window_across_monitors: false,
            display_change_move_windows: false,
            zone_set_change_move_windows: false,
            app_last_zone_move_windows: false,
            excluded_apps: ExcludedApps::default(),
        }
    }
}

/// Upper-cased application names excluded from zone placement.
///
/// Deserialized from either a newline-separated string or an array of
/// strings; blank entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedApps(Vec<String>);

impl ExcludedApps {
    pub fn new<I, S>(apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            apps.into_iter()
                .map(|s| s.as_ref().trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// Whether `app` (an application class or path) matches an excluded
    /// entry.  Matching is case-insensitive on substrings, so `STEAM`
    /// excludes `steam_app_1234`.
    pub fn matches(&self, app: &str) -> bool {
        let app = app.to_uppercase();
        self.0.iter().any(|excluded| app.contains(excluded.as_str()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ExcludedApps {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExcludedApps {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = ExcludedApps;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "newline-separated string or list of application names")
            }
            fn visit_str<E>(self, s: &str) -> Result<ExcludedApps, E> {
                Ok(ExcludedApps::new(s.lines()))
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<ExcludedApps, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut apps = Vec::new();
                while let Some(app) = seq.next_element::<String>()? {
                    apps.push(app);
                }
                Ok(ExcludedApps::new(apps))
            }
        }
        deserializer.deserialize_any(V)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise return the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// `$XDG_CONFIG_HOME/hyprzones/config.json`, or `~/.config/…` when the
    /// variable is unset.
    pub fn default_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(base.join("hyprzones").join("config.json"))
    }

    /// The layout to seed for never-seen work areas.
    pub fn default_layout(&self) -> LayoutDescriptor {
        self.default_layout
            .clone()
            .map(LayoutDescriptor::with_default_id)
            .unwrap_or_default()
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutType;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "settings": {
                "override_snap_hotkeys": false,
                "move_window_across_monitors": true,
                "display_change_move_windows": true,
                "zone_set_change_move_windows": true,
                "app_last_zone_move_windows": true,
                "excluded_apps": "firefox\n\n  Steam "
            },
            "default_layout": { "type": "Columns", "zone_count": 2 },
            "store_path": "/tmp/layouts.json"
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert!(!cfg.settings.override_snap_hotkeys);
        assert!(cfg.settings.move_window_across_monitors);
        assert!(cfg.settings.display_change_move_windows);
        assert!(cfg.settings.zone_set_change_move_windows);
        assert!(cfg.settings.app_last_zone_move_windows);
        assert_eq!(cfg.settings.excluded_apps.as_slice(), ["FIREFOX", "STEAM"]);
        assert_eq!(cfg.store_path, Some(PathBuf::from("/tmp/layouts.json")));

        let layout = cfg.default_layout();
        assert_eq!(layout.kind, LayoutType::Columns);
        assert_eq!(layout.zone_count, 2);
        assert_eq!(layout.id, LayoutType::Columns.builtin_id());
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.settings, Settings::default());
        assert!(cfg.settings.override_snap_hotkeys);
        assert!(cfg.settings.excluded_apps.is_empty());
        assert_eq!(cfg.default_layout(), LayoutDescriptor::default());
        assert_eq!(cfg.store_path, None);
    }

    #[test]
    fn excluded_apps_from_array() {
        let s: Settings = serde_json::from_str(r#"{ "excluded_apps": ["kitty", ""] }"#).unwrap();
        assert_eq!(s.excluded_apps.as_slice(), ["KITTY"]);
    }

    #[test]
    fn excluded_apps_match_case_insensitive_substrings() {
        let apps = ExcludedApps::new(["steam"]);
        assert!(apps.matches("steam_app_1234"));
        assert!(apps.matches("Steam"));
        assert!(!apps.matches("firefox"));
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "settings": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join(format!(
            "hyprzones-missing-config-{}.json",
            std::process::id()
        ));
        let cfg = Config::load_or_default(&path).unwrap();
        assert_eq!(cfg.settings, Settings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = std::env::temp_dir().join(format!(
            "hyprzones-bad-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").unwrap();
        let result = Config::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
    }
}
