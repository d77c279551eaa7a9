//! Events and types used throughout hyprzones.
//!
//! This module defines the vocabulary that all components share:
//! [`Event`] describes everything the engine reacts to, and
//! [`Direction`] / [`MonitorId`] / [`WindowId`] / [`MonitorInfo`] provide
//! the supporting data types.
//!
//! Events arrive as JSON from the command socket, so the wire types are
//! lenient: directions are parsed case-insensitively and window ids may be
//! given as numbers or as `"0x…"` strings (the form Hyprland prints).

use crate::config::Settings;
use crate::geometry::Rect;
use crate::identity::DesktopId;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Direction of a hotkey or a zone move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// `Up` and `Left` walk towards lower zone indices and earlier monitors.
    pub fn is_backward(self) -> bool {
        matches!(self, Direction::Left | Direction::Up)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Parse a direction string (case-insensitive; accepts "right", "Up", " down ", …).
fn parse_direction(s: &str) -> Option<Direction> {
    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect();
    match normalized.as_str() {
        "left" => Some(Direction::Left),
        "right" => Some(Direction::Right),
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_direction(&s).ok_or_else(|| DeError::custom(format!("invalid direction: {:?}", s)))
    }
}

/// Opaque monitor handle handed out by the window manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonitorId(pub u64);

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque top-level window handle.
///
/// Displayed in hex because that is how compositors print window
/// addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Parse `"0x55d0c1a4e2b0"`, `"55d0c1a4e2b0"` (hex) or a decimal string.
pub fn parse_window_id(s: &str) -> Option<WindowId> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok().map(WindowId);
    }
    s.parse::<u64>()
        .ok()
        .or_else(|| u64::from_str_radix(s, 16).ok())
        .map(WindowId)
}

/// Wire format for WindowId: accepts a number or a (hex) string.
impl<'de> Deserialize<'de> for WindowId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = WindowId;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "non-negative integer or window address string")
            }
            fn visit_u64<E>(self, n: u64) -> Result<WindowId, E> {
                Ok(WindowId(n))
            }
            fn visit_str<E>(self, s: &str) -> Result<WindowId, E>
            where
                E: DeError,
            {
                parse_window_id(s)
                    .ok_or_else(|| DeError::custom(format!("invalid window address: {:?}", s)))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Why the monitor/desktop topology needs to be re-derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayChangeKind {
    /// First pass after startup.
    Initialization,
    /// The user switched to another virtual desktop.
    VirtualDesktopSwitch,
    /// Monitors were added, removed or changed resolution.
    DisplayChange,
    /// A monitor's usable area changed (e.g. a bar was resized).
    WorkAreaChange,
}

impl fmt::Display for DisplayChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayChangeKind::Initialization => write!(f, "initialization"),
            DisplayChangeKind::VirtualDesktopSwitch => write!(f, "virtual desktop switch"),
            DisplayChangeKind::DisplayChange => write!(f, "display change"),
            DisplayChangeKind::WorkAreaChange => write!(f, "work area change"),
        }
    }
}

/// How an editor session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorExitKind {
    /// The editor closed on its own; its edits should be picked up.
    Exit,
    /// The editor was torn down by a second toggle; nothing to reload.
    Terminate,
}

/// Everything the engine reacts to.
///
/// Events are produced by [`EventSource`](crate::traits::EventSource)
/// implementations and consumed, strictly in arrival order, by the
/// [`ZoneEngine`](crate::engine::ZoneEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Re-derive all work areas.
    DisplayChanged(DisplayChangeKind),

    /// Virtual desktops were created or deleted.
    ///
    /// On the wire this is the JSON string `"VirtualDesktopsUpdated"`.
    VirtualDesktopsUpdated,

    /// A top-level window appeared.
    WindowCreated(WindowId),

    /// Cycle the windows of the focused monitor through its zones.
    SnapHotkey(Direction),

    /// Grow (`Right`) or shrink (`Left`) the main zone.
    WidthHotkey(Direction),

    /// Move the foreground window to the adjacent zone.
    MoveWindow(Direction),

    /// Open the layout editor for the focused work area, or close it if it
    /// is already open.
    ToggleEditor,

    /// The layout editor finished.
    EditorExit(EditorExitKind),

    /// Replace the runtime settings.
    SettingsChanged(Settings),
}

/// Static information about a monitor as enumerated by the window manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Handle the window manager uses for this monitor.
    pub id: MonitorId,
    /// Full monitor rectangle.
    pub rect: Rect,
    /// Usable part of the monitor, excluding bars and panels.
    pub work_area: Rect,
    /// Physical device id, if the window manager exposes one.
    pub device_id: Option<String>,
    /// Desktop shown on this monitor when the window manager keeps one per
    /// monitor.  `None` means the global current desktop.
    pub desktop: Option<DesktopId>,
    /// Mirroring pseudo-monitors are never given a work area.
    pub mirroring: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_display() {
        assert_eq!(Direction::Left.to_string(), "left");
        assert_eq!(Direction::Right.to_string(), "right");
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.to_string(), "down");
    }

    #[test]
    fn direction_parse_is_lenient() {
        assert_eq!(parse_direction(" Up "), Some(Direction::Up));
        assert_eq!(parse_direction("DOWN"), Some(Direction::Down));
        assert_eq!(parse_direction("up-left"), None);
    }

    #[test]
    fn backward_directions() {
        assert!(Direction::Up.is_backward());
        assert!(Direction::Left.is_backward());
        assert!(!Direction::Down.is_backward());
        assert!(!Direction::Right.is_backward());
    }

    #[test]
    fn window_id_parsing() {
        assert_eq!(parse_window_id("0x1f"), Some(WindowId(31)));
        assert_eq!(parse_window_id("42"), Some(WindowId(42)));
        assert_eq!(parse_window_id("beef"), Some(WindowId(0xbeef)));
        assert_eq!(parse_window_id("nope"), None);
        assert_eq!(WindowId(0xbeef).to_string(), "0xbeef");
    }

    #[test]
    fn deserialize_events() {
        let e: Event = serde_json::from_str(r#"{"SnapHotkey":"down"}"#).unwrap();
        assert_eq!(e, Event::SnapHotkey(Direction::Down));

        let e: Event = serde_json::from_str(r#"{"WindowCreated":"0x10"}"#).unwrap();
        assert_eq!(e, Event::WindowCreated(WindowId(16)));

        let e: Event = serde_json::from_str(r#"{"WindowCreated":16}"#).unwrap();
        assert_eq!(e, Event::WindowCreated(WindowId(16)));

        let e: Event = serde_json::from_str(r#"{"DisplayChanged":"WorkAreaChange"}"#).unwrap();
        assert_eq!(e, Event::DisplayChanged(DisplayChangeKind::WorkAreaChange));

        let e: Event = serde_json::from_str(r#""VirtualDesktopsUpdated""#).unwrap();
        assert_eq!(e, Event::VirtualDesktopsUpdated);

        let e: Event = serde_json::from_str(r#"{"EditorExit":"Terminate"}"#).unwrap();
        assert_eq!(e, Event::EditorExit(EditorExitKind::Terminate));
    }

    #[test]
    fn settings_event_accepts_partial_settings() {
        let e: Event =
            serde_json::from_str(r#"{"SettingsChanged":{"move_window_across_monitors":true}}"#)
                .unwrap();
        match e {
            Event::SettingsChanged(s) => assert!(s.move_window_across_monitors),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn invalid_direction_is_rejected() {
        assert!(serde_json::from_str::<Event>(r#"{"SnapHotkey":"sideways"}"#).is_err());
    }
}
