//! [`WindowManager`] and [`VirtualDesktops`] backed by Hyprland IPC.
//!
//! Communicates directly with Hyprland through its Unix socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`.
//!
//! Hyprland workspaces play the role of virtual desktops.  Every monitor
//! shows its own workspace, so each [`MonitorInfo`] carries the desktop it
//! shows and a window's desktop is the workspace it lives on.  The current
//! desktop is the workspace on the focused monitor.  Special (scratchpad) workspaces
//! have negative ids and their windows are never zoned.

use crate::config::ExcludedApps;
use crate::event::{MonitorId, MonitorInfo, WindowId};
use crate::geometry::Rect;
use crate::identity::DesktopId;
use crate::traits::{VirtualDesktops, WindowManager};
use log::debug;
use serde::Deserialize;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Hyprland-backed window manager.
///
/// Stateless: every method opens a short-lived IPC request, so the handle
/// can be constructed as often as needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct HyprlandWm;

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprlandError(pub(crate) String);

impl HyprlandWm {
    pub fn new() -> Self {
        Self
    }
}

//  Direct Hyprland IPC helpers

/// Resolve one of Hyprland's sockets, e.g. `.socket.sock` or
/// `.socket2.sock`.
pub(crate) fn socket_path(file: &str) -> Result<PathBuf, HyprlandError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map_err(|_| HyprlandError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(format!("{}/hypr/{}/{}", runtime_dir, his, file)))
}

fn ipc_request(command: &str) -> Result<String, HyprlandError> {
    let path = socket_path(".socket.sock")?;
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| HyprlandError(format!("connect to {}: {}", path.display(), e)))?;

    stream
        .write_all(command.as_bytes())
        .map_err(|e| HyprlandError(format!("write: {}", e)))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| HyprlandError(format!("read: {}", e)))?;

    String::from_utf8(response).map_err(|e| HyprlandError(format!("utf-8: {}", e)))
}

/// Send a JSON data query (`j/<command>`) and parse the reply.
fn ipc_json<T: for<'de> Deserialize<'de>>(data_command: &str) -> Result<T, HyprlandError> {
    let json = ipc_request(&format!("j/{}", data_command))?;
    serde_json::from_str(&json).map_err(|e| HyprlandError(format!("parse {}: {}", data_command, e)))
}

/// Send a dispatch command and check for `"ok"`.
fn ipc_dispatch(args: &str) -> Result<(), HyprlandError> {
    let response = ipc_request(&format!("/dispatch {}", args))?;
    if response.trim() == "ok" {
        Ok(())
    } else {
        Err(HyprlandError(format!("dispatch {}: {}", args, response.trim())))
    }
}

//  Minimal serde structs for the JSON we care about

#[derive(Debug, Deserialize)]
struct WorkspaceRef {
    id: i64,
}

/// Subset of the JSON object returned by `j/monitors all`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonitorJson {
    id: u64,
    name: String,
    #[serde(default)]
    description: String,
    width: i32,
    height: i32,
    x: i32,
    y: i32,
    #[serde(default = "unit_scale")]
    scale: f64,
    #[serde(default)]
    transform: u32,
    /// Space taken by bars and panels: left, top, right, bottom.
    #[serde(default)]
    reserved: [i32; 4],
    #[serde(default)]
    focused: bool,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    mirror_of: Option<String>,
    active_workspace: WorkspaceRef,
}

fn unit_scale() -> f64 {
    1.0
}

/// Subset of the JSON object returned by `j/clients`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientJson {
    address: String,
    #[serde(default)]
    mapped: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    floating: bool,
    workspace: WorkspaceRef,
    monitor: i64,
    #[serde(default)]
    class: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "focusHistoryID", default)]
    focus_history_id: i64,
}

#[derive(Debug, Deserialize)]
struct ActiveWindowJson {
    #[serde(default)]
    address: Option<String>,
}

impl WorkspaceRef {
    /// Special workspaces have negative ids and are not desktops.
    fn desktop(&self) -> Option<DesktopId> {
        (self.id > 0).then(|| DesktopId::from_workspace(self.id))
    }
}

impl MonitorJson {
    /// Mirrors report `"none"` when they mirror nothing.
    fn is_mirror(&self) -> bool {
        self.mirror_of
            .as_deref()
            .is_some_and(|m| !m.is_empty() && m != "none")
    }

    /// The monitor rectangle in layout coordinates.
    fn rect(&self) -> Rect {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        let (w, h) = if self.transform % 2 == 1 {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        };
        Rect::new(
            self.x,
            self.y,
            (w as f64 / scale).round() as i32,
            (h as f64 / scale).round() as i32,
        )
    }

    fn info(&self) -> MonitorInfo {
        let rect = self.rect();
        let [left, top, right, bottom] = self.reserved;
        let work_area = Rect::from_edges(
            rect.left() + left,
            rect.top() + top,
            rect.right() - right,
            rect.bottom() - bottom,
        );
        let device_id = if self.description.trim().is_empty() {
            self.name.clone()
        } else {
            self.description.clone()
        };
        MonitorInfo {
            id: MonitorId(self.id),
            rect,
            work_area,
            device_id: Some(device_id),
            desktop: self.active_workspace.desktop(),
            mirroring: self.is_mirror(),
        }
    }
}

impl ClientJson {
    fn id(&self) -> Option<WindowId> {
        let hex = self.address.trim().trim_start_matches("0x");
        u64::from_str_radix(hex, 16).ok().map(WindowId)
    }

    fn desktop(&self) -> Option<DesktopId> {
        self.workspace.desktop()
    }

    fn is_interesting(&self, excluded: &ExcludedApps) -> bool {
        self.mapped
            && !self.hidden
            && self.workspace.id > 0
            && !self.class.is_empty()
            && !excluded.matches(&self.class)
            && !excluded.matches(&self.title)
    }
}

fn clients() -> Result<Vec<ClientJson>, HyprlandError> {
    let mut clients: Vec<ClientJson> = ipc_json("clients")?;
    // Most recently focused first.
    clients.sort_by_key(|c| c.focus_history_id);
    Ok(clients)
}

fn client(window: WindowId) -> Result<Option<ClientJson>, HyprlandError> {
    Ok(clients()?.into_iter().find(|c| c.id() == Some(window)))
}

fn active_monitors() -> Result<Vec<MonitorJson>, HyprlandError> {
    let monitors: Vec<MonitorJson> = ipc_json("monitors all")?;
    Ok(monitors.into_iter().filter(|m| !m.disabled).collect())
}

//  WindowManager implementation

impl WindowManager for HyprlandWm {
    type Error = HyprlandError;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error> {
        Ok(active_monitors()?.iter().map(MonitorJson::info).collect())
    }

    fn windows(&self) -> Result<Vec<WindowId>, Self::Error> {
        Ok(clients()?.iter().filter_map(ClientJson::id).collect())
    }

    fn is_interesting(&self, window: WindowId, excluded: &ExcludedApps) -> Result<bool, Self::Error> {
        Ok(client(window)?.is_some_and(|c| c.is_interesting(excluded)))
    }

    fn app_id(&self, window: WindowId) -> Result<Option<String>, Self::Error> {
        Ok(client(window)?
            .map(|c| c.class)
            .filter(|class| !class.is_empty()))
    }

    fn window_monitor(&self, window: WindowId) -> Result<Option<MonitorId>, Self::Error> {
        Ok(client(window)?
            .and_then(|c| u64::try_from(c.monitor).ok())
            .map(MonitorId))
    }

    fn window_desktop(&self, window: WindowId) -> Result<Option<DesktopId>, Self::Error> {
        Ok(client(window)?.and_then(|c| c.desktop()))
    }

    fn foreground_window(&self) -> Result<Option<WindowId>, Self::Error> {
        // `{}` when nothing has focus.
        let active: ActiveWindowJson = ipc_json("activewindow")?;
        Ok(active.address.and_then(|a| {
            u64::from_str_radix(a.trim_start_matches("0x"), 16)
                .ok()
                .map(WindowId)
        }))
    }

    fn active_monitor(&self) -> Result<Option<MonitorId>, Self::Error> {
        Ok(active_monitors()?
            .iter()
            .find(|m| m.focused)
            .map(|m| MonitorId(m.id)))
    }

    fn set_window_rect(&self, window: WindowId, rect: Rect) -> Result<(), Self::Error> {
        let Some(client) = client(window)? else {
            return Err(HyprlandError(format!("no such window {}", window)));
        };
        // Exact geometry only sticks on floating windows.
        if !client.floating {
            ipc_dispatch(&format!("setfloating address:{}", window))?;
        }
        ipc_dispatch(&format!(
            "resizewindowpixel exact {} {},address:{}",
            rect.width, rect.height, window
        ))?;
        ipc_dispatch(&format!(
            "movewindowpixel exact {} {},address:{}",
            rect.x, rect.y, window
        ))?;
        debug!("{} -> {}", window, rect);
        Ok(())
    }

    fn focus_window(&self, window: WindowId) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("focuswindow address:{}", window))
    }
}

//  VirtualDesktops implementation

impl VirtualDesktops for HyprlandWm {
    type Error = HyprlandError;

    fn current_desktop(&self) -> Result<Option<DesktopId>, Self::Error> {
        Ok(active_monitors()?
            .iter()
            .find(|m| m.focused)
            .and_then(|m| m.active_workspace.desktop()))
    }

    fn visible_desktops(&self) -> Result<Vec<DesktopId>, Self::Error> {
        let mut shown: Vec<DesktopId> = active_monitors()?
            .iter()
            .filter(|m| !m.is_mirror())
            .filter_map(|m| m.active_workspace.desktop())
            .collect();
        shown.sort();
        shown.dedup();
        Ok(shown)
    }

    fn desktop_ids(&self) -> Result<Vec<DesktopId>, Self::Error> {
        let workspaces: Vec<WorkspaceRef> = ipc_json("workspaces")?;
        let mut ids: Vec<i64> = workspaces
            .into_iter()
            .map(|w| w.id)
            .filter(|&id| id > 0)
            .collect();
        ids.sort_unstable();
        Ok(ids.into_iter().map(DesktopId::from_workspace).collect())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MONITOR: &str = r#"{
        "id": 1, "name": "DP-2", "description": "Dell Inc. DELL U2720Q 8LXMZ13",
        "width": 3840, "height": 2160, "x": 1920, "y": 0, "scale": 2.0,
        "transform": 0, "reserved": [0, 30, 0, 0], "focused": true,
        "disabled": false, "mirrorOf": "none",
        "activeWorkspace": {"id": 3, "name": "3"}
    }"#;

    fn client_json(mapped: bool, hidden: bool) -> ClientJson {
        let json = format!(
            r#"{{"address": "0x55d0c1a4e2b0", "mapped": {}, "hidden": {},
                 "floating": false, "workspace": {{"id": 2, "name": "2"}},
                 "monitor": 0, "class": "firefox", "title": "Mozilla Firefox",
                 "focusHistoryID": 0}}"#,
            mapped, hidden
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn monitor_rect_is_scaled_and_reserved_space_removed() {
        let m: MonitorJson = serde_json::from_str(MONITOR).unwrap();
        let info = m.info();
        assert_eq!(info.id, MonitorId(1));
        assert_eq!(info.rect, Rect::new(1920, 0, 1920, 1080));
        assert_eq!(info.work_area, Rect::new(1920, 30, 1920, 1050));
        assert_eq!(info.device_id.as_deref(), Some("Dell Inc. DELL U2720Q 8LXMZ13"));
        assert_eq!(info.desktop, Some(DesktopId::from_workspace(3)));
        assert!(!info.mirroring);
    }

    #[test]
    fn special_workspace_on_monitor_is_no_desktop() {
        let json = MONITOR.replace(r#""activeWorkspace": {"id": 3"#, r#""activeWorkspace": {"id": -98"#);
        let m: MonitorJson = serde_json::from_str(&json).unwrap();
        assert_eq!(m.info().desktop, None);
    }

    #[test]
    fn rotated_monitor_swaps_dimensions() {
        let json = MONITOR.replace(r#""transform": 0"#, r#""transform": 1"#);
        let m: MonitorJson = serde_json::from_str(&json).unwrap();
        assert_eq!(m.rect(), Rect::new(1920, 0, 1080, 1920));
    }

    #[test]
    fn mirror_is_flagged() {
        let json = MONITOR.replace(r#""mirrorOf": "none""#, r#""mirrorOf": "eDP-1""#);
        let m: MonitorJson = serde_json::from_str(&json).unwrap();
        assert!(m.info().mirroring);
    }

    #[test]
    fn client_address_and_desktop() {
        let c = client_json(true, false);
        assert_eq!(c.id(), Some(WindowId(0x55d0c1a4e2b0)));
        assert_eq!(c.desktop(), Some(DesktopId::from_workspace(2)));
    }

    #[test]
    fn interesting_clients() {
        let none = ExcludedApps::default();
        assert!(client_json(true, false).is_interesting(&none));
        assert!(!client_json(true, false).is_interesting(&ExcludedApps::new(["FireFox"])));
        assert!(!client_json(true, true).is_interesting(&none));
        assert!(!client_json(false, false).is_interesting(&none));
    }

    #[test]
    fn scratchpad_windows_are_not_interesting() {
        let json = r#"{"address": "0x10", "mapped": true, "workspace": {"id": -98},
                       "monitor": 0, "class": "kitty"}"#;
        let c: ClientJson = serde_json::from_str(json).unwrap();
        assert!(!c.is_interesting(&ExcludedApps::default()));
        assert_eq!(c.desktop(), None);
    }
}
