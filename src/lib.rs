//! **hyprzones**: zone-based window placement.
//!
//! Every monitor on every virtual desktop is a *work area* with its own
//! zone layout (columns, rows, grid, priority grid, focus or a custom
//! canvas).  Snap hotkeys cycle the windows of a monitor through its zones,
//! recalculating the layout so there is exactly one zone per window; other
//! events move single windows between zones, restore where an application
//! was last placed, and keep everything consistent when monitors, work
//! areas or desktops change.
//!
//! # Architecture
//!
//! All state lives in a single [`engine::ZoneEngine`] that processes
//! [`event::Event`]s one at a time.  It depends only on the traits in
//! [`traits`]:
//!
//! * [`traits::WindowManager`]: enumerates monitors and windows and commits
//!   window geometry.
//! * [`traits::VirtualDesktops`]: reports the current and all live desktop
//!   ids.
//! * [`traits::LayoutStore`]: persists layout descriptors per work area and
//!   the zones applications were last placed in.
//! * [`traits::EventSource`]: delivers events from some transport.
//!
//! Concrete implementations live in [`hyprland`] (Hyprland IPC),
//! [`ipc`] (Unix-socket event listener), [`store`] (JSON snapshot) and
//! [`watcher`] (desktop polling thread).

pub mod config;
pub mod cycler;
pub mod editor;
pub mod engine;
pub mod event;
pub mod geometry;
pub mod hyprland;
pub mod identity;
pub mod ipc;
pub mod layout;
pub mod placement;
pub mod registry;
pub mod store;
pub mod traits;
pub mod watcher;
pub mod work_area;

#[cfg(test)]
mod testing;
