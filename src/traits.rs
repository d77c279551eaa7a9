//! Core traits that decouple hyprzones from any specific window manager,
//! desktop provider, persistence backend or transport mechanism.
//!
//! Every concrete backend (Hyprland, a Unix-socket listener, a test harness,
//! …) implements one of these traits.  The [`ZoneEngine`](crate::engine::ZoneEngine)
//! only depends on these abstractions.

use crate::config::ExcludedApps;
use crate::event::{Event, MonitorId, MonitorInfo, WindowId};
use crate::geometry::Rect;
use crate::identity::{DesktopId, WorkAreaIdentity};
use crate::layout::{LayoutDescriptor, ZoneIndexSet};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use uuid::Uuid;

/// Abstraction over a window manager that can enumerate monitors and
/// windows and move windows around.
///
/// An implementation might talk to Hyprland via IPC, or it might be a
/// recording stub used in tests.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// Return the monitors the window manager knows about, in enumeration
    /// order.
    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error>;

    /// Return all top-level windows in a stable enumeration order.
    fn windows(&self) -> Result<Vec<WindowId>, Self::Error>;

    /// Whether `window` is eligible for zone placement: visible, a regular
    /// application window, and not matched by `excluded`.
    fn is_interesting(&self, window: WindowId, excluded: &ExcludedApps)
        -> Result<bool, Self::Error>;

    /// Stable application identity of `window` (its class or executable),
    /// used to remember zones across window instances.
    fn app_id(&self, window: WindowId) -> Result<Option<String>, Self::Error>;

    /// The monitor `window` is currently on.
    fn window_monitor(&self, window: WindowId) -> Result<Option<MonitorId>, Self::Error>;

    /// The virtual desktop `window` belongs to, `None` if unknown.
    fn window_desktop(&self, window: WindowId) -> Result<Option<DesktopId>, Self::Error>;

    /// The window that has input focus, if any.
    fn foreground_window(&self) -> Result<Option<WindowId>, Self::Error>;

    /// The monitor that has focus, if any.
    fn active_monitor(&self) -> Result<Option<MonitorId>, Self::Error>;

    /// Move and resize `window` to exactly `rect`.
    fn set_window_rect(&self, window: WindowId, rect: Rect) -> Result<(), Self::Error>;

    /// Give `window` input focus.
    fn focus_window(&self, window: WindowId) -> Result<(), Self::Error>;
}

/// Provider of virtual desktop ids.
///
/// Only the ids matter; how they are enumerated is up to the backend.
pub trait VirtualDesktops {
    type Error: std::error::Error + Send + 'static;

    /// The desktop currently shown, `None` if it cannot be resolved.
    fn current_desktop(&self) -> Result<Option<DesktopId>, Self::Error>;

    /// Every live desktop id.  The first entry is the primary desktop.
    fn desktop_ids(&self) -> Result<Vec<DesktopId>, Self::Error>;

    /// Desktops on screen, sorted.  Backends that show one desktop per
    /// monitor report all of them, so moving focus between monitors is not
    /// a desktop switch.
    fn visible_desktops(&self) -> Result<Vec<DesktopId>, Self::Error> {
        Ok(self.current_desktop()?.into_iter().collect())
    }
}

/// Where a window was last placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneAssignment {
    pub identity: WorkAreaIdentity,
    pub layout_id: Uuid,
    pub zones: ZoneIndexSet,
}

/// Persisted layout descriptors and window zone history.
///
/// The engine owns its store and is the only caller, so mutation goes
/// through `&mut self`.  Only [`save_all`](LayoutStore::save_all) touches
/// the backing medium and can fail.
pub trait LayoutStore {
    type Error: std::error::Error + Send + 'static;

    /// The active layout of the work area with `identity`.
    fn find_descriptor(&self, identity: &WorkAreaIdentity) -> Option<LayoutDescriptor>;

    /// Make `identity` known, seeding the default layout if it was not.
    fn add_device(&mut self, identity: &WorkAreaIdentity);

    /// Mark the work area whose layout is being worked on.
    fn set_active_identity(&mut self, identity: WorkAreaIdentity);

    fn active_identity(&self) -> Option<WorkAreaIdentity>;

    /// Copy the layout of `from` to `to`.  Returns whether `from` had one.
    fn clone_descriptor(&mut self, from: &WorkAreaIdentity, to: &WorkAreaIdentity) -> bool;

    /// Delete everything recorded for `desktop`.  Returns whether anything
    /// was removed.
    fn remove_desktop(&mut self, desktop: DesktopId) -> bool;

    /// Move data recorded without a desktop id onto `primary`.
    fn update_primary_desktop(&mut self, primary: DesktopId);

    /// Delete data of every desktop not in `live`.
    fn remove_deleted_desktops(&mut self, live: &[DesktopId]);

    /// Remember where windows of `app` were last placed.
    fn set_app_last_zones(&mut self, app: &str, assignment: ZoneAssignment);

    fn app_last_zones(&self, app: &str) -> Option<ZoneAssignment>;

    /// Flush everything to the backing medium.
    fn save_all(&self) -> Result<(), Self::Error>;

    /// Re-read descriptors written by an external editor.
    fn reload(&mut self) -> Result<(), Self::Error>;
}

//  Event Source

/// A source of [`Event`]s.
///
/// Implementations listen on some transport (a Unix socket, Hyprland's
/// IPC event stream, an in-memory channel) and forward parsed events
/// into the provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received event must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Event`] into `sink`.
    ///
    /// This method blocks the calling thread.  To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Direction, DisplayChangeKind};
    use std::sync::mpsc;

    #[derive(Debug, thiserror::Error)]
    #[error("mock error")]
    struct MockError;

    /// A test double that emits a fixed sequence of events.
    struct MockSource {
        events: Vec<Event>,
    }

    impl EventSource for MockSource {
        type Error = MockError;

        fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), MockError> {
            for event in self.events.drain(..) {
                let _ = sink.send(event);
            }
            Ok(())
        }
    }

    #[test]
    fn mock_source_emits_events_in_order() {
        let mut src = MockSource {
            events: vec![
                Event::DisplayChanged(DisplayChangeKind::Initialization),
                Event::SnapHotkey(Direction::Down),
            ],
        };
        let (tx, rx) = mpsc::channel();
        src.run(tx).unwrap();
        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                Event::DisplayChanged(DisplayChangeKind::Initialization),
                Event::SnapHotkey(Direction::Down),
            ]
        );
    }

    #[test]
    fn zone_assignment_serializes_identity_as_key() {
        let identity: WorkAreaIdentity = "DEV_1920_1080_{8A0B1D6E-4C2F-4E2A-9C1D-2B5E7F9A3C4D}"
            .parse()
            .unwrap();
        let assignment = ZoneAssignment {
            identity,
            layout_id: Uuid::nil(),
            zones: [0, 2].into_iter().collect(),
        };
        let json = serde_json::to_value(&assignment).unwrap();
        assert_eq!(
            json["identity"],
            "DEV_1920_1080_{8A0B1D6E-4C2F-4E2A-9C1D-2B5E7F9A3C4D}"
        );
        assert_eq!(json["zones"], serde_json::json!([0, 2]));
    }
}
