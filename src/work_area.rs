//! One monitor on one virtual desktop, and the layout active there.

use crate::event::{Direction, MonitorId, MonitorInfo, WindowId};
use crate::geometry::{Point, Rect};
use crate::identity::WorkAreaIdentity;
use crate::layout::{ZoneIndexSet, ZoneLayout};
use crate::traits::{LayoutStore, WindowManager};
use log::debug;

/// A work area could not be constructed.
#[derive(Debug, thiserror::Error)]
pub enum WorkAreaError {
    #[error("monitor {0} has an empty rectangle")]
    EmptyMonitor(MonitorId),
    #[error("monitor {0} has an empty work area")]
    EmptyWorkArea(MonitorId),
}

/// The usable area of one monitor on the current virtual desktop.
///
/// Placement and cycling are no-ops while [`layout`](Self::layout) is
/// `None`.
#[derive(Debug, Clone)]
pub struct WorkArea {
    identity: WorkAreaIdentity,
    monitor: MonitorId,
    monitor_rect: Rect,
    work_rect: Rect,
    work_area_key: String,
    layout: Option<ZoneLayout>,
}

impl WorkArea {
    /// Construct the work area of `monitor` and calculate its layout.
    ///
    /// The identity is registered with `store` first.  When this is the
    /// first time the monitor is seen on this desktop and `parent` (the
    /// work area the monitor had before) is given, the parent's layout is
    /// copied over so a fresh desktop starts out like the previous one.
    pub fn new<S: LayoutStore>(
        monitor: &MonitorInfo,
        identity: WorkAreaIdentity,
        store: &mut S,
        parent: Option<&WorkArea>,
        new_work_area: bool,
    ) -> Result<Self, WorkAreaError> {
        if monitor.rect.is_empty() {
            return Err(WorkAreaError::EmptyMonitor(monitor.id));
        }
        if monitor.work_area.is_empty() {
            return Err(WorkAreaError::EmptyWorkArea(monitor.id));
        }

        store.add_device(&identity);
        if new_work_area {
            if let Some(parent) = parent {
                store.clone_descriptor(&parent.identity, &identity);
            }
        }

        let mut work_area = Self {
            work_area_key: format!("{}_{}", monitor.rect.width, monitor.rect.height),
            identity,
            monitor: monitor.id,
            monitor_rect: monitor.rect,
            work_rect: monitor.work_area,
            layout: None,
        };
        work_area.update_active_zone_set(store);
        Ok(work_area)
    }

    pub fn identity(&self) -> &WorkAreaIdentity {
        &self.identity
    }

    pub fn monitor(&self) -> MonitorId {
        self.monitor
    }

    pub fn monitor_rect(&self) -> Rect {
        self.monitor_rect
    }

    pub fn work_rect(&self) -> Rect {
        self.work_rect
    }

    /// `width_height` of the whole monitor.
    pub fn work_area_key(&self) -> &str {
        &self.work_area_key
    }

    /// `x_y_width_height` of the usable area, as handed to the editor.
    pub fn location(&self) -> String {
        let r = self.work_rect;
        format!("{}_{}_{}_{}", r.x, r.y, r.width, r.height)
    }

    pub fn layout(&self) -> Option<&ZoneLayout> {
        self.layout.as_ref()
    }

    pub fn layout_mut(&mut self) -> Option<&mut ZoneLayout> {
        self.layout.as_mut()
    }

    /// Whether the work area has at least one zone.
    pub fn is_active(&self) -> bool {
        self.layout.as_ref().is_some_and(|l| l.zone_count() > 0)
    }

    /// Re-derive the active layout from the store.
    ///
    /// Skipped while the store marks a different work area as active; an
    /// unknown or inert descriptor leaves the work area without a layout.
    pub fn update_active_zone_set<S: LayoutStore>(&mut self, store: &S) {
        if let Some(active) = store.active_identity() {
            if active != self.identity {
                return;
            }
        }
        self.layout = store
            .find_descriptor(&self.identity)
            .and_then(|d| ZoneLayout::from_descriptor(&d, self.work_rect));
        match &self.layout {
            Some(layout) => debug!(
                "{}: {:?} layout with {} zones",
                self.identity,
                layout.kind().layout_type(),
                layout.zone_count()
            ),
            None => debug!("{}: no active layout", self.identity),
        }
    }

    pub fn zones_from_point(&self, point: Point) -> ZoneIndexSet {
        self.layout
            .as_ref()
            .map(|l| l.zones_from_point(point))
            .unwrap_or_default()
    }

    pub fn zone_index_set_from_window(&self, window: WindowId) -> ZoneIndexSet {
        self.layout
            .as_ref()
            .map(|l| l.zone_index_set_from_window(window))
            .unwrap_or_default()
    }

    /// Commit `window` to the bounding rectangle of the zones in `set` and
    /// record the assignment.
    ///
    /// Returns `Ok(false)` without touching the window when there is no
    /// active layout or no index in `set` is valid.
    pub fn move_window_into_zone_by_index_set<W: WindowManager>(
        &mut self,
        wm: &W,
        window: WindowId,
        set: &ZoneIndexSet,
    ) -> Result<bool, W::Error> {
        let Some(layout) = self.layout.as_mut() else {
            return Ok(false);
        };
        let Some(rect) = layout.rect_for_index_set(set) else {
            return Ok(false);
        };
        wm.set_window_rect(window, rect)?;
        layout.assign_window(window, set.clone());
        Ok(true)
    }

    /// Move `window` one zone along `direction`.
    ///
    /// Wraps at the boundary when `cycle` is set; otherwise returns
    /// `Ok(false)` there without moving.
    pub fn move_window_into_zone_by_direction<W: WindowManager>(
        &mut self,
        wm: &W,
        window: WindowId,
        direction: Direction,
        cycle: bool,
    ) -> Result<bool, W::Error> {
        let next = self
            .layout
            .as_ref()
            .and_then(|l| l.next_index_set(window, direction, cycle));
        match next {
            Some(set) => self.move_window_into_zone_by_index_set(wm, window, &set),
            None => Ok(false),
        }
    }

    /// Forget `window` in this work area's layout.
    pub fn remove_window(&mut self, window: WindowId) {
        if let Some(layout) = self.layout.as_mut() {
            layout.remove_window(window);
        }
    }
}
