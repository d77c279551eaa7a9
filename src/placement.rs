//! Committing windows into zones.
//!
//! [`PlacementEngine`] resolves the work area a window belongs to, checks
//! that the window is still on that work area's virtual desktop, commits the
//! geometry and remembers the assignment twice: as an in-memory tag on the
//! window (restored by [`place_all`](PlacementEngine::place_all) after a
//! display change) and as the application's last zones in the store.

use crate::engine::{wm_error, EngineError};
use crate::event::{Direction, MonitorId, WindowId};
use crate::layout::ZoneIndexSet;
use crate::registry::WorkAreaRegistry;
use crate::traits::{LayoutStore, WindowManager, ZoneAssignment};
use crate::work_area::WorkArea;
use log::{debug, warn};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PlacementEngine {
    tags: HashMap<WindowId, ZoneIndexSet>,
}

impl PlacementEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The zones `window` was last committed to.
    pub fn tag(&self, window: WindowId) -> Option<&ZoneIndexSet> {
        self.tags.get(&window)
    }

    pub fn forget(&mut self, window: WindowId) {
        self.tags.remove(&window);
    }

    /// Commit `window` into `set` on `monitor`, or on the monitor the window
    /// is on when `monitor` is `None`.
    ///
    /// Returns `Ok(false)` without side effects when no work area is found,
    /// when the work area has no active layout, or when the window sits on
    /// a different virtual desktop than the work area.  A window whose
    /// desktop cannot be resolved is placed.
    pub fn place<W: WindowManager, S: LayoutStore>(
        &mut self,
        registry: &mut WorkAreaRegistry,
        wm: &W,
        store: &mut S,
        window: WindowId,
        monitor: Option<MonitorId>,
        set: &ZoneIndexSet,
    ) -> Result<bool, EngineError> {
        let target = match monitor {
            Some(m) => Some(m),
            None => wm.window_monitor(window).map_err(wm_error)?,
        };
        let Some(target) = target else {
            debug!("window {} is on no monitor", window);
            return Ok(false);
        };
        let Some(work_area) = registry.get_mut(target) else {
            debug!("no work area on monitor {}", target);
            return Ok(false);
        };

        if !on_work_area_desktop(wm, work_area, window)? {
            return Ok(false);
        }
        if !work_area
            .move_window_into_zone_by_index_set(wm, window, set)
            .map_err(wm_error)?
        {
            return Ok(false);
        }
        self.record(registry, wm, store, target, window)?;
        Ok(true)
    }

    /// Move `window` one zone along `direction` within its work area.
    ///
    /// With `across` unset the move wraps inside the work area.  With it
    /// set, a move past the last (or before the first) zone lands in the
    /// first (or last) zone of the next (or previous) monitor in sorted
    /// order.
    pub fn move_by_direction<W: WindowManager, S: LayoutStore>(
        &mut self,
        registry: &mut WorkAreaRegistry,
        wm: &W,
        store: &mut S,
        window: WindowId,
        direction: Direction,
        across: bool,
    ) -> Result<bool, EngineError> {
        let Some(monitor) = wm.window_monitor(window).map_err(wm_error)? else {
            return Ok(false);
        };
        let Some(work_area) = registry.get_mut(monitor) else {
            return Ok(false);
        };
        if !on_work_area_desktop(wm, work_area, window)? {
            return Ok(false);
        }
        if work_area
            .move_window_into_zone_by_direction(wm, window, direction, !across)
            .map_err(wm_error)?
        {
            self.record(registry, wm, store, monitor, window)?;
            return Ok(true);
        }
        if !across {
            return Ok(false);
        }

        let sorted = registry.sorted_monitors();
        let Some(pos) = sorted.iter().position(|m| *m == monitor) else {
            return Ok(false);
        };
        let n = sorted.len();
        let target = if direction.is_backward() {
            sorted[(pos + n - 1) % n]
        } else {
            sorted[(pos + 1) % n]
        };
        let zone_count = registry
            .get(target)
            .and_then(|wa| wa.layout())
            .map_or(0, |l| l.zone_count());
        if zone_count == 0 {
            return Ok(false);
        }
        let zone = if direction.is_backward() { zone_count - 1 } else { 0 };
        debug!("moving {} to monitor {} zone {}", window, target, zone);
        self.place(registry, wm, store, window, Some(target), &ZoneIndexSet::from([zone]))
    }

    /// Tag `window` with the zones it now occupies on `monitor` and store
    /// them as its application's last zones.
    fn record<W: WindowManager, S: LayoutStore>(
        &mut self,
        registry: &mut WorkAreaRegistry,
        wm: &W,
        store: &mut S,
        monitor: MonitorId,
        window: WindowId,
    ) -> Result<(), EngineError> {
        let Some(work_area) = registry.get(monitor) else {
            return Ok(());
        };
        let set = work_area.zone_index_set_from_window(window);
        let assignment = work_area.layout().map(|layout| ZoneAssignment {
            identity: work_area.identity().clone(),
            layout_id: layout.id(),
            zones: set.clone(),
        });
        registry.remove_window_elsewhere(monitor, window);
        self.tags.insert(window, set);
        if let (Some(assignment), Some(app)) = (assignment, wm.app_id(window).map_err(wm_error)?) {
            store.set_app_last_zones(&app, assignment);
        }
        Ok(())
    }

    /// Re-apply the tagged zones of every window the window manager still
    /// reports.  Windows that fail to place are skipped.  Returns how many
    /// were placed.
    pub fn place_all<W: WindowManager, S: LayoutStore>(
        &mut self,
        registry: &mut WorkAreaRegistry,
        wm: &W,
        store: &mut S,
    ) -> Result<usize, EngineError> {
        let windows = wm.windows().map_err(wm_error)?;
        self.tags.retain(|w, _| windows.contains(w));

        let mut placed = 0;
        for window in windows {
            let Some(set) = self.tags.get(&window).cloned() else {
                continue;
            };
            match self.place(registry, wm, store, window, None, &set) {
                Ok(true) => placed += 1,
                Ok(false) => {}
                Err(e) => warn!("could not restore window {}: {}", window, e),
            }
        }
        debug!("restored {} window(s)", placed);
        Ok(placed)
    }

    /// Put `window` back into the zones its application last used, if they
    /// were recorded for the work area and layout the window is on now.
    pub fn restore_app_last_zones<W: WindowManager, S: LayoutStore>(
        &mut self,
        registry: &mut WorkAreaRegistry,
        wm: &W,
        store: &mut S,
        window: WindowId,
    ) -> Result<bool, EngineError> {
        let Some(app) = wm.app_id(window).map_err(wm_error)? else {
            return Ok(false);
        };
        let Some(assignment) = store.app_last_zones(&app) else {
            return Ok(false);
        };
        let Some(monitor) = wm.window_monitor(window).map_err(wm_error)? else {
            return Ok(false);
        };
        let matches = registry.get(monitor).is_some_and(|wa| {
            wa.identity() == &assignment.identity
                && wa.layout().is_some_and(|l| l.id() == assignment.layout_id)
        });
        if !matches {
            return Ok(false);
        }
        debug!("restoring {} to zones {:?}", app, assignment.zones);
        self.place(registry, wm, store, window, Some(monitor), &assignment.zones)
    }
}

/// Whether `window` may be placed on `work_area`: true unless both
/// desktops are known and differ.
fn on_work_area_desktop<W: WindowManager>(
    wm: &W,
    work_area: &WorkArea,
    window: WindowId,
) -> Result<bool, EngineError> {
    let Some(area_desktop) = work_area.identity().desktop() else {
        return Ok(true);
    };
    match wm.window_desktop(window).map_err(wm_error)? {
        Some(window_desktop) if window_desktop != area_desktop => {
            debug!(
                "window {} is on desktop {}, not placing on {}",
                window, window_desktop, area_desktop
            );
            Ok(false)
        }
        _ => Ok(true),
    }
}
