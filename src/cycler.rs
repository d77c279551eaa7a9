//! Snap-hotkey cycling of windows through zones.
//!
//! A cycle step on a monitor:
//!
//! 1. collect the interesting windows on that monitor and the virtual
//!    desktop it shows, in window-manager order;
//! 2. if their number differs from the zone count, recalculate the layout
//!    for that many zones and forget all assignments;
//! 3. step every assigned window one zone along the hotkey direction
//!    (unassigned windows start at zone 0), resolving collisions by
//!    stepping further in the same direction;
//! 4. commit every window to its slot and focus the window in slot 0.
//!
//! With more than one monitor and cross-monitor moves enabled, a monitor
//! without interesting windows hands the step over to the next (or
//! previous) monitor in sorted order until the traversal comes back around.

use crate::config::Settings;
use crate::engine::{wm_error, EngineError};
use crate::event::{Direction, MonitorId, WindowId};
use crate::layout::ZoneIndexSet;
use crate::placement::PlacementEngine;
use crate::registry::WorkAreaRegistry;
use crate::traits::{LayoutStore, WindowManager};
use log::{debug, info, warn};

/// What the cycler did last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleMode {
    /// No slots are tracked.
    #[default]
    Idle,
    /// Slots are tracked for one monitor, cycled on its own.
    CyclingSingleMonitor,
    /// Slots are tracked for the monitor a cross-monitor traversal ended on.
    CyclingCrossMonitor,
}

/// Everything a cycle step operates on, borrowed from the engine for the
/// duration of one event.
pub struct CycleContext<'a, W, S> {
    pub registry: &'a mut WorkAreaRegistry,
    pub placement: &'a mut PlacementEngine,
    pub wm: &'a W,
    pub store: &'a mut S,
    pub settings: &'a Settings,
}

/// Wrap-around step: backward directions decrement, forward ones increment.
pub fn next_index(direction: Direction, index: usize, count: usize) -> usize {
    if direction.is_backward() {
        if index == 0 {
            count - 1
        } else {
            index - 1
        }
    } else if index + 1 >= count {
        0
    } else {
        index + 1
    }
}

#[derive(Debug, Default)]
pub struct HotkeyCycler {
    mode: CycleMode,
    monitor: Option<MonitorId>,
    /// Window in each slot; slot `i` is zone `i` of `monitor`'s layout.
    slots: Vec<WindowId>,
}

impl HotkeyCycler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> CycleMode {
        self.mode
    }

    pub fn slots(&self) -> &[WindowId] {
        &self.slots
    }

    pub fn monitor(&self) -> Option<MonitorId> {
        self.monitor
    }

    /// Forget all tracked slots, e.g. after the work areas were rebuilt.
    pub fn reset(&mut self) {
        self.mode = CycleMode::Idle;
        self.monitor = None;
        self.slots.clear();
    }

    /// Handle a snap hotkey.  Returns whether any window was committed.
    pub fn on_snap_hotkey<W: WindowManager, S: LayoutStore>(
        &mut self,
        ctx: &mut CycleContext<'_, W, S>,
        direction: Direction,
    ) -> Result<bool, EngineError> {
        let Some(current) = self.current_monitor(ctx)? else {
            debug!("snap {}: no monitor in focus", direction);
            return Ok(false);
        };

        let sorted = ctx.registry.sorted_monitors();
        if sorted.len() > 1 && ctx.settings.move_window_across_monitors {
            let Some(start) = sorted.iter().position(|m| *m == current) else {
                debug!("snap {}: monitor {} has no zones", direction, current);
                return Ok(false);
            };
            let n = sorted.len();
            for step in 0..n {
                let index = if direction.is_backward() {
                    (start + n - step) % n
                } else {
                    (start + step) % n
                };
                if self.cycle(ctx, sorted[index], direction)? {
                    self.mode = CycleMode::CyclingCrossMonitor;
                    return Ok(true);
                }
            }
            debug!("snap {}: no monitor has windows to cycle", direction);
            Ok(false)
        } else if direction == Direction::Left {
            self.promote_foreground(ctx, current)
        } else {
            let cycled = self.cycle(ctx, current, direction)?;
            if cycled {
                self.mode = CycleMode::CyclingSingleMonitor;
            }
            Ok(cycled)
        }
    }

    /// Re-commit the windows of `monitor` to their slots, reassigning them
    /// all when the window count no longer matches the zone count.  Used
    /// when a window appears.
    pub fn settle<W: WindowManager, S: LayoutStore>(
        &mut self,
        ctx: &mut CycleContext<'_, W, S>,
        monitor: MonitorId,
    ) -> Result<bool, EngineError> {
        let windows = interesting_windows(ctx, monitor)?;
        if windows.is_empty() {
            return Ok(false);
        }
        let Some(zone_count) = zone_count(ctx.registry, monitor) else {
            return Ok(false);
        };
        if zone_count != windows.len() {
            return self.cycle(ctx, monitor, Direction::Down);
        }
        let slots = self.slots_for(ctx, monitor, &windows);
        self.commit(ctx, monitor, slots);
        Ok(true)
    }

    /// Grow (`Right`) or shrink (any other direction) the main zone of the
    /// foreground window's monitor and re-commit its slots.
    pub fn on_width_hotkey<W: WindowManager, S: LayoutStore>(
        &mut self,
        ctx: &mut CycleContext<'_, W, S>,
        direction: Direction,
    ) -> Result<bool, EngineError> {
        let Some(window) = ctx.wm.foreground_window().map_err(wm_error)? else {
            return Ok(false);
        };
        if !ctx
            .wm
            .is_interesting(window, &ctx.settings.excluded_apps)
            .map_err(wm_error)?
        {
            return Ok(false);
        }
        let Some(monitor) = ctx.wm.window_monitor(window).map_err(wm_error)? else {
            return Ok(false);
        };

        let windows = interesting_windows(ctx, monitor)?;
        let slots = self.slots_for(ctx, monitor, &windows);
        let Some(work_area) = ctx.registry.get_mut(monitor) else {
            return Ok(false);
        };
        let area = work_area.work_rect();
        let Some(layout) = work_area.layout_mut() else {
            return Ok(false);
        };
        if !layout.change_main_zone_width(direction == Direction::Right) {
            debug!("width {}: main zone unchanged", direction);
            return Ok(false);
        }
        let count = if slots.is_empty() {
            layout.zone_count()
        } else {
            slots.len()
        };
        let spacing = layout.spacing();
        layout.kill();
        layout.calculate(area, count as i32, spacing);
        info!(
            "width {}: main zone at {}% on monitor {}",
            direction,
            layout.main_ratio(),
            monitor
        );
        self.commit(ctx, monitor, slots);
        Ok(true)
    }

    /// The monitor of the foreground window if it is interesting, otherwise
    /// the focused monitor.
    fn current_monitor<W: WindowManager, S>(
        &self,
        ctx: &CycleContext<'_, W, S>,
    ) -> Result<Option<MonitorId>, EngineError> {
        if let Some(window) = ctx.wm.foreground_window().map_err(wm_error)? {
            if ctx
                .wm
                .is_interesting(window, &ctx.settings.excluded_apps)
                .map_err(wm_error)?
            {
                if let Some(monitor) = ctx.wm.window_monitor(window).map_err(wm_error)? {
                    return Ok(Some(monitor));
                }
            }
        }
        ctx.wm.active_monitor().map_err(wm_error)
    }

    /// One cycle step on `monitor`.  Returns `false` when the monitor has no
    /// interesting windows or no active layout.
    fn cycle<W: WindowManager, S: LayoutStore>(
        &mut self,
        ctx: &mut CycleContext<'_, W, S>,
        monitor: MonitorId,
        direction: Direction,
    ) -> Result<bool, EngineError> {
        let windows = interesting_windows(ctx, monitor)?;
        if windows.is_empty() {
            return Ok(false);
        }
        let Some(work_area) = ctx.registry.get_mut(monitor) else {
            return Ok(false);
        };
        let area = work_area.work_rect();
        let Some(layout) = work_area.layout_mut() else {
            return Ok(false);
        };

        let count = windows.len();
        if layout.zone_count() != count {
            debug!(
                "monitor {}: {} window(s) for {} zone(s), recalculating",
                monitor,
                count,
                layout.zone_count()
            );
            let spacing = layout.spacing();
            layout.kill();
            layout.calculate(area, count as i32, spacing);
            layout.clear_assignments();
        }
        if layout.zone_count() != count {
            warn!("monitor {}: layout cannot hold {} zones", monitor, count);
            return Ok(false);
        }

        let mut taken: Vec<Option<WindowId>> = vec![None; count];
        for &window in &windows {
            let current = layout
                .zone_index_set_from_window(window)
                .first()
                .copied()
                .filter(|&i| i < count);
            let mut index = match current {
                Some(i) => next_index(direction, i, count),
                None => 0,
            };
            while taken[index].is_some() {
                index = next_index(direction, index, count);
            }
            taken[index] = Some(window);
        }
        let slots: Vec<WindowId> = taken.into_iter().flatten().collect();

        self.commit(ctx, monitor, slots);
        if let Some(&first) = self.slots.first() {
            ctx.wm.focus_window(first).map_err(wm_error)?;
        }
        Ok(true)
    }

    /// Left hotkey without cross-monitor cycling: swap the foreground window
    /// into slot 0 and settle.
    fn promote_foreground<W: WindowManager, S: LayoutStore>(
        &mut self,
        ctx: &mut CycleContext<'_, W, S>,
        monitor: MonitorId,
    ) -> Result<bool, EngineError> {
        let windows = interesting_windows(ctx, monitor)?;
        if windows.is_empty() || zone_count(ctx.registry, monitor).is_none() {
            return Ok(false);
        }
        if zone_count(ctx.registry, monitor) != Some(windows.len()) {
            self.cycle(ctx, monitor, Direction::Down)?;
        }
        let mut slots = self.slots_for(ctx, monitor, &windows);
        if let Some(foreground) = ctx.wm.foreground_window().map_err(wm_error)? {
            if let Some(pos) = slots.iter().position(|w| *w == foreground) {
                slots.swap(0, pos);
            }
        }
        self.commit(ctx, monitor, slots);
        self.mode = CycleMode::CyclingSingleMonitor;
        Ok(true)
    }

    /// The tracked slots of `monitor` restricted to `windows`, with windows
    /// not tracked yet appended.  Without tracked slots for the monitor the
    /// order comes from the layout's recorded assignments.
    fn slots_for<W, S>(
        &self,
        ctx: &CycleContext<'_, W, S>,
        monitor: MonitorId,
        windows: &[WindowId],
    ) -> Vec<WindowId> {
        let mut slots: Vec<WindowId> = if self.monitor == Some(monitor) {
            self.slots
                .iter()
                .copied()
                .filter(|w| windows.contains(w))
                .collect()
        } else {
            let mut assigned: Vec<(usize, WindowId)> = ctx
                .registry
                .get(monitor)
                .and_then(|wa| wa.layout())
                .map(|layout| {
                    windows
                        .iter()
                        .filter_map(|&w| {
                            layout
                                .zone_index_set_from_window(w)
                                .first()
                                .map(|&i| (i, w))
                        })
                        .collect()
                })
                .unwrap_or_default();
            assigned.sort();
            assigned.into_iter().map(|(_, w)| w).collect()
        };
        for &window in windows {
            if !slots.contains(&window) {
                slots.push(window);
            }
        }
        slots
    }

    /// Place slot `i` into zone `i` and remember the slots.  A window that
    /// fails to place is skipped and the rest of the pass still runs.
    fn commit<W: WindowManager, S: LayoutStore>(
        &mut self,
        ctx: &mut CycleContext<'_, W, S>,
        monitor: MonitorId,
        slots: Vec<WindowId>,
    ) {
        for (index, &window) in slots.iter().enumerate() {
            let placed = ctx.placement.place(
                ctx.registry,
                ctx.wm,
                ctx.store,
                window,
                Some(monitor),
                &ZoneIndexSet::from([index]),
            );
            if let Err(e) = placed {
                warn!("could not place window {} in zone {}: {}", window, index, e);
            }
        }
        debug!("monitor {} slots: {:?}", monitor, slots);
        self.monitor = Some(monitor);
        self.slots = slots;
    }
}

fn zone_count(registry: &WorkAreaRegistry, monitor: MonitorId) -> Option<usize> {
    registry
        .get(monitor)
        .and_then(|wa| wa.layout())
        .map(|l| l.zone_count())
}

/// Interesting windows on `monitor` and the desktop its work area shows, in
/// window manager order.  Windows whose queries fail are skipped.
fn interesting_windows<W: WindowManager, S>(
    ctx: &CycleContext<'_, W, S>,
    monitor: MonitorId,
) -> Result<Vec<WindowId>, EngineError> {
    let area_desktop = ctx
        .registry
        .get(monitor)
        .and_then(|wa| wa.identity().desktop());
    let mut windows = Vec::new();
    for window in ctx.wm.windows().map_err(wm_error)? {
        let eligible = (|| -> Result<bool, W::Error> {
            if !ctx.wm.is_interesting(window, &ctx.settings.excluded_apps)? {
                return Ok(false);
            }
            if ctx.wm.window_monitor(window)? != Some(monitor) {
                return Ok(false);
            }
            Ok(match (area_desktop, ctx.wm.window_desktop(window)?) {
                (Some(shown), Some(desktop)) => shown == desktop,
                _ => true,
            })
        })();
        match eligible {
            Ok(true) => windows.push(window),
            Ok(false) => {}
            Err(e) => warn!("skipping window {}: {}", window, e),
        }
    }
    Ok(windows)
}
