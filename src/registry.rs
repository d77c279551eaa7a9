//! The set of live work areas, one per monitor.
//!
//! The registry is rebuilt wholesale on every [`enumerate`](WorkAreaRegistry::enumerate).
//! Besides the live work areas it keeps the "processed" bookkeeping: which
//! monitors have ever been initialised on which desktop.  That is only used
//! to tell a brand-new work area (whose layout may be cloned from the
//! monitor's previous one) from one seen before.

use crate::event::{MonitorId, MonitorInfo, WindowId};
use crate::identity::{DesktopId, WorkAreaIdentity};
use crate::traits::LayoutStore;
use crate::work_area::WorkArea;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
pub struct WorkAreaRegistry {
    work_areas: BTreeMap<MonitorId, WorkArea>,
    processed: HashMap<DesktopId, Vec<MonitorId>>,
    current_desktop: Option<DesktopId>,
}

impl WorkAreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_desktop(&self) -> Option<DesktopId> {
        self.current_desktop
    }

    pub fn set_current_desktop(&mut self, desktop: Option<DesktopId>) {
        self.current_desktop = desktop;
    }

    /// Whether `monitor` has never been initialised on `desktop`.
    pub fn is_new_work_area(&self, desktop: DesktopId, monitor: MonitorId) -> bool {
        self.processed
            .get(&desktop)
            .map_or(true, |monitors| !monitors.contains(&monitor))
    }

    /// Record `monitor` as initialised on `desktop`.
    pub fn register_new_work_area(&mut self, desktop: DesktopId, monitor: MonitorId) {
        let monitors = self.processed.entry(desktop).or_default();
        if !monitors.contains(&monitor) {
            monitors.push(monitor);
        }
    }

    /// Desktops with processed bookkeeping.
    pub fn processed_desktops(&self) -> impl Iterator<Item = DesktopId> + '_ {
        self.processed.keys().copied()
    }

    /// Rebuild all work areas from `monitors`.
    ///
    /// Each monitor is keyed on the desktop it shows, falling back to the
    /// current desktop.  The previous work areas are taken out first and
    /// serve as the parents new work areas clone their layout from, so
    /// construction never looks back into the registry.  Mirroring monitors
    /// are skipped.  A monitor whose work area cannot be built keeps the
    /// work area it had before, if any.  Returns the number of work areas.
    pub fn enumerate<S: LayoutStore>(
        &mut self,
        monitors: &[MonitorInfo],
        store: &mut S,
    ) -> Result<usize, S::Error> {
        let mut previous = std::mem::take(&mut self.work_areas);

        for monitor in monitors {
            if monitor.mirroring {
                debug!("skipping mirroring monitor {}", monitor.id);
                continue;
            }
            let shown = monitor.desktop.or(self.current_desktop);
            let desktop = shown.unwrap_or(DesktopId::EMPTY);
            let identity = WorkAreaIdentity::derive(
                monitor,
                monitor.device_id.as_deref().unwrap_or_default(),
                shown,
            );
            let new_work_area = self.is_new_work_area(desktop, monitor.id);
            store.set_active_identity(identity.clone());

            let built = WorkArea::new(
                monitor,
                identity,
                store,
                previous.get(&monitor.id),
                new_work_area,
            );
            match built {
                Ok(work_area) => {
                    if new_work_area {
                        self.register_new_work_area(desktop, monitor.id);
                    }
                    debug!("monitor {} on desktop {}", monitor.id, desktop);
                    self.work_areas.insert(monitor.id, work_area);
                }
                Err(e) => {
                    warn!("cannot build work area of monitor {}: {}", monitor.id, e);
                    if let Some(kept) = previous.remove(&monitor.id) {
                        self.work_areas.insert(monitor.id, kept);
                    }
                }
            }
        }

        info!(
            "{} work area(s), current desktop {}",
            self.work_areas.len(),
            self.current_desktop.unwrap_or(DesktopId::EMPTY)
        );
        store.save_all()?;
        Ok(self.work_areas.len())
    }

    /// Drop processed bookkeeping and stored data of desktops not in `live`.
    ///
    /// Desktops in `live` that were never processed stay unregistered until
    /// they are first enumerated.  Returns whether anything was removed.
    pub fn prune_stale_virtual_desktops<S: LayoutStore>(
        &mut self,
        live: &[DesktopId],
        store: &mut S,
    ) -> bool {
        let stale: Vec<DesktopId> = self
            .processed
            .keys()
            .filter(|d| !live.contains(d))
            .copied()
            .collect();
        let mut modified = false;
        for desktop in stale {
            info!("desktop {} is gone", desktop);
            self.processed.remove(&desktop);
            modified |= store.remove_desktop(desktop);
        }
        modified
    }

    /// Re-read every work area's layout from the store.
    pub fn update_active_zone_sets<S: LayoutStore>(&mut self, store: &S) {
        for work_area in self.work_areas.values_mut() {
            work_area.update_active_zone_set(store);
        }
    }

    pub fn get(&self, monitor: MonitorId) -> Option<&WorkArea> {
        self.work_areas.get(&monitor)
    }

    pub fn get_mut(&mut self, monitor: MonitorId) -> Option<&mut WorkArea> {
        self.work_areas.get_mut(&monitor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkArea> {
        self.work_areas.values()
    }

    /// Forget `window` in every work area except the one on `keep`.
    pub fn remove_window_elsewhere(&mut self, keep: MonitorId, window: WindowId) {
        for (monitor, work_area) in self.work_areas.iter_mut() {
            if *monitor != keep {
                work_area.remove_window(window);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.work_areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.work_areas.is_empty()
    }

    /// Monitors with an active layout, ordered left to right and then top
    /// to bottom.
    pub fn sorted_monitors(&self) -> Vec<MonitorId> {
        let mut active: Vec<&WorkArea> = self.work_areas.values().filter(|w| w.is_active()).collect();
        active.sort_by_key(|w| {
            let r = w.monitor_rect();
            (r.left(), r.top(), w.monitor())
        });
        active.into_iter().map(|w| w.monitor()).collect()
    }
}
