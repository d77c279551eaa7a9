//! The dispatcher that ties work areas, placement and cycling together.
//!
//! [`ZoneEngine`] owns the collaborators and all zone state, and reacts to
//! [`Event`]s one at a time.  The work-area registry sits behind a single
//! reader/writer lock: event handlers take the write lock once and pass the
//! guarded registry down explicitly, while read-only queries such as
//! [`zones_from_point`](ZoneEngine::zones_from_point) take the read lock.

use crate::config::Settings;
use crate::cycler::{CycleContext, HotkeyCycler};
use crate::editor::{EditorCommand, EditorRequest};
use crate::event::{Direction, DisplayChangeKind, EditorExitKind, Event, MonitorId, WindowId};
use crate::geometry::Point;
use crate::identity::DesktopId;
use crate::layout::{ZoneIndexSet, ZoneLayout};
use crate::placement::PlacementEngine;
use crate::registry::WorkAreaRegistry;
use crate::traits::{LayoutStore, VirtualDesktops, WindowManager};
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use std::sync::{mpsc, Arc};

/// Possible errors from the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The window manager returned an error.
    #[error("window manager error: {0}")]
    WindowManager(String),
    /// The virtual desktop provider returned an error.
    #[error("virtual desktop error: {0}")]
    Desktops(String),
    /// The layout store returned an error.
    #[error("layout store error: {0}")]
    Store(String),
}

pub(crate) fn wm_error<E: std::error::Error>(e: E) -> EngineError {
    EngineError::WindowManager(e.to_string())
}

fn desktops_error<E: std::error::Error>(e: E) -> EngineError {
    EngineError::Desktops(e.to_string())
}

fn store_error<E: std::error::Error>(e: E) -> EngineError {
    EngineError::Store(e.to_string())
}

/// Orchestrates work areas, placement and hotkey cycling.
///
/// Generic over its collaborators, so it is independent of Hyprland or
/// any other backend.
///
/// # Typical usage
///
/// ```ignore
/// let mut engine = ZoneEngine::new(wm, desktops, store, config.settings);
/// engine.handle(Event::DisplayChanged(DisplayChangeKind::Initialization))?;
/// engine.handle(Event::SnapHotkey(Direction::Down))?;
/// ```
pub struct ZoneEngine<W: WindowManager, D: VirtualDesktops, S: LayoutStore> {
    wm: W,
    desktops: D,
    store: S,
    settings: Settings,
    registry: Arc<RwLock<WorkAreaRegistry>>,
    placement: PlacementEngine,
    cycler: HotkeyCycler,
    editor_tx: Option<mpsc::Sender<EditorCommand>>,
    editor_open: bool,
}

impl<W: WindowManager, D: VirtualDesktops, S: LayoutStore> ZoneEngine<W, D, S> {
    /// Create an engine with no work areas.  Send
    /// `DisplayChanged(Initialization)` to build them.
    pub fn new(wm: W, desktops: D, store: S, settings: Settings) -> Self {
        Self {
            wm,
            desktops,
            store,
            settings,
            registry: Arc::new(RwLock::new(WorkAreaRegistry::new())),
            placement: PlacementEngine::new(),
            cycler: HotkeyCycler::new(),
            editor_tx: None,
            editor_open: false,
        }
    }

    /// Attach the channel editor commands are sent to.
    pub fn set_editor(&mut self, tx: mpsc::Sender<EditorCommand>) {
        self.editor_tx = Some(tx);
    }

    /// Shared handle to the registry, for readers on other threads.
    pub fn registry(&self) -> Arc<RwLock<WorkAreaRegistry>> {
        Arc::clone(&self.registry)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn wm(&self) -> &W {
        &self.wm
    }

    pub fn cycler(&self) -> &HotkeyCycler {
        &self.cycler
    }

    pub fn is_editor_open(&self) -> bool {
        self.editor_open
    }

    /// Zones of `monitor`'s work area containing `point`.
    pub fn zones_from_point(&self, monitor: MonitorId, point: Point) -> ZoneIndexSet {
        self.registry
            .read()
            .get(monitor)
            .map(|wa| wa.zones_from_point(point))
            .unwrap_or_default()
    }

    /// A copy of the active layout on `monitor`.
    pub fn layout(&self, monitor: MonitorId) -> Option<ZoneLayout> {
        self.registry
            .read()
            .get(monitor)
            .and_then(|wa| wa.layout().cloned())
    }

    /// Monitors with a work area, in sorted order.
    pub fn monitors(&self) -> Vec<MonitorId> {
        self.registry.read().sorted_monitors()
    }

    /// Process events until every sender is gone.  Errors are logged and do
    /// not stop the loop.
    pub fn run(&mut self, events: mpsc::Receiver<Event>) {
        info!("hyprzones running");
        for event in events {
            if let Err(e) = self.handle(event) {
                error!("event error: {}", e);
            }
        }
        info!("all event sources closed, exiting");
    }

    /// Process a single [`Event`].
    pub fn handle(&mut self, event: Event) -> Result<(), EngineError> {
        match event {
            Event::DisplayChanged(kind) => {
                info!("display changed: {}", kind);
                self.on_display_change(kind)?;
            }

            Event::VirtualDesktopsUpdated => {
                debug!("virtual desktops updated");
                self.on_virtual_desktops_updated()?;
            }

            Event::WindowCreated(window) => {
                debug!("window created: {}", window);
                self.on_window_created(window)?;
            }

            Event::SnapHotkey(direction) => {
                if !self.settings.override_snap_hotkeys {
                    debug!("snap {} ignored, snap hotkeys not overridden", direction);
                    return Ok(());
                }
                info!("snap {}", direction);
                let registry = Arc::clone(&self.registry);
                let mut registry = registry.write();
                let mut ctx = CycleContext {
                    registry: &mut registry,
                    placement: &mut self.placement,
                    wm: &self.wm,
                    store: &mut self.store,
                    settings: &self.settings,
                };
                self.cycler.on_snap_hotkey(&mut ctx, direction)?;
            }

            Event::WidthHotkey(direction) => {
                info!("width {}", direction);
                let registry = Arc::clone(&self.registry);
                let mut registry = registry.write();
                let mut ctx = CycleContext {
                    registry: &mut registry,
                    placement: &mut self.placement,
                    wm: &self.wm,
                    store: &mut self.store,
                    settings: &self.settings,
                };
                self.cycler.on_width_hotkey(&mut ctx, direction)?;
            }

            Event::MoveWindow(direction) => {
                info!("move window {}", direction);
                self.on_move_window(direction)?;
            }

            Event::ToggleEditor => {
                info!("toggle editor");
                self.toggle_editor()?;
            }

            Event::EditorExit(kind) => {
                info!("editor exited ({:?})", kind);
                self.on_editor_exit(kind)?;
            }

            Event::SettingsChanged(settings) => {
                info!("settings changed");
                self.settings = settings;
            }
        }
        Ok(())
    }

    fn on_display_change(&mut self, kind: DisplayChangeKind) -> Result<(), EngineError> {
        let registry = Arc::clone(&self.registry);
        let mut registry = registry.write();

        if matches!(
            kind,
            DisplayChangeKind::Initialization | DisplayChangeKind::VirtualDesktopSwitch
        ) {
            let current = match self.desktops.current_desktop() {
                Ok(current) => current,
                Err(e) => {
                    warn!("cannot resolve current desktop, keeping the previous one: {}", e);
                    registry.current_desktop()
                }
            };
            debug!(
                "current desktop: {}",
                current.unwrap_or(DesktopId::EMPTY)
            );
            registry.set_current_desktop(current);

            if kind == DisplayChangeKind::Initialization {
                match self.desktops.desktop_ids() {
                    Ok(ids) => {
                        if let Some(&primary) = ids.first() {
                            self.store.update_primary_desktop(primary);
                        }
                        self.store.remove_deleted_desktops(&ids);
                        registry.prune_stale_virtual_desktops(&ids, &mut self.store);
                    }
                    Err(e) => warn!("cannot list desktops: {}", e),
                }
            }
        }

        let monitors = self.wm.monitors().map_err(wm_error)?;
        registry
            .enumerate(&monitors, &mut self.store)
            .map_err(store_error)?;
        self.cycler.reset();

        if matches!(
            kind,
            DisplayChangeKind::DisplayChange | DisplayChangeKind::WorkAreaChange
        ) && self.settings.display_change_move_windows
        {
            self.placement
                .place_all(&mut registry, &self.wm, &mut self.store)?;
        }
        Ok(())
    }

    fn on_virtual_desktops_updated(&mut self) -> Result<(), EngineError> {
        let ids = self.desktops.desktop_ids().map_err(desktops_error)?;
        let modified = self
            .registry
            .write()
            .prune_stale_virtual_desktops(&ids, &mut self.store);
        if modified {
            self.store.save_all().map_err(store_error)?;
        }
        Ok(())
    }

    fn on_window_created(&mut self, window: WindowId) -> Result<(), EngineError> {
        if !self
            .wm
            .is_interesting(window, &self.settings.excluded_apps)
            .map_err(wm_error)?
        {
            return Ok(());
        }
        let registry = Arc::clone(&self.registry);
        let mut registry = registry.write();

        if self.settings.app_last_zone_move_windows
            && self.placement.restore_app_last_zones(
                &mut registry,
                &self.wm,
                &mut self.store,
                window,
            )?
        {
            return Ok(());
        }

        let Some(monitor) = self.wm.window_monitor(window).map_err(wm_error)? else {
            return Ok(());
        };
        let mut ctx = CycleContext {
            registry: &mut registry,
            placement: &mut self.placement,
            wm: &self.wm,
            store: &mut self.store,
            settings: &self.settings,
        };
        self.cycler.settle(&mut ctx, monitor)?;
        Ok(())
    }

    fn on_move_window(&mut self, direction: Direction) -> Result<(), EngineError> {
        let Some(window) = self.wm.foreground_window().map_err(wm_error)? else {
            return Ok(());
        };
        if !self
            .wm
            .is_interesting(window, &self.settings.excluded_apps)
            .map_err(wm_error)?
        {
            return Ok(());
        }
        let across = self.settings.move_window_across_monitors;
        let moved = self.placement.move_by_direction(
            &mut self.registry.write(),
            &self.wm,
            &mut self.store,
            window,
            direction,
            across,
        )?;
        if moved {
            self.store.save_all().map_err(store_error)?;
        }
        Ok(())
    }

    fn toggle_editor(&mut self) -> Result<(), EngineError> {
        let Some(tx) = self.editor_tx.clone() else {
            debug!("no editor attached");
            return Ok(());
        };
        if self.editor_open {
            if tx.send(EditorCommand::Terminate).is_err() {
                warn!("editor channel closed");
                self.editor_tx = None;
                self.editor_open = false;
            }
            return Ok(());
        }

        let monitor = match self.wm.foreground_window().map_err(wm_error)? {
            Some(window) => self.wm.window_monitor(window).map_err(wm_error)?,
            None => None,
        };
        let monitor = match monitor {
            Some(m) => Some(m),
            None => self.wm.active_monitor().map_err(wm_error)?,
        };
        let Some(monitor) = monitor else {
            debug!("no monitor to edit");
            return Ok(());
        };

        let request = {
            let registry = self.registry.read();
            let Some(work_area) = registry.get(monitor) else {
                debug!("no work area on monitor {}", monitor);
                return Ok(());
            };
            let descriptor = self.store.find_descriptor(work_area.identity());
            EditorRequest::for_work_area(work_area, descriptor)
        };
        self.store.set_active_identity(request.identity.clone());
        info!("launching editor for {}", request.identity);
        if tx.send(EditorCommand::Launch(request)).is_err() {
            warn!("editor channel closed");
            self.editor_tx = None;
            return Ok(());
        }
        self.editor_open = true;
        Ok(())
    }

    fn on_editor_exit(&mut self, kind: EditorExitKind) -> Result<(), EngineError> {
        self.editor_open = false;
        if kind != EditorExitKind::Exit {
            return Ok(());
        }
        self.store.reload().map_err(store_error)?;
        self.store.save_all().map_err(store_error)?;

        let registry = Arc::clone(&self.registry);
        let mut registry = registry.write();
        registry.update_active_zone_sets(&self.store);
        self.cycler.reset();
        if self.settings.zone_set_change_move_windows {
            self.placement
                .place_all(&mut registry, &self.wm, &mut self.store)?;
        }
        Ok(())
    }
}

//  Tests
