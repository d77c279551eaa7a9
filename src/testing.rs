//! Recording doubles of the collaborator traits, shared by the unit tests.

use crate::config::ExcludedApps;
use crate::event::{MonitorId, MonitorInfo, WindowId};
use crate::geometry::Rect;
use crate::identity::DesktopId;
use crate::traits::{VirtualDesktops, WindowManager};
use std::cell::RefCell;

#[derive(Debug, thiserror::Error)]
#[error("fake error")]
pub struct FakeError;

pub fn monitor(id: u64, x: i32, width: i32, height: i32) -> MonitorInfo {
    MonitorInfo {
        id: MonitorId(id),
        rect: Rect::new(x, 0, width, height),
        work_area: Rect::new(x, 0, width, height),
        device_id: Some(format!("MON-{}", id)),
        desktop: None,
        mirroring: false,
    }
}

pub fn desktop(n: i64) -> DesktopId {
    DesktopId::from_workspace(n)
}

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub id: WindowId,
    pub monitor: MonitorId,
    pub desktop: Option<DesktopId>,
    pub app: String,
    pub interesting: bool,
    pub rect: Rect,
}

/// Window manager double.  Geometry commits move the window to whichever
/// monitor contains the centre of the new rectangle.
#[derive(Debug, Default)]
pub struct FakeWm {
    pub monitors: RefCell<Vec<MonitorInfo>>,
    pub windows: RefCell<Vec<FakeWindow>>,
    pub foreground: RefCell<Option<WindowId>>,
    pub active_monitor: RefCell<Option<MonitorId>>,
    pub moves: RefCell<Vec<(WindowId, Rect)>>,
    pub focused: RefCell<Vec<WindowId>>,
    /// Windows whose geometry commits fail, as if they closed meanwhile.
    pub failing: RefCell<Vec<WindowId>>,
}

impl FakeWm {
    pub fn with_monitors(monitors: Vec<MonitorInfo>) -> Self {
        let active = monitors.first().map(|m| m.id);
        Self {
            monitors: RefCell::new(monitors),
            active_monitor: RefCell::new(active),
            ..Self::default()
        }
    }

    pub fn add_window(&self, id: u64, monitor: u64, desktop: Option<DesktopId>) -> WindowId {
        let window = WindowId(id);
        self.windows.borrow_mut().push(FakeWindow {
            id: window,
            monitor: MonitorId(monitor),
            desktop,
            app: format!("app{}", id),
            interesting: true,
            rect: Rect::default(),
        });
        window
    }

    pub fn set_foreground(&self, window: WindowId) {
        *self.foreground.borrow_mut() = Some(window);
    }

    pub fn set_desktop(&self, window: WindowId, desktop: Option<DesktopId>) {
        if let Some(w) = self.windows.borrow_mut().iter_mut().find(|w| w.id == window) {
            w.desktop = desktop;
        }
    }

    pub fn rect_of(&self, window: WindowId) -> Option<Rect> {
        self.windows
            .borrow()
            .iter()
            .find(|w| w.id == window)
            .map(|w| w.rect)
    }

    pub fn monitor_of(&self, window: WindowId) -> Option<MonitorId> {
        self.windows
            .borrow()
            .iter()
            .find(|w| w.id == window)
            .map(|w| w.monitor)
    }

    fn find<T>(&self, window: WindowId, f: impl FnOnce(&FakeWindow) -> T) -> Option<T> {
        self.windows.borrow().iter().find(|w| w.id == window).map(f)
    }
}

impl WindowManager for FakeWm {
    type Error = FakeError;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, FakeError> {
        Ok(self.monitors.borrow().clone())
    }

    fn windows(&self) -> Result<Vec<WindowId>, FakeError> {
        Ok(self.windows.borrow().iter().map(|w| w.id).collect())
    }

    fn is_interesting(&self, window: WindowId, excluded: &ExcludedApps) -> Result<bool, FakeError> {
        Ok(self
            .find(window, |w| w.interesting && !excluded.matches(&w.app))
            .unwrap_or(false))
    }

    fn app_id(&self, window: WindowId) -> Result<Option<String>, FakeError> {
        Ok(self.find(window, |w| w.app.clone()))
    }

    fn window_monitor(&self, window: WindowId) -> Result<Option<MonitorId>, FakeError> {
        Ok(self.find(window, |w| w.monitor))
    }

    fn window_desktop(&self, window: WindowId) -> Result<Option<DesktopId>, FakeError> {
        Ok(self.find(window, |w| w.desktop).flatten())
    }

    fn foreground_window(&self) -> Result<Option<WindowId>, FakeError> {
        Ok(*self.foreground.borrow())
    }

    fn active_monitor(&self) -> Result<Option<MonitorId>, FakeError> {
        Ok(*self.active_monitor.borrow())
    }

    fn set_window_rect(&self, window: WindowId, rect: Rect) -> Result<(), FakeError> {
        if self.failing.borrow().contains(&window) {
            return Err(FakeError);
        }
        self.moves.borrow_mut().push((window, rect));
        let target = self
            .monitors
            .borrow()
            .iter()
            .find(|m| m.rect.contains(rect.center()))
            .map(|m| m.id);
        if let Some(w) = self.windows.borrow_mut().iter_mut().find(|w| w.id == window) {
            w.rect = rect;
            if let Some(m) = target {
                w.monitor = m;
            }
        }
        Ok(())
    }

    fn focus_window(&self, window: WindowId) -> Result<(), FakeError> {
        self.focused.borrow_mut().push(window);
        *self.foreground.borrow_mut() = Some(window);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeDesktops {
    pub current: RefCell<Option<DesktopId>>,
    pub ids: RefCell<Vec<DesktopId>>,
    /// Make `current_desktop` fail.
    pub unavailable: RefCell<bool>,
}

impl FakeDesktops {
    pub fn new(current: DesktopId, ids: Vec<DesktopId>) -> Self {
        Self {
            current: RefCell::new(Some(current)),
            ids: RefCell::new(ids),
            unavailable: RefCell::new(false),
        }
    }
}

impl VirtualDesktops for FakeDesktops {
    type Error = FakeError;

    fn current_desktop(&self) -> Result<Option<DesktopId>, FakeError> {
        if *self.unavailable.borrow() {
            return Err(FakeError);
        }
        Ok(*self.current.borrow())
    }

    fn desktop_ids(&self) -> Result<Vec<DesktopId>, FakeError> {
        Ok(self.ids.borrow().clone())
    }
}
