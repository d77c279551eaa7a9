//! Background watcher for virtual desktop changes.
//!
//! The watcher thread polls a [`VirtualDesktops`] provider and posts
//! [`Event::VirtualDesktopsUpdated`] when the set of desktop ids changes and
//! [`Event::DisplayChanged`] with
//! [`VirtualDesktopSwitch`](DisplayChangeKind::VirtualDesktopSwitch) when the
//! desktops on screen change.  It never touches engine state.
//!
//! Between polls it blocks on its termination channel, so
//! [`WatcherHandle::stop`] wakes it immediately.

use crate::event::{DisplayChangeKind, Event};
use crate::identity::DesktopId;
use crate::traits::VirtualDesktops;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// What the watcher last saw.
#[derive(Debug, Default, PartialEq)]
struct Snapshot {
    visible: Vec<DesktopId>,
    ids: Vec<DesktopId>,
}

impl Snapshot {
    fn take<D: VirtualDesktops>(desktops: &D) -> Result<Self, D::Error> {
        Ok(Self {
            visible: desktops.visible_desktops()?,
            ids: desktops.desktop_ids()?,
        })
    }

    /// Events describing the step from `self` to `next`.
    fn changes(&self, next: &Snapshot) -> Vec<Event> {
        let mut events = Vec::new();
        if self.ids != next.ids {
            events.push(Event::VirtualDesktopsUpdated);
        }
        if self.visible != next.visible {
            events.push(Event::DisplayChanged(DisplayChangeKind::VirtualDesktopSwitch));
        }
        events
    }
}

/// Running watcher thread.
pub struct WatcherHandle {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

impl WatcherHandle {
    /// Signal the thread and wait for it to exit.
    pub fn stop(self) {
        let _ = self.stop.send(());
        if self.thread.join().is_err() {
            warn!("desktop watcher panicked");
        }
    }
}

pub struct DesktopWatcher<D> {
    desktops: D,
    interval: Duration,
}

impl<D: VirtualDesktops + Send + 'static> DesktopWatcher<D> {
    pub fn new(desktops: D) -> Self {
        Self {
            desktops,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start polling on a dedicated thread.  The thread ends when stopped or
    /// when `sink` is closed.
    pub fn spawn(self, sink: mpsc::Sender<Event>) -> WatcherHandle {
        let (stop, stopped) = bounded::<()>(1);
        let thread = std::thread::spawn(move || {
            let mut last = Snapshot::take(&self.desktops).unwrap_or_else(|e| {
                warn!("desktop watcher: initial poll failed: {}", e);
                Snapshot::default()
            });
            info!("desktop watcher started ({} desktops)", last.ids.len());
            loop {
                match stopped.recv_timeout(self.interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break,
                }
                let next = match Snapshot::take(&self.desktops) {
                    Ok(next) => next,
                    Err(e) => {
                        warn!("desktop watcher: poll failed: {}", e);
                        continue;
                    }
                };
                for event in last.changes(&next) {
                    debug!("desktop watcher: {:?}", event);
                    if sink.send(event).is_err() {
                        info!("desktop watcher: sink closed");
                        return;
                    }
                }
                last = next;
            }
            info!("desktop watcher stopped");
        });
        WatcherHandle { stop, thread }
    }
}

//  Tests
