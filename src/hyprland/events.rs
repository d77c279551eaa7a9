//! Translates Hyprland's IPC event stream into hyprzones [`Event`]s.
//!
//! Hyprland broadcasts `EVENT>>DATA\n` lines on
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket2.sock`.
//! Most events come in a v1 and a v2 flavour; only the v1 names are mapped
//! so nothing is reported twice.
//!
//! | Hyprland event                       | Event                                   |
//! |--------------------------------------|-----------------------------------------|
//! | `openwindow`                         | `WindowCreated`                         |
//! | `monitoradded`, `monitorremoved`     | `DisplayChanged(DisplayChange)`         |
//! | `openlayer`, `closelayer`            | `DisplayChanged(WorkAreaChange)`        |
//! | `workspace`, `moveworkspace`         | `DisplayChanged(VirtualDesktopSwitch)`  |
//! | `createworkspace`, `destroyworkspace`| `VirtualDesktopsUpdated`                |
//!
//! `focusedmon` is not mapped: every monitor keeps showing its workspace
//! when focus moves between monitors.

use super::wm::{socket_path, HyprlandError};
use crate::event::{DisplayChangeKind, Event, WindowId};
use crate::traits::EventSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::sync::mpsc;

/// An [`EventSource`] reading Hyprland's event socket.
#[derive(Debug, Default)]
pub struct HyprlandEventSource;

impl HyprlandEventSource {
    pub fn new() -> Self {
        Self
    }
}

/// Split `EVENT>>DATA`.
fn parse_event_line(line: &str) -> Option<(&str, &str)> {
    line.split_once(">>")
}

/// Map one Hyprland event to the engine's vocabulary.
fn translate(event: &str, data: &str) -> Option<Event> {
    match event {
        // openwindow>>ADDRESS,WORKSPACE,CLASS,TITLE (address without 0x)
        "openwindow" => {
            let address = data.split(',').next()?.trim();
            u64::from_str_radix(address.trim_start_matches("0x"), 16)
                .ok()
                .map(|id| Event::WindowCreated(WindowId(id)))
        }
        "monitoradded" | "monitorremoved" => {
            Some(Event::DisplayChanged(DisplayChangeKind::DisplayChange))
        }
        "openlayer" | "closelayer" => {
            Some(Event::DisplayChanged(DisplayChangeKind::WorkAreaChange))
        }
        "workspace" | "moveworkspace" => {
            Some(Event::DisplayChanged(DisplayChangeKind::VirtualDesktopSwitch))
        }
        "createworkspace" | "destroyworkspace" => Some(Event::VirtualDesktopsUpdated),
        _ => None,
    }
}

impl EventSource for HyprlandEventSource {
    type Error = HyprlandError;

    /// Connect to the event socket and forward events.
    ///
    /// This method **blocks** until the socket closes or the sink is
    /// dropped.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        let path = socket_path(".socket2.sock")?;
        let stream = UnixStream::connect(&path)
            .map_err(|e| HyprlandError(format!("connect to {}: {}", path.display(), e)))?;
        info!("event source connected to {}", path.display());

        for line in BufReader::new(stream).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("socket2 read error: {}", e);
                    return Err(HyprlandError(format!("read error: {}", e)));
                }
            };
            let Some((name, data)) = parse_event_line(&line) else {
                continue;
            };
            let Some(event) = translate(name, data) else {
                continue;
            };
            debug!("{} -> {:?}", name, event);
            if sink.send(event).is_err() {
                info!("sink closed, shutting down");
                return Ok(());
            }
        }

        warn!("socket2 stream ended");
        Ok(())
    }
}

//  Tests
