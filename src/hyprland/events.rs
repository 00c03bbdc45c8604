//! Translates Hyprland's event stream into [`HostEvent`]s.
//!
//! Hyprland publishes events on socket2 at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket2.sock`, one
//! `EVENT>>DATA\n` line each.  The ones dynadesk listens to:
//!
//! | Event          | Payload                              | Becomes                  |
//! |----------------|--------------------------------------|--------------------------|
//! | `openwindow`   | `<address>,<ws name>,<class>,<title>`| `WindowAdded`            |
//! | `closewindow`  | `<address>`                          | `WindowRemoved`          |
//! | `movewindowv2` | `<address>,<ws id>,<ws name>`        | `WindowDesktopChanged`   |
//! | `pin`          | `<address>,<0/1>`                    | `WindowDesktopChanged`   |
//! | `workspacev2`  | `<ws id>,<ws name>`                  | `ActiveDesktopChanged`   |
//! | `focusedmonv2` | `<monitor>,<ws id>`                  | `ActiveDesktopChanged`   |
//!
//! Hyprland does not say which workspace was active before a switch, so
//! [`HyprlandEventSource`] remembers the last active workspace id itself.

use super::ipc::{self, HyprlandError};
use crate::model::{Desktop, HostEvent, WindowId};
use crate::traits::EventSource;
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::sync::mpsc;

/// An [`EventSource`] reading Hyprland's event socket.
pub struct HyprlandEventSource {
    active: Option<i64>,
}

impl Default for HyprlandEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HyprlandEventSource {
    /// Create a source.  The active workspace is read when
    /// [`run`](EventSource::run) starts.
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Translate one socket2 line, updating the tracked active workspace.
    pub fn translate(&mut self, line: &str) -> Option<HostEvent> {
        let (event, data) = parse_event_line(line)?;
        match event {
            "openwindow" => window_field(data).map(HostEvent::WindowAdded),
            "closewindow" => window_field(data).map(HostEvent::WindowRemoved),
            "movewindowv2" | "pin" => window_field(data).map(HostEvent::WindowDesktopChanged),
            "workspacev2" => self.switch_to(data.split(',').next()?),
            "focusedmonv2" => self.switch_to(data.split(',').nth(1)?),
            _ => None,
        }
    }

    fn switch_to(&mut self, field: &str) -> Option<HostEvent> {
        let id: i64 = field.trim().parse().ok()?;
        if id <= 0 {
            return None;
        }
        let previous = self.active.replace(id)?;
        if previous == id {
            return None;
        }
        Some(HostEvent::ActiveDesktopChanged {
            previous: Desktop(previous),
        })
    }
}

/// Parse a single event line from socket2.
///
/// Lines have the form `EVENT>>DATA\n`.
fn parse_event_line(line: &str) -> Option<(&str, &str)> {
    let sep = line.find(">>")?;
    Some((&line[..sep], &line[sep + 2..]))
}

/// The window address that leads the payload of window events.
fn window_field(data: &str) -> Option<WindowId> {
    let field = data.split(',').next()?;
    match field.parse::<WindowId>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("bad window address in event: {:?}", data);
            None
        }
    }
}

#[derive(Deserialize)]
struct ActiveWorkspaceJson {
    id: i64,
}

impl EventSource for HyprlandEventSource {
    type Error = HyprlandError;

    /// Connect to Hyprland's event socket and forward events.
    ///
    /// This method **blocks** until the socket is closed or an error
    /// occurs.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<HostEvent>) -> Result<(), Self::Error> {
        let active: ActiveWorkspaceJson = ipc::query("activeworkspace")?;
        self.active = Some(active.id);

        let path = ipc::socket2_path()?;
        let stream = UnixStream::connect(&path)
            .map_err(|e| HyprlandError(format!("connect to {}: {}", path.display(), e)))?;
        info!("event source connected to {}", path.display());

        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(line) if line.is_empty() => continue,
                Ok(line) => {
                    if let Some(event) = self.translate(&line) {
                        debug!("event {:?}", event);
                        if sink.send(event).is_err() {
                            info!("sink closed, shutting down");
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    error!("socket2 read error: {}", e);
                    return Err(HyprlandError(format!("read error: {}", e)));
                }
            }
        }

        warn!("socket2 stream ended");
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn source_on(ws: i64) -> HyprlandEventSource {
        HyprlandEventSource { active: Some(ws) }
    }

    #[test]
    fn parse_event_line_splits_on_first_separator() {
        assert_eq!(parse_event_line("openwindow>>a,b>>c"), Some(("openwindow", "a,b>>c")));
        assert_eq!(parse_event_line("garbage"), None);
    }

    #[test]
    fn window_events() {
        let mut src = source_on(1);
        assert_eq!(
            src.translate("openwindow>>55d1c0a2b3e0,2,kitty,shell, with commas"),
            Some(HostEvent::WindowAdded(WindowId(0x55d1c0a2b3e0)))
        );
        assert_eq!(
            src.translate("closewindow>>55d1c0a2b3e0"),
            Some(HostEvent::WindowRemoved(WindowId(0x55d1c0a2b3e0)))
        );
        assert_eq!(
            src.translate("movewindowv2>>abc,3,3"),
            Some(HostEvent::WindowDesktopChanged(WindowId(0xabc)))
        );
        assert_eq!(
            src.translate("pin>>abc,1"),
            Some(HostEvent::WindowDesktopChanged(WindowId(0xabc)))
        );
    }

    #[test]
    fn bad_address_is_dropped() {
        let mut src = source_on(1);
        assert_eq!(src.translate("openwindow>>zzz,2,kitty,shell"), None);
    }

    #[test]
    fn workspace_switch_reports_previous() {
        let mut src = source_on(1);
        assert_eq!(
            src.translate("workspacev2>>3,3"),
            Some(HostEvent::ActiveDesktopChanged {
                previous: Desktop(1)
            })
        );
        assert_eq!(
            src.translate("focusedmonv2>>DP-1,2"),
            Some(HostEvent::ActiveDesktopChanged {
                previous: Desktop(3)
            })
        );
    }

    #[test]
    fn repeated_switch_to_same_workspace_is_silent() {
        let mut src = source_on(1);
        assert!(src.translate("workspacev2>>2,2").is_some());
        assert_eq!(src.translate("focusedmonv2>>DP-1,2"), None);
    }

    #[test]
    fn special_workspaces_are_not_switches() {
        let mut src = source_on(1);
        assert_eq!(src.translate("workspacev2>>-98,special:scratch"), None);
        assert_eq!(
            src.translate("workspacev2>>2,2"),
            Some(HostEvent::ActiveDesktopChanged {
                previous: Desktop(1)
            })
        );
    }

    #[test]
    fn first_switch_without_known_active_is_silent() {
        let mut src = HyprlandEventSource::new();
        assert_eq!(src.translate("workspacev2>>2,2"), None);
        assert!(src.translate("workspacev2>>3,3").is_some());
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let mut src = source_on(1);
        assert_eq!(src.translate("activewindow>>kitty,shell"), None);
        assert_eq!(src.translate("swipebegin>>3"), None);
    }
}
