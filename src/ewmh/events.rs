//! Turns X11 property changes into [`HostEvent`]s.
//!
//! EWMH has no event stream of its own.  The window manager publishes its
//! state in properties, so the source watches `PropertyNotify` on the root
//! window (`_NET_CLIENT_LIST`, `_NET_CURRENT_DESKTOP`) and on every managed
//! client (`_NET_WM_DESKTOP`, `_NET_WM_STATE`), and derives events by
//! diffing against what it saw last.

use super::connection::{EwmhError, X11Connection};
use crate::model::{Desktop, HostEvent, WindowId};
use crate::traits::EventSource;
use log::{debug, info, trace};
use std::collections::HashSet;
use std::sync::mpsc;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{self, ChangeWindowAttributesAux, ConnectionExt as _, EventMask};
use x11rb::protocol::Event;

/// An [`EventSource`] for EWMH window managers.
///
/// Holds its own X connection, separate from the host's.
pub struct EwmhEventSource {
    x: X11Connection,
    clients: HashSet<xproto::Window>,
    current: Option<u32>,
}

impl EwmhEventSource {
    /// Connect to the display named by `$DISPLAY`.
    pub fn connect() -> Result<Self, EwmhError> {
        Ok(Self {
            x: X11Connection::connect()?,
            clients: HashSet::new(),
            current: None,
        })
    }

    /// Ask for `PropertyNotify` on `window`.  Errors for windows that are
    /// already gone are not interesting.
    fn watch(&self, window: xproto::Window) -> Result<(), EwmhError> {
        let aux = ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE);
        self.x.conn.change_window_attributes(window, &aux)?.ignore_error();
        Ok(())
    }

    fn translate(&mut self, event: Event) -> Result<Vec<HostEvent>, EwmhError> {
        let ev = match event {
            Event::PropertyNotify(ev) => ev,
            Event::Error(e) => {
                trace!("ignoring X11 error {:?}", e.error_kind);
                return Ok(Vec::new());
            }
            _ => return Ok(Vec::new()),
        };
        let atoms = &self.x.atoms;

        if ev.window == self.x.root {
            if ev.atom == atoms._NET_CLIENT_LIST {
                let list = self.x.client_list()?;
                let (added, removed) = diff_clients(&self.clients, &list);
                for &window in &added {
                    self.watch(window)?;
                    self.clients.insert(window);
                }
                for window in &removed {
                    self.clients.remove(window);
                }
                self.x.conn.flush()?;
                let events = removed
                    .into_iter()
                    .map(|w| HostEvent::WindowRemoved(WindowId(u64::from(w))))
                    .chain(added.into_iter().map(|w| HostEvent::WindowAdded(WindowId(u64::from(w)))))
                    .collect();
                return Ok(events);
            }
            if ev.atom == atoms._NET_CURRENT_DESKTOP {
                let Some(now) = self.x.cardinal(self.x.root, atoms._NET_CURRENT_DESKTOP)? else {
                    return Ok(Vec::new());
                };
                return Ok(desktop_switch(&mut self.current, now).into_iter().collect());
            }
            return Ok(Vec::new());
        }

        let watched = ev.atom == atoms._NET_WM_DESKTOP || ev.atom == atoms._NET_WM_STATE;
        if watched && self.clients.contains(&ev.window) {
            return Ok(vec![HostEvent::WindowDesktopChanged(WindowId(u64::from(ev.window)))]);
        }
        Ok(Vec::new())
    }
}

/// Windows that appeared in and disappeared from the client list.
///
/// `added` keeps the order of `list`; `removed` is sorted so events come
/// out deterministic.
fn diff_clients(
    known: &HashSet<xproto::Window>,
    list: &[xproto::Window],
) -> (Vec<xproto::Window>, Vec<xproto::Window>) {
    let mut seen = HashSet::with_capacity(list.len());
    let added = list
        .iter()
        .copied()
        .filter(|w| seen.insert(*w) && !known.contains(w))
        .collect();
    let mut removed: Vec<_> = known.iter().copied().filter(|w| !seen.contains(w)).collect();
    removed.sort_unstable();
    (added, removed)
}

/// Record `now` as the current desktop and report the one it replaced.
fn desktop_switch(current: &mut Option<u32>, now: u32) -> Option<HostEvent> {
    let previous = current.replace(now)?;
    if previous == now {
        return None;
    }
    Some(HostEvent::ActiveDesktopChanged {
        previous: Desktop(i64::from(previous)),
    })
}

impl EventSource for EwmhEventSource {
    type Error = EwmhError;

    /// Watch the root window and all clients, then forward events.
    ///
    /// This method **blocks** until the connection fails or the sink is
    /// dropped.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<HostEvent>) -> Result<(), Self::Error> {
        let aux = ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE);
        self.x.conn.change_window_attributes(self.x.root, &aux)?.check()?;

        self.current = self.x.cardinal(self.x.root, self.x.atoms._NET_CURRENT_DESKTOP)?;
        for window in self.x.client_list()? {
            self.watch(window)?;
            self.clients.insert(window);
        }
        self.x.conn.flush()?;
        info!("event source watching {} clients", self.clients.len());

        loop {
            let event = self.x.conn.wait_for_event()?;
            for event in self.translate(event)? {
                debug!("event {:?}", event);
                if sink.send(event).is_err() {
                    info!("sink closed, shutting down");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_finds_new_and_gone_windows() {
        let known: HashSet<_> = [10, 20, 30].into_iter().collect();
        let (added, removed) = diff_clients(&known, &[20, 40, 10, 50]);
        assert_eq!(added, vec![40, 50]);
        assert_eq!(removed, vec![30]);
    }

    #[test]
    fn diff_of_unchanged_list_is_empty() {
        let known: HashSet<_> = [1, 2].into_iter().collect();
        let (added, removed) = diff_clients(&known, &[2, 1]);
        assert!(added.is_empty());
        assert!(removed.is_empty());
    }

    #[test]
    fn diff_ignores_duplicates_in_list() {
        let (added, _) = diff_clients(&HashSet::new(), &[7, 7, 8]);
        assert_eq!(added, vec![7, 8]);
    }

    #[test]
    fn desktop_switch_reports_previous() {
        let mut current = Some(0);
        assert_eq!(
            desktop_switch(&mut current, 2),
            Some(HostEvent::ActiveDesktopChanged {
                previous: Desktop(0)
            })
        );
        assert_eq!(current, Some(2));
    }

    #[test]
    fn desktop_switch_to_same_desktop_is_silent() {
        let mut current = Some(1);
        assert_eq!(desktop_switch(&mut current, 1), None);
    }

    #[test]
    fn first_desktop_switch_is_silent() {
        let mut current = None;
        assert_eq!(desktop_switch(&mut current, 3), None);
        assert_eq!(current, Some(3));
    }
}
