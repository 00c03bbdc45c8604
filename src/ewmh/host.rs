//! [`DesktopHost`] implementation for EWMH compliant X11 window managers.
//!
//! Desktops are the indices `0.._NET_NUMBER_OF_DESKTOPS`.  Every change is
//! requested from the window manager with a client message on the root
//! window; nothing is written to the properties it owns, except the
//! desktop names list which pagers are allowed to set.

use super::connection::{EwmhError, X11Connection, ALL_DESKTOPS};
use crate::model::{Desktop, Window, WindowId};
use crate::traits::DesktopHost;
use log::{debug, trace};
use x11rb::protocol::xproto::{self, AtomEnum, PropMode};
use x11rb::wrapper::ConnectionExt as _;

/// EWMH-backed desktop host.
pub struct EwmhHost {
    x: X11Connection,
}

impl EwmhHost {
    /// Connect to the display named by `$DISPLAY`.
    pub fn connect() -> Result<Self, EwmhError> {
        Ok(Self {
            x: X11Connection::connect()?,
        })
    }

    fn desktop_count(&self) -> Result<u32, EwmhError> {
        self.x
            .root_cardinal(self.x.atoms._NET_NUMBER_OF_DESKTOPS, "_NET_NUMBER_OF_DESKTOPS")
    }

    fn request_count(&self, count: u32) -> Result<(), EwmhError> {
        let (root, atom) = (self.x.root, self.x.atoms._NET_NUMBER_OF_DESKTOPS);
        self.x.pager_request(root, atom, count)?;
        self.x.await_applied(root, atom, count, "_NET_NUMBER_OF_DESKTOPS")
    }

    /// Read one client, or `None` if it vanished while being read.
    fn read_window(&self, window: xproto::Window) -> Result<Option<Window>, EwmhError> {
        match self.read_window_props(window) {
            Ok(w) => Ok(Some(w)),
            Err(e) if e.is_x11_error() => {
                trace!("window {:#x} is gone: {}", window, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn read_window_props(&self, window: xproto::Window) -> Result<Window, EwmhError> {
        let atoms = &self.x.atoms;
        let desktop = self.x.cardinal(window, atoms._NET_WM_DESKTOP)?;
        let state = self.x.list32(window, atoms._NET_WM_STATE, AtomEnum::ATOM)?;
        let label = self.x.window_name(window)?;
        Ok(window_from(
            window,
            label,
            desktop,
            state.contains(&atoms._NET_WM_STATE_SKIP_PAGER),
            state.contains(&atoms._NET_WM_STATE_STICKY),
        ))
    }

    /// Extend `_NET_DESKTOP_NAMES` so the desktop at `index` is named.
    fn name_desktop(&self, index: u32, label: &str) -> Result<(), EwmhError> {
        let atoms = &self.x.atoms;
        let current = self.x.bytes(self.x.root, atoms._NET_DESKTOP_NAMES, atoms.UTF8_STRING)?;
        let names = names_with(&current, index as usize, label);
        self.x
            .conn
            .change_property8(PropMode::REPLACE, self.x.root, atoms._NET_DESKTOP_NAMES, atoms.UTF8_STRING, &names)?
            .check()?;
        Ok(())
    }
}

/// Build a [`Window`] from the raw properties of a client.
fn window_from(window: xproto::Window, label: String, desktop: Option<u32>, skip_pager: bool, sticky: bool) -> Window {
    let on_all_desktops = sticky || desktop == Some(ALL_DESKTOPS);
    let desktops = match desktop {
        Some(d) if d != ALL_DESKTOPS => vec![Desktop(i64::from(d))],
        _ => Vec::new(),
    };
    Window {
        id: WindowId(u64::from(window)),
        label,
        desktops,
        skip_pager,
        on_all_desktops,
    }
}

/// Desktop index as sent in a client message.
fn desktop_value(desktop: Desktop) -> Option<u32> {
    u32::try_from(desktop.0).ok().filter(|&d| d != ALL_DESKTOPS)
}

/// `_NET_DESKTOP_NAMES` is a list of NUL-terminated UTF-8 strings.  Return
/// the list truncated or padded with empty names to `index` entries and
/// `label` appended.
fn names_with(current: &[u8], index: usize, label: &str) -> Vec<u8> {
    let mut names: Vec<&[u8]> = current.split(|&b| b == 0).collect();
    // A well formed list ends with NUL, which leaves an empty trailing piece.
    if current.last() == Some(&0) || current.is_empty() {
        names.pop();
    }
    names.resize(index, &[]);
    names.push(label.as_bytes());

    let mut out = Vec::with_capacity(current.len() + label.len() + 1);
    for name in names {
        out.extend_from_slice(name);
        out.push(0);
    }
    out
}

impl DesktopHost for EwmhHost {
    type Error = EwmhError;

    fn desktops(&self) -> Result<Vec<Desktop>, Self::Error> {
        let count = self.desktop_count()?;
        Ok((0..count).map(|i| Desktop(i64::from(i))).collect())
    }

    fn current_desktop(&self) -> Result<Desktop, Self::Error> {
        let current = self
            .x
            .root_cardinal(self.x.atoms._NET_CURRENT_DESKTOP, "_NET_CURRENT_DESKTOP")?;
        Ok(Desktop(i64::from(current)))
    }

    fn append_desktop(&self, label: &str) -> Result<(), Self::Error> {
        let count = self.desktop_count()?;
        debug!("requesting {} desktops", count + 1);
        // Only name a desktop the window manager actually created.
        self.request_count(count + 1)?;
        if !label.is_empty() {
            self.name_desktop(count, label)?;
        }
        Ok(())
    }

    fn remove_last_desktop(&self) -> Result<(), Self::Error> {
        let count = self.desktop_count()?;
        if count <= 1 {
            debug!("refusing to remove the only desktop");
            return Ok(());
        }
        debug!("requesting {} desktops", count - 1);
        self.request_count(count - 1)
    }

    fn windows(&self) -> Result<Vec<Window>, Self::Error> {
        let mut windows = Vec::new();
        for client in self.x.client_list()? {
            if let Some(window) = self.read_window(client)? {
                windows.push(window);
            }
        }
        Ok(windows)
    }

    fn window(&self, id: WindowId) -> Result<Option<Window>, Self::Error> {
        let Ok(window) = xproto::Window::try_from(id.0) else {
            return Ok(None);
        };
        if !self.x.client_list()?.contains(&window) {
            return Ok(None);
        }
        self.read_window(window)
    }

    fn set_window_desktops(&self, id: WindowId, desktops: &[Desktop]) -> Result<(), Self::Error> {
        // _NET_WM_DESKTOP holds a single desktop.
        let Some(&target) = desktops.first() else {
            return Ok(());
        };
        let (Ok(window), Some(value)) = (xproto::Window::try_from(id.0), desktop_value(target)) else {
            debug!("cannot move {} to {}", id, target);
            return Ok(());
        };
        let atom = self.x.atoms._NET_WM_DESKTOP;
        self.x.pager_request(window, atom, value)?;
        self.x.await_applied(window, atom, value, "_NET_WM_DESKTOP")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_on_one_desktop() {
        let w = window_from(0x1400003, "xterm".into(), Some(2), false, false);
        assert_eq!(w.id, WindowId(0x1400003));
        assert_eq!(w.desktops, vec![Desktop(2)]);
        assert!(!w.on_all_desktops);
        assert!(!w.skip_pager);
    }

    #[test]
    fn all_desktops_value_means_sticky() {
        let w = window_from(1, String::new(), Some(ALL_DESKTOPS), false, false);
        assert!(w.on_all_desktops);
        assert!(w.desktops.is_empty());
    }

    #[test]
    fn sticky_state_keeps_desktop() {
        let w = window_from(1, String::new(), Some(0), false, true);
        assert!(w.on_all_desktops);
        assert_eq!(w.desktops, vec![Desktop(0)]);
    }

    #[test]
    fn window_without_desktop_property() {
        let w = window_from(1, String::new(), None, true, false);
        assert!(w.desktops.is_empty());
        assert!(w.skip_pager);
    }

    #[test]
    fn desktop_values() {
        assert_eq!(desktop_value(Desktop(3)), Some(3));
        assert_eq!(desktop_value(Desktop(-1)), None);
        assert_eq!(desktop_value(Desktop(i64::from(ALL_DESKTOPS))), None);
    }

    #[test]
    fn names_append_after_existing() {
        assert_eq!(names_with(b"one\0two\0", 2, "Dynamic"), b"one\0two\0Dynamic\0");
    }

    #[test]
    fn names_pad_short_list() {
        assert_eq!(names_with(b"one\0", 3, "Dynamic"), b"one\0\0\0Dynamic\0");
        assert_eq!(names_with(b"", 1, "Dynamic"), b"\0Dynamic\0");
    }

    #[test]
    fn names_drop_stale_entries() {
        assert_eq!(names_with(b"one\0two\0three\0", 1, "Dynamic"), b"one\0Dynamic\0");
    }

    #[test]
    fn names_tolerate_missing_terminator() {
        assert_eq!(names_with(b"one\0two", 2, "x"), b"one\0two\0x\0");
    }
}
