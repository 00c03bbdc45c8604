//! Types shared by every component of dynadesk.
//!
//! [`Desktop`] and [`Window`] are snapshots of host-owned objects.  Neither
//! is ever kept beyond the handling of a single [`HostEvent`]; the host
//! mutates its collections out of band, so every operation fetches them
//! again.

use std::fmt;
use std::str::FromStr;

/// Opaque handle for one virtual desktop.
///
/// Backends pick the meaning of the inner value: the EWMH backend uses the
/// zero-based desktop index, the Hyprland backend uses the workspace id.
/// The position of a desktop is never stored; it is always resolved by
/// looking the handle up in a freshly fetched sequence (see
/// [`position_of`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Desktop(pub i64);

impl fmt::Display for Desktop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "desktop {}", self.0)
    }
}

/// Opaque window identity (X11 window id or Hyprland client address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Parses hexadecimal ids with or without a `0x` prefix, which covers both
/// the `j/clients` JSON (`"0x55d1c0a2b3e0"`) and socket2 events
/// (`55d1c0a2b3e0`).
impl FromStr for WindowId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        u64::from_str_radix(digits, 16).map(WindowId)
    }
}

/// Snapshot of a managed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub id: WindowId,
    /// Window title, only used in log lines.
    pub label: String,
    /// Desktops the window is a member of, in host order.
    pub desktops: Vec<Desktop>,
    /// Hidden from pagers and task switchers.
    pub skip_pager: bool,
    /// Shown on every desktop.
    pub on_all_desktops: bool,
}

impl Window {
    /// Whether `desktop` is part of this window's membership.
    pub fn is_on(&self, desktop: &Desktop) -> bool {
        self.desktops.contains(desktop)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.id, self.label)
    }
}

/// Position of `desktop` in `desktops`, or `None` when the handle is no
/// longer part of the sequence.
pub fn position_of(desktops: &[Desktop], desktop: &Desktop) -> Option<usize> {
    desktops.iter().position(|d| d == desktop)
}

/// A notification delivered by an [`EventSource`](crate::traits::EventSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A window was created or became managed.
    WindowAdded(WindowId),
    /// A window was destroyed or stopped being managed.
    WindowRemoved(WindowId),
    /// The desktop membership of one window changed.
    WindowDesktopChanged(WindowId),
    /// The active desktop changed; `previous` is the desktop that was
    /// active before the switch.
    ActiveDesktopChanged { previous: Desktop },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_id_parses_with_and_without_prefix() {
        assert_eq!("0x55d1c0".parse::<WindowId>().unwrap(), WindowId(0x55d1c0));
        assert_eq!("55d1c0".parse::<WindowId>().unwrap(), WindowId(0x55d1c0));
        assert_eq!(" 0XfF ".parse::<WindowId>().unwrap(), WindowId(0xff));
        assert!("not-hex".parse::<WindowId>().is_err());
    }

    #[test]
    fn window_id_displays_as_hex() {
        assert_eq!(WindowId(0xbeef).to_string(), "0xbeef");
    }

    #[test]
    fn position_of_missing_desktop_is_none() {
        let desktops = [Desktop(1), Desktop(2), Desktop(5)];
        assert_eq!(position_of(&desktops, &Desktop(5)), Some(2));
        assert_eq!(position_of(&desktops, &Desktop(3)), None);
    }
}
