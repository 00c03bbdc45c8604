//! Thin EWMH layer over an x11rb connection.
//!
//! Both the [`EwmhHost`](super::EwmhHost) and the
//! [`EwmhEventSource`](super::EwmhEventSource) open their own
//! [`X11Connection`]; X11 event selections are per client connection, so the
//! event source must not share the host's.

use super::atoms::Atoms;
use log::debug;
use std::str;
use std::thread;
use std::time::Duration;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::xproto::{self, AtomEnum, ClientMessageEvent, ConnectionExt as _, EventMask};
use x11rb::rust_connection::RustConnection;

/// `_NET_WM_DESKTOP` value of a window shown on all desktops.
pub(crate) const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

/// Source indication for client messages: "sent by a pager".
const SOURCE_PAGER: u32 = 2;

/// How long to wait for the window manager to apply a request.
const SETTLE_POLLS: u32 = 50;
const SETTLE_INTERVAL: Duration = Duration::from_millis(10);

/// Errors that can occur when talking to the X server.
#[derive(Debug, thiserror::Error)]
pub enum EwmhError {
    #[error("cannot connect to X server: {0}")]
    Connect(#[from] ConnectError),
    #[error("X11 connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),
    #[error("root window property {0} is not set, is an EWMH window manager running?")]
    MissingProperty(&'static str),
    #[error("window manager did not apply the {0} request")]
    NotApplied(&'static str),
}

impl EwmhError {
    /// Whether the error is the server rejecting a request, typically
    /// because the window it names was destroyed in the meantime.
    pub(crate) fn is_x11_error(&self) -> bool {
        matches!(self, EwmhError::Reply(ReplyError::X11Error(_)))
    }
}

/// An X11 connection with the root window and atoms resolved.
pub(crate) struct X11Connection {
    pub conn: RustConnection,
    pub root: xproto::Window,
    pub atoms: Atoms,
}

impl X11Connection {
    /// Connect to `$DISPLAY` and intern the EWMH atoms.
    pub fn connect() -> Result<Self, EwmhError> {
        let (conn, screen) = x11rb::connect(None)?;
        let root = conn.setup().roots[screen].root;
        let atoms = Atoms::new(&conn)?.reply()?;
        debug!("connected to X server, screen {}, root {:#x}", screen, root);
        Ok(Self { conn, root, atoms })
    }

    /// First CARDINAL value of `atom` on `window`, if set.
    pub fn cardinal(&self, window: xproto::Window, atom: xproto::Atom) -> Result<Option<u32>, EwmhError> {
        let reply = self
            .conn
            .get_property(false, window, atom, AtomEnum::CARDINAL, 0, 1)?
            .reply()?;
        Ok(reply.value32().and_then(|mut values| values.next()))
    }

    /// CARDINAL property of the root window that EWMH requires to exist.
    pub fn root_cardinal(&self, atom: xproto::Atom, name: &'static str) -> Result<u32, EwmhError> {
        self.cardinal(self.root, atom)?
            .ok_or(EwmhError::MissingProperty(name))
    }

    /// All 32-bit values of `atom` (of type `type_`) on `window`.
    pub fn list32(
        &self,
        window: xproto::Window,
        atom: xproto::Atom,
        type_: impl Into<xproto::Atom>,
    ) -> Result<Vec<u32>, EwmhError> {
        let reply = self
            .conn
            .get_property(false, window, atom, type_, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value32().map(|values| values.collect()).unwrap_or_default())
    }

    /// Managed client windows (`_NET_CLIENT_LIST`).
    pub fn client_list(&self) -> Result<Vec<xproto::Window>, EwmhError> {
        self.list32(self.root, self.atoms._NET_CLIENT_LIST, AtomEnum::WINDOW)
    }

    /// Raw bytes of a property, empty when unset.
    pub fn bytes(
        &self,
        window: xproto::Window,
        atom: xproto::Atom,
        type_: impl Into<xproto::Atom>,
    ) -> Result<Vec<u8>, EwmhError> {
        let reply = self
            .conn
            .get_property(false, window, atom, type_, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value)
    }

    /// Window title from `_NET_WM_NAME`, falling back to `WM_NAME`.
    pub fn window_name(&self, window: xproto::Window) -> Result<String, EwmhError> {
        let utf8 = self.bytes(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)?;
        if let Ok(name) = str::from_utf8(&utf8) {
            if !name.is_empty() {
                return Ok(name.to_owned());
            }
        }
        let legacy = self.bytes(window, AtomEnum::WM_NAME.into(), AtomEnum::STRING)?;
        Ok(String::from_utf8_lossy(&legacy).into_owned())
    }

    /// Ask the window manager to act on `window` by sending a client
    /// message to the root window.
    pub fn request(&self, window: xproto::Window, type_: xproto::Atom, data: [u32; 4]) -> Result<(), EwmhError> {
        let msg = ClientMessageEvent::new(
            32,
            window,
            type_,
            [data[0], data[1], data[2], data[3], 0],
        );
        let mask = EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY;
        self.conn.send_event(false, self.root, mask, msg)?.check()?;
        self.conn.flush()?;
        Ok(())
    }

    /// Like [`request`](Self::request), tagged as coming from a pager.
    pub fn pager_request(&self, window: xproto::Window, type_: xproto::Atom, value: u32) -> Result<(), EwmhError> {
        self.request(window, type_, [value, SOURCE_PAGER, 0, 0])
    }

    /// Poll `atom` on `window` until it reads `expected`.
    ///
    /// Client messages are handled by the window manager asynchronously,
    /// but callers read the new state right after a request.  Returns
    /// `false` if the value did not settle in time.
    pub fn settle(&self, window: xproto::Window, atom: xproto::Atom, expected: u32) -> Result<bool, EwmhError> {
        for _ in 0..SETTLE_POLLS {
            if self.cardinal(window, atom)? == Some(expected) {
                return Ok(true);
            }
            thread::sleep(SETTLE_INTERVAL);
        }
        debug!("property {} on {:#x} did not become {}", atom, window, expected);
        Ok(false)
    }

    /// [`settle`](Self::settle), failing with [`EwmhError::NotApplied`]
    /// when the value never arrives.
    pub fn await_applied(
        &self,
        window: xproto::Window,
        atom: xproto::Atom,
        expected: u32,
        name: &'static str,
    ) -> Result<(), EwmhError> {
        applied(self.settle(window, atom, expected)?, name)
    }
}

fn applied(settled: bool, name: &'static str) -> Result<(), EwmhError> {
    if settled {
        Ok(())
    } else {
        Err(EwmhError::NotApplied(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_request_is_applied() {
        assert!(applied(true, "_NET_WM_DESKTOP").is_ok());
    }

    #[test]
    fn unsettled_request_is_an_error() {
        let err = applied(false, "_NET_NUMBER_OF_DESKTOPS").unwrap_err();
        assert!(matches!(err, EwmhError::NotApplied("_NET_NUMBER_OF_DESKTOPS")));
        assert!(!err.is_x11_error());
        assert_eq!(
            err.to_string(),
            "window manager did not apply the _NET_NUMBER_OF_DESKTOPS request"
        );
    }
}
