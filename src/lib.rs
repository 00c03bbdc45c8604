//! **dynadesk**: dynamic virtual desktops.
//!
//! A fresh empty desktop is always kept at the end of the sequence: as soon
//! as a window lands on the last desktop another one is appended.  Desktops
//! left empty are removed when the user switches away from them, down to a
//! configured minimum.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::DesktopHost`] abstracts reading and changing desktops and
//!   windows, so the policy in [`controller`] is not coupled to any
//!   specific window manager.
//! * [`traits::EventSource`] abstracts how window and desktop changes are
//!   observed, so the main loop is not coupled to any event mechanism.
//!
//! Concrete implementations live in [`hyprland`] (Hyprland IPC) and, with
//! the `backend-ewmh` feature, `ewmh` (X11 window managers).  The
//! [`probe`] module picks one at startup.

pub mod config;
pub mod controller;
#[cfg(feature = "backend-ewmh")]
pub mod ewmh;
pub mod hyprland;
pub mod model;
pub mod occupancy;
pub mod probe;
pub mod shift;
pub mod traits;
