//! Hyprland backend.
//!
//! This module provides concrete implementations of the
//! [`DesktopHost`](crate::traits::DesktopHost) and
//! [`EventSource`](crate::traits::EventSource) traits, powered by
//! Hyprland's IPC sockets.
//!
//! Nothing outside this module should reference Hyprland directly.

pub mod events;
pub mod host;
mod ipc;

pub use events::HyprlandEventSource;
pub use host::HyprlandHost;
pub use ipc::HyprlandError;
