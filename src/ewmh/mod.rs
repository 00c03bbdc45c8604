//! Backend for X11 window managers that follow the Extended Window Manager
//! Hints.

mod atoms;
mod connection;
pub mod events;
pub mod host;

pub use connection::EwmhError;
pub use events::EwmhEventSource;
pub use host::EwmhHost;
