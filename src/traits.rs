//! Core traits that decouple dynadesk from any specific window manager.
//!
//! Every concrete backend (Hyprland, EWMH, a test harness, …) implements
//! both traits.  The [`DesktopController`](crate::controller::DesktopController)
//! only depends on [`DesktopHost`]; the event loop in `main` only depends on
//! [`EventSource`].

use crate::model::{Desktop, HostEvent, Window, WindowId};
use std::sync::mpsc;

/// Live access to a window manager's desktops and windows.
///
/// Every read returns a fresh snapshot.  Implementations must not cache
/// the desktop sequence or the window list between calls: the controller
/// mutates both and reads them back within the same event.
pub trait DesktopHost {
    /// The error type produced by this host.
    type Error: std::error::Error + Send + 'static;

    /// All desktops in pager order.
    fn desktops(&self) -> Result<Vec<Desktop>, Self::Error>;

    /// The desktop currently shown.
    fn current_desktop(&self) -> Result<Desktop, Self::Error>;

    /// Create one new desktop at the end of the sequence.
    fn append_desktop(&self, label: &str) -> Result<(), Self::Error>;

    /// Destroy the last desktop in the sequence.
    fn remove_last_desktop(&self) -> Result<(), Self::Error>;

    /// All managed windows.
    fn windows(&self) -> Result<Vec<Window>, Self::Error>;

    /// Look up a single window, or `None` if the host no longer knows it.
    fn window(&self, id: WindowId) -> Result<Option<Window>, Self::Error>;

    /// Replace the desktop membership of window `id`.
    ///
    /// Hosts that only support a single desktop per window use the first
    /// entry.  An empty list leaves the window where it is.
    fn set_window_desktops(&self, id: WindowId, desktops: &[Desktop]) -> Result<(), Self::Error>;
}

/// A source of [`HostEvent`]s.
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each event must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every [`HostEvent`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<HostEvent>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[derive(Debug, thiserror::Error)]
    #[error("mock error")]
    struct MockError;

    /// A test double that emits a fixed sequence of events.
    struct MockSource {
        events: Vec<HostEvent>,
    }

    impl EventSource for MockSource {
        type Error = MockError;

        fn run(&mut self, sink: mpsc::Sender<HostEvent>) -> Result<(), MockError> {
            for event in self.events.drain(..) {
                let _ = sink.send(event);
            }
            Ok(())
        }
    }

    #[test]
    fn mock_source_emits_events_in_order() {
        let mut src = MockSource {
            events: vec![
                HostEvent::WindowAdded(WindowId(1)),
                HostEvent::ActiveDesktopChanged {
                    previous: Desktop(0),
                },
            ],
        };
        let (tx, rx) = mpsc::channel();
        src.run(tx).unwrap();
        let events: Vec<HostEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], HostEvent::WindowAdded(WindowId(1)));
        assert_eq!(
            events[1],
            HostEvent::ActiveDesktopChanged {
                previous: Desktop(0)
            }
        );
    }
}
