//! The policy that keeps the desktop count in step with usage.
//!
//! [`DesktopController`] reacts to [`HostEvent`]s by appending a trailing
//! desktop when the last one gains a window, and by removing empty desktops
//! when the user switches away from them.
//!
//! Desktops are never removed from the middle of the sequence directly.
//! Removal shifts every window above the removed slot one position to the
//! left and then destroys the *last* desktop, which keeps pagers and
//! taskbars ordered consistently.

use crate::config::DesktopConfig;
use crate::model::{position_of, Desktop, HostEvent, Window, WindowId};
use crate::occupancy::{first_occupant, occupant_at, occupies};
use crate::shift::shift_membership;
use crate::traits::DesktopHost;
use log::{debug, info, trace, warn};
use std::collections::HashSet;

/// Possible errors from the controller.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The desktop host returned an error.
    #[error("host error: {0}")]
    Host(String),
    /// The host acknowledged removing the last desktop but still reports
    /// this many desktops.
    #[error("host still has {0} desktops after removing the last one")]
    NotRemoved(usize),
}

fn host_err(e: impl std::error::Error) -> ControllerError {
    ControllerError::Host(e.to_string())
}

/// Grows and shrinks the desktop sequence of a [`DesktopHost`].
///
/// The controller owns no copy of host state.  Every operation reads the
/// desktop sequence and window list afresh, so indices are only trusted
/// for as long as no mutation happened in between.  The only thing it
/// remembers across events is which windows it follows for desktop
/// changes.
///
/// # Typical usage
///
/// ```ignore
/// let mut controller = DesktopController::new(host, config.desktops);
/// controller.start()?;
/// for event in events {
///     controller.handle(event)?;
/// }
/// ```
pub struct DesktopController<H: DesktopHost> {
    host: H,
    config: DesktopConfig,
    subscribed: HashSet<WindowId>,
}

impl<H: DesktopHost> DesktopController<H> {
    /// Create a controller for `host`.  Nothing is read or changed until
    /// [`start`](Self::start) or [`handle`](Self::handle) is called.
    pub fn new(host: H, config: DesktopConfig) -> Self {
        Self {
            host,
            config,
            subscribed: HashSet::new(),
        }
    }

    /// The underlying host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Whether desktop changes of window `id` are being followed.
    pub fn is_subscribed(&self, id: WindowId) -> bool {
        self.subscribed.contains(&id)
    }

    /// Bring the host in line with the policy at startup.
    ///
    /// Tops the sequence up to the configured minimum, then treats every
    /// existing window as if it had just been added.
    pub fn start(&mut self) -> Result<(), ControllerError> {
        self.ensure_minimum()?;
        let windows = self.windows()?;
        info!("adopting {} existing window(s)", windows.len());
        for window in windows {
            self.on_window_added(Some(window))?;
        }
        Ok(())
    }

    /// Process a single [`HostEvent`].
    pub fn handle(&mut self, event: HostEvent) -> Result<(), ControllerError> {
        match event {
            HostEvent::WindowAdded(id) => {
                let window = self.host.window(id).map_err(host_err)?;
                if window.is_none() {
                    debug!("added window {} is already gone", id);
                }
                self.on_window_added(window)
            }
            HostEvent::WindowRemoved(id) => {
                self.on_window_removed(id);
                Ok(())
            }
            HostEvent::WindowDesktopChanged(id) => self.on_window_desktop_changed(id),
            HostEvent::ActiveDesktopChanged { previous } => self.on_desktop_switch(previous),
        }
    }

    //  Event handlers

    /// A window appeared.  `None` stands for a window the host announced
    /// but could not resolve.
    pub fn on_window_added(&mut self, window: Option<Window>) -> Result<(), ControllerError> {
        let Some(window) = window else {
            info!("window added without a window, that may happen rarely");
            return Ok(());
        };
        trace!("on_window_added({})", window);

        if window.skip_pager {
            debug!("ignoring added hidden window {}", window);
            return Ok(());
        }

        self.grow_if_on_last(&window)?;

        if self.subscribed.insert(window.id) {
            debug!("following desktop changes of {}", window);
        }
        Ok(())
    }

    /// A window went away; stop following it.
    pub fn on_window_removed(&mut self, id: WindowId) {
        if self.subscribed.remove(&id) {
            debug!("no longer following {}", id);
        }
    }

    /// The desktop membership of window `id` changed.
    pub fn on_window_desktop_changed(&mut self, id: WindowId) -> Result<(), ControllerError> {
        if !self.subscribed.contains(&id) {
            trace!("ignoring desktop change of unfollowed window {}", id);
            return Ok(());
        }
        trace!("on_window_desktop_changed({})", id);

        match self.host.window(id).map_err(host_err)? {
            Some(window) => self.grow_if_on_last(&window),
            None => {
                debug!("window {} vanished, no longer following it", id);
                self.subscribed.remove(&id);
                Ok(())
            }
        }
    }

    /// The active desktop changed away from `previous`.
    ///
    /// Runs four steps in order: collapse a vacated first desktop, remove
    /// empty desktops to the left of the current one, remove empty desktops
    /// to the right of it, and finally make sure the last desktop is free.
    pub fn on_desktop_switch(&mut self, previous: Desktop) -> Result<(), ControllerError> {
        trace!("on_desktop_switch({})", previous);

        let desktops = self.desktops()?;
        let old_index = position_of(&desktops, &previous);
        let Some(current_index) = self.current_index()? else {
            warn!("current desktop is not part of the desktop list, skipping cleanup");
            return Ok(());
        };

        if old_index == Some(0) && current_index != 0 && self.is_desktop_empty(0)? {
            self.collapse_first_desktop()?;
        }

        if let Some(current_index) = self.current_index()? {
            for index in (0..current_index).rev() {
                debug!("examining desktop {} (left)", index);
                if self.is_desktop_empty(index)? {
                    self.remove_desktop(index)?;
                }
            }
        }

        if let Some(current_index) = self.current_index()? {
            let mut index = current_index + 1;
            while index < self.desktops()?.len() {
                debug!("examining desktop {} (right)", index);
                // A successful removal slides the next desktop into `index`.
                if self.is_desktop_empty(index)? && self.remove_desktop(index)? {
                    continue;
                }
                index += 1;
            }
        }

        self.grow_if_last_occupied()
    }

    //  Operations

    /// Whether the desktop at `index` has no window of its own.
    ///
    /// Windows hidden from the pager and windows shown on all desktops do
    /// not count.  An index past the end is reported as empty.
    pub fn is_desktop_empty(&self, index: usize) -> Result<bool, ControllerError> {
        trace!("is_desktop_empty({})", index);
        let desktops = self.desktops()?;
        let windows = self.windows()?;
        match occupant_at(&desktops, &windows, index) {
            Some(window) => {
                debug!("desktop {} not empty because {} is there", index, window);
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Remove the desktop at `index`.
    ///
    /// Returns `false` without touching anything when `index` is the last
    /// desktop (or past it) or when the count is already at the minimum.
    /// Otherwise every window above `index` moves one desktop to the left,
    /// windows on `index` merge into its left neighbour, and the last
    /// desktop is destroyed.
    pub fn remove_desktop(&mut self, index: usize) -> Result<bool, ControllerError> {
        trace!("remove_desktop({})", index);

        let count = self.desktops()?.len();
        if index + 1 >= count {
            debug!("not removing desktop at end");
            return Ok(false);
        }
        if count <= self.config.minimum {
            debug!("not removing desktop, too few left");
            return Ok(false);
        }

        // Desktop 0 has no left neighbour: keep its windows in place and
        // pull everything from desktop 1 on down instead.
        let threshold = index.max(1);
        for window in self.windows()? {
            self.shift_window_left_from(&window, threshold)?;
        }
        self.delete_last_desktop(count)?;
        info!("removed desktop {}", index);
        Ok(true)
    }

    /// Move `window` one desktop to the left on every desktop at position
    /// `threshold` or later.  A threshold of `0` does nothing.
    pub fn shift_window_left_from(&self, window: &Window, threshold: usize) -> Result<(), ControllerError> {
        trace!("shift_window_left_from({}, {})", window, threshold);
        if threshold == 0 {
            return Ok(());
        }

        let desktops = self.desktops()?;
        let shifted = shift_membership(&desktops, &window.desktops, threshold);
        if shifted == window.desktops {
            return Ok(());
        }
        debug!("moving {} from {:?} to {:?}", window, window.desktops, shifted);
        self.host
            .set_window_desktops(window.id, &shifted)
            .map_err(host_err)
    }

    //  Helpers

    /// Drop a vacated first desktop by pulling every other desktop one
    /// position to the left.
    fn collapse_first_desktop(&mut self) -> Result<(), ControllerError> {
        let count = self.desktops()?.len();
        if count <= self.config.minimum {
            debug!("not collapsing first desktop, too few left");
            return Ok(());
        }
        debug!("deleting the first desktop and shifting others left");
        for window in self.windows()? {
            self.shift_window_left_from(&window, 1)?;
        }
        self.delete_last_desktop(count)?;
        info!("first desktop removed");
        Ok(())
    }

    /// Append a desktop when `window` sits on the last one.
    fn grow_if_on_last(&mut self, window: &Window) -> Result<(), ControllerError> {
        let desktops = self.desktops()?;
        if let Some(last) = desktops.last() {
            if occupies(window, last) {
                debug!("{} occupies the last desktop", window);
                self.append_desktop()?;
            }
        }
        Ok(())
    }

    /// Append a desktop when any window occupies the last one.
    fn grow_if_last_occupied(&mut self) -> Result<(), ControllerError> {
        let desktops = self.desktops()?;
        let Some(last) = desktops.last() else {
            return Ok(());
        };
        let windows = self.windows()?;
        if let Some(window) = first_occupant(&windows, last) {
            debug!("{} occupies the last desktop", window);
            self.append_desktop()?;
        }
        Ok(())
    }

    fn ensure_minimum(&mut self) -> Result<(), ControllerError> {
        let mut count = self.desktops()?.len();
        while count < self.config.minimum {
            self.append_desktop()?;
            count += 1;
        }
        Ok(())
    }

    fn append_desktop(&mut self) -> Result<(), ControllerError> {
        self.host
            .append_desktop(&self.config.label)
            .map_err(host_err)?;
        info!("desktop appended");
        Ok(())
    }

    /// Destroy the last of `count` desktops and check that it is gone.
    /// Callers loop over reindexed positions, so a desktop that stays
    /// would have them shift windows again on every pass.
    fn delete_last_desktop(&mut self, count: usize) -> Result<(), ControllerError> {
        self.host.remove_last_desktop().map_err(host_err)?;
        let left = self.desktops()?.len();
        if left >= count {
            warn!("host kept {} desktops after removing the last one", left);
            return Err(ControllerError::NotRemoved(left));
        }
        Ok(())
    }

    fn current_index(&self) -> Result<Option<usize>, ControllerError> {
        let desktops = self.desktops()?;
        let current = self.host.current_desktop().map_err(host_err)?;
        Ok(position_of(&desktops, &current))
    }

    fn desktops(&self) -> Result<Vec<Desktop>, ControllerError> {
        self.host.desktops().map_err(host_err)
    }

    fn windows(&self) -> Result<Vec<Window>, ControllerError> {
        self.host.windows().map_err(host_err)
    }
}

//  Tests
