//! Desktop occupancy.
//!
//! A desktop is *occupied* when at least one window that is neither
//! hidden from the pager nor shown on every desktop is a member of it.

use crate::model::{Desktop, Window};

/// Whether `window` counts as occupying `desktop`.
pub fn occupies(window: &Window, desktop: &Desktop) -> bool {
    !window.skip_pager && !window.on_all_desktops && window.is_on(desktop)
}

/// The first window in `windows` that occupies `desktop`, if any.
pub fn first_occupant<'a>(windows: &'a [Window], desktop: &Desktop) -> Option<&'a Window> {
    windows.iter().find(|w| occupies(w, desktop))
}

/// The first window occupying the desktop at `index` of `desktops`.
///
/// An index past the end resolves to no desktop, which nothing can be on,
/// so it has no occupant.
pub fn occupant_at<'a>(desktops: &[Desktop], windows: &'a [Window], index: usize) -> Option<&'a Window> {
    desktops
        .get(index)
        .and_then(|desktop| first_occupant(windows, desktop))
}
