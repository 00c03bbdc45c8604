//! Desktop index shifting.
//!
//! Removing a desktop from the middle of the sequence is done by moving
//! every window one slot to the left from some threshold on, then dropping
//! the last desktop.  [`shift_membership`] computes the new membership of a
//! single window for that move.

use crate::model::Desktop;

/// Rebuild `membership` so that every desktop at position `threshold` or
/// later in `all` is replaced by its left neighbour.
///
/// Desktops below `threshold` are kept as they are.  Entries of
/// `membership` that are not part of `all` are dropped, since the window
/// cannot be on a desktop that no longer exists.  A threshold of `0` is a
/// no-op and returns `membership` unchanged.
///
/// The result is in `all` order and has one entry per matched membership,
/// so a window that was on desktops `i - 1` and `i` (with `i >=
/// threshold`) ends up with desktop `i - 1` twice.
pub fn shift_membership(all: &[Desktop], membership: &[Desktop], threshold: usize) -> Vec<Desktop> {
    if threshold == 0 {
        return membership.to_vec();
    }

    let mut shifted = Vec::with_capacity(membership.len());
    for (i, desktop) in all.iter().enumerate() {
        if !membership.contains(desktop) {
            continue;
        }
        if i < threshold {
            shifted.push(*desktop);
        } else {
            shifted.push(all[i - 1]);
        }
    }
    shifted
}
