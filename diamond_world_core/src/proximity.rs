//! Distance helpers used when ranking targets.

use crate::{Position, board::GameObject};

/// Manhattan distance between two positions.
///
/// Widened to `u64` so any pair of `i32` coordinates fits.
#[inline]
pub fn distance(a: Position, b: Position) -> u64 {
    u64::from(a.x.abs_diff(b.x)) + u64::from(a.y.abs_diff(b.y))
}

/// Returns every object within `radius` (inclusive) of `center`, in input order.
pub fn within_radius<'a, I>(center: Position, radius: u64, items: I) -> Vec<&'a GameObject>
where
    I: IntoIterator<Item = &'a GameObject>,
{
    items
        .into_iter()
        .filter(|item| distance(center, item.position) <= radius)
        .collect()
}
