use serde::{Deserialize, Serialize};

pub mod agent;
pub mod board;
pub mod game;
pub mod goal;
pub mod map;
pub mod proximity;

/// Unique identifier for game objects (bots, diamonds, bases, buttons).
pub type EntityId = usize;

/// Represents a 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Returns the position one step away by `(dx, dy)`.
    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Structural equality of two positions.
#[inline]
pub fn position_equals(a: Position, b: Position) -> bool {
    a == b
}

/// Returns a unit-or-zero step per axis pointing from `(x1, y1)` towards `(x2, y2)`.
///
/// Both axes are stepped, so the result is diagonal whenever the positions
/// differ on both axes. Boards only accept axis-aligned moves, which leaves
/// it to the caller to split a diagonal into its X and Y parts.
#[inline]
pub fn get_direction(x1: i32, y1: i32, x2: i32, y2: i32) -> (i32, i32) {
    ((x2 - x1).signum(), (y2 - y1).signum())
}
