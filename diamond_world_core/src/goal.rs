//! Goal selection for the greedy collector.
//!
//! Every tick the bot picks exactly one objective from the current board,
//! checking the rules in a fixed order and stopping at the first that applies:
//! - **ReturnToBase**: the inventory is full
//! - **PressButton**: a red button exists and no diamond is near
//! - **CollectDiamond**: the diamond with the best value per step
//! - **Roam**: nothing worth targeting

use tracing::debug;

use crate::{
    Position,
    board::{Board, BotProperties, DEFAULT_DIAMOND_POINTS},
    proximity::{distance, within_radius},
};

/// Diamonds within this Manhattan distance keep the bot from pressing the red button.
pub const BUTTON_SCAN_RADIUS: u64 = 15;

/// The objective chosen for a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    /// Head home to deposit a full inventory.
    ReturnToBase(Position),

    /// Press the red button to respawn diamonds.
    PressButton(Position),

    /// Pick up the diamond at this position.
    CollectDiamond(Position),

    /// No target; wander using the roaming rotation.
    Roam,
}

impl Goal {
    /// The target coordinate, or `None` when roaming.
    pub fn position(&self) -> Option<Position> {
        match *self {
            Goal::ReturnToBase(pos) | Goal::PressButton(pos) | Goal::CollectDiamond(pos) => {
                Some(pos)
            }
            Goal::Roam => None,
        }
    }
}

/// Picks the goal for a bot standing at `position` with the given properties.
pub fn select_goal(position: Position, bot: &BotProperties, board: &Board) -> Goal {
    let capacity = bot.capacity();

    if bot.diamonds >= capacity {
        return Goal::ReturnToBase(bot.base);
    }

    if let Some(button) = board.red_button() {
        let nearby = within_radius(position, BUTTON_SCAN_RADIUS, board.diamonds());
        if nearby.is_empty() {
            debug!(
                bot = %bot.name,
                radius = BUTTON_SCAN_RADIUS,
                "no diamonds in range, heading for red button"
            );
            return Goal::PressButton(button.position);
        }
    }

    // With a single free slot only a one-point diamond is guaranteed to fit.
    let one_slot_left = capacity.checked_sub(1) == Some(bot.diamonds);

    let mut best_score = -1.0_f64;
    let mut best = None;
    for diamond in board.diamonds() {
        let value = diamond
            .diamond_properties()
            .map(|props| props.value())
            .unwrap_or(DEFAULT_DIAMOND_POINTS);
        if one_slot_left && value != 1 {
            continue;
        }

        let steps = distance(position, diamond.position);
        let score = if steps == 0 {
            f64::INFINITY
        } else {
            f64::from(value) / steps as f64
        };

        if score > best_score {
            best_score = score;
            best = Some(diamond.position);
        }
    }

    match best {
        Some(target) => Goal::CollectDiamond(target),
        None => Goal::Roam,
    }
}
