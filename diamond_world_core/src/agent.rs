use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, warn};

use crate::{
    EntityId, Position,
    board::{Board, GameObject},
    game::Action,
    get_direction,
    goal::select_goal,
    position_equals,
};

/// Roaming rotation: East, South, West, North.
pub const ROAM_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Trait defining the behavior of a bot.
/// Bots decide which action to take from their own object and a snapshot of the board.
pub trait Agent {
    /// Returns the id of the bot object this behavior drives.
    fn id(&self) -> EntityId;

    /// Determines the action the bot wants to perform this tick.
    /// `&mut self` allows the agent to keep state between ticks.
    fn get_action(&mut self, bot: &GameObject, board: &Board) -> Action;
}

/// A simple agent that moves in a random direction or waits.
#[derive(Debug)]
pub struct RandomWalker {
    id: EntityId,
    rng: StdRng,
}

impl RandomWalker {
    pub fn new(id: EntityId, seed: u64) -> Self {
        Self {
            id,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomWalker {
    fn id(&self) -> EntityId {
        self.id
    }

    fn get_action(&mut self, _bot: &GameObject, _board: &Board) -> Action {
        // One extra slot for waiting
        let choice = self.rng.random_range(0..=ROAM_DIRECTIONS.len());
        match ROAM_DIRECTIONS.get(choice) {
            Some(&(dx, dy)) => Action::Move { dx, dy },
            None => Action::Wait,
        }
    }
}

/// Greedy diamond collector.
///
/// Re-selects its goal every tick and takes one axis-aligned step towards it.
/// The only state kept between ticks is the goal of the last tick and the
/// cursor into [`ROAM_DIRECTIONS`].
#[derive(Debug)]
pub struct GreedyBot {
    id: EntityId,
    goal_position: Option<Position>,
    roam_cursor: usize,
}

impl GreedyBot {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            goal_position: None,
            roam_cursor: 0,
        }
    }

    pub fn goal_position(&self) -> Option<Position> {
        self.goal_position
    }

    pub fn roam_cursor(&self) -> usize {
        self.roam_cursor
    }

    /// Computes the next single-step delta for `bot`.
    ///
    /// Never fails: when no legal step exists the result is `(0, 0)`.
    pub fn next_move(&mut self, bot: &GameObject, board: &Board) -> (i32, i32) {
        let Some(props) = bot.bot_properties() else {
            warn!(
                object = bot.id,
                kind = bot.kind.type_name(),
                "next_move called on a non-bot object"
            );
            return (0, 0);
        };
        let current = bot.position;

        let goal = select_goal(current, props, board);
        debug!(bot = %props.name, ?current, ?goal, "goal selected");
        let target = goal.position();
        self.goal_position = target;

        match target {
            Some(target) if position_equals(current, target) => {
                if props.is_full() && position_equals(current, props.base) {
                    // Delivered; nothing to do until the inventory changes.
                    return (0, 0);
                }
                self.goal_position = None;
                (0, 0)
            }
            Some(target) => self.step_towards(current, target, board),
            None => self.roam(current, board),
        }
    }

    /// Direct step towards `target`, splitting into X-only and Y-only moves when blocked.
    fn step_towards(&mut self, current: Position, target: Position, board: &Board) -> (i32, i32) {
        let (dx, dy) = get_direction(current.x, current.y, target.x, target.y);

        if board.is_valid_move(current, dx, dy) {
            return (dx, dy);
        }
        if dx != 0 && board.is_valid_move(current, dx, 0) {
            return (dx, 0);
        }
        if dy != 0 && board.is_valid_move(current, 0, dy) {
            return (0, dy);
        }

        let (rx, ry) = ROAM_DIRECTIONS[self.roam_cursor];
        if board.is_valid_move(current, rx, ry) {
            debug!(?current, ?target, delta = ?(rx, ry), "path blocked, stepping aside");
            self.advance_cursor();
            (rx, ry)
        } else {
            debug!(?current, ?target, "path blocked, staying put");
            (0, 0)
        }
    }

    /// Wander using the rotation table.
    fn roam(&mut self, current: Position, board: &Board) -> (i32, i32) {
        let (dx, dy) = ROAM_DIRECTIONS[self.roam_cursor];
        if board.is_valid_move(current, dx, dy) {
            self.advance_cursor();
            return (dx, dy);
        }

        for _ in 0..ROAM_DIRECTIONS.len() {
            self.advance_cursor();
            let (dx, dy) = ROAM_DIRECTIONS[self.roam_cursor];
            if board.is_valid_move(current, dx, dy) {
                return (dx, dy);
            }
        }

        debug!(?current, "boxed in while roaming");
        (0, 0)
    }

    #[inline]
    fn advance_cursor(&mut self) {
        self.roam_cursor = (self.roam_cursor + 1) % ROAM_DIRECTIONS.len();
    }
}

impl Agent for GreedyBot {
    fn id(&self) -> EntityId {
        self.id
    }

    fn get_action(&mut self, bot: &GameObject, board: &Board) -> Action {
        let (dx, dy) = self.next_move(bot, board);
        Action::from_delta(dx, dy)
    }
}
