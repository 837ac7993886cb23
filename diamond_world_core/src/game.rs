use std::collections::BTreeMap;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    EntityId, Position,
    agent::{Agent, GreedyBot, RandomWalker},
    board::{Board, BoardError, BotProperties, CellType, DiamondProperties, GameObjectKind},
};

/// Represents actions a bot can decide to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Wait,
    Move { dx: i32, dy: i32 },
}

impl Action {
    /// `(0, 0)` becomes [`Action::Wait`], anything else a move.
    pub fn from_delta(dx: i32, dy: i32) -> Self {
        if dx == 0 && dy == 0 {
            Action::Wait
        } else {
            Action::Move { dx, dy }
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Wait => (0, 0),
            Action::Move { dx, dy } => (dx, dy),
        }
    }
}

/// What happened when the host applied an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Waited,
    Moved,
    Collected { points: u32 },
    Deposited { points: u32 },
    PressedButton,
}

/// Represents reasons the host refuses an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("Bot {0} not found")]
    UnknownBot(EntityId),
    #[error("Object {0} is not a bot")]
    NotABot(EntityId),
    #[error("Move ({dx}, {dy}) from ({x}, {y}) is not allowed")]
    InvalidMove { x: i32, y: i32, dx: i32, dy: i32 },
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Represents errors raised while loading a map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("Map string is empty")]
    Empty,
    #[error("Map has zero width")]
    ZeroWidth,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    InconsistentWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown map code '{token}' at position ({x}, {y})")]
    UnknownToken { token: String, x: usize, y: usize },
    #[error("No spawn ('ST' or 'RV') found in map")]
    NoSpawn,
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Tunables for a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for diamond respawns and random rivals.
    pub seed: u64,
    /// The game ends after this many turns.
    pub max_turns: u32,
    /// Diamonds placed when the red button is pressed.
    pub respawn_diamonds: usize,
    /// Probability that a respawned diamond is worth two points.
    pub red_diamond_chance: f64,
    /// Capacity given to every bot; `None` leaves bots on the default.
    pub inventory_size: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_turns: 300,
            respawn_diamonds: 10,
            red_diamond_chance: 0.2,
            inventory_size: None,
        }
    }
}

/// State of the game after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnResult {
    Running,
    Finished,
}

/// Runs a game: owns the board, asks bots for actions and applies them.
pub struct Game {
    board: Board,
    agents: BTreeMap<EntityId, Box<dyn Agent>>,
    rng: StdRng,
    config: GameConfig,
    turn: u32,
}

impl Game {
    pub fn new(board: Board, config: GameConfig) -> Self {
        Game {
            board,
            agents: BTreeMap::new(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            turn: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_finished(&self) -> bool {
        self.turn >= self.config.max_turns
    }

    /// Places a bot with its base under it and attaches the behavior built by `make_agent`.
    pub fn add_bot<F>(
        &mut self,
        name: impl Into<String>,
        position: Position,
        make_agent: F,
    ) -> Result<EntityId, BoardError>
    where
        F: FnOnce(EntityId) -> Box<dyn Agent>,
    {
        let mut props = BotProperties::new(name, position);
        props.inventory_size = self.config.inventory_size;
        let id = self.board.add_object(position, GameObjectKind::Bot(props))?;
        self.board
            .add_object(position, GameObjectKind::Base { owner: id })?;
        self.agents.insert(id, make_agent(id));
        Ok(id)
    }

    /// Processes one turn for all bots, in id order.
    pub fn process_turn(&mut self) -> TurnResult {
        if self.is_finished() {
            return TurnResult::Finished;
        }

        let bot_ids: Vec<EntityId> = self.agents.keys().copied().collect();
        for bot_id in bot_ids {
            // Each bot sees the board as left by the bots before it.
            let Some(bot) = self.board.object(bot_id).cloned() else {
                continue;
            };
            let Some(behavior) = self.agents.get_mut(&bot_id) else {
                continue;
            };
            let action = behavior.get_action(&bot, &self.board);
            match self.process_action(bot_id, action) {
                Ok(outcome) => debug!(bot = bot_id, ?action, ?outcome, "action applied"),
                Err(err) => debug!(bot = bot_id, ?action, %err, "action rejected"),
            }
        }

        self.turn += 1;
        if self.is_finished() {
            for bot in self.board.bots() {
                if let Some(props) = bot.bot_properties() {
                    info!(bot = %props.name, score = props.score, "final score");
                }
            }
            TurnResult::Finished
        } else {
            TurnResult::Running
        }
    }

    /// Applies a single action for the given bot.
    pub fn process_action(
        &mut self,
        bot_id: EntityId,
        action: Action,
    ) -> Result<ActionOutcome, ActionError> {
        let bot = self
            .board
            .object(bot_id)
            .ok_or(ActionError::UnknownBot(bot_id))?;
        if !bot.is_bot() {
            return Err(ActionError::NotABot(bot_id));
        }
        let from = bot.position;

        let (dx, dy) = action.delta();
        if action == Action::Wait {
            return Ok(ActionOutcome::Waited);
        }
        if !self.board.is_valid_move(from, dx, dy) {
            return Err(ActionError::InvalidMove {
                x: from.x,
                y: from.y,
                dx,
                dy,
            });
        }
        let to = from.offset(dx, dy);
        self.board.move_object(bot_id, to)?;
        self.interact(bot_id, to)
    }

    /// Applies the effect of whatever the bot just stepped onto.
    fn interact(&mut self, bot_id: EntityId, at: Position) -> Result<ActionOutcome, ActionError> {
        let tile: Vec<(EntityId, GameObjectKind)> = self
            .board
            .objects_at(at)
            .filter(|obj| obj.id != bot_id)
            .map(|obj| (obj.id, obj.kind.clone()))
            .collect();

        for (object_id, kind) in tile {
            match kind {
                GameObjectKind::Diamond(diamond) => {
                    if let Some(points) = self.collect(bot_id, object_id, diamond)? {
                        return Ok(ActionOutcome::Collected { points });
                    }
                }
                GameObjectKind::Base { owner } if owner == bot_id => {
                    if let Some(points) = self.deposit(bot_id)? {
                        return Ok(ActionOutcome::Deposited { points });
                    }
                }
                GameObjectKind::RedButton => {
                    self.press_button(object_id)?;
                    return Ok(ActionOutcome::PressedButton);
                }
                GameObjectKind::Base { .. } | GameObjectKind::Bot(_) => {}
            }
        }
        Ok(ActionOutcome::Moved)
    }

    /// Picks up a diamond if it fits in the inventory.
    fn collect(
        &mut self,
        bot_id: EntityId,
        diamond_id: EntityId,
        diamond: DiamondProperties,
    ) -> Result<Option<u32>, ActionError> {
        let points = diamond.value();
        let props = self
            .board
            .object_mut(bot_id)
            .and_then(|obj| obj.bot_properties_mut())
            .ok_or(ActionError::NotABot(bot_id))?;
        if props.diamonds + points > props.capacity() {
            return Ok(None);
        }
        props.diamonds += points;
        info!(bot = %props.name, points, carried = props.diamonds, "diamond collected");
        self.board.remove_object(diamond_id)?;
        Ok(Some(points))
    }

    /// Moves carried diamonds into the score.
    fn deposit(&mut self, bot_id: EntityId) -> Result<Option<u32>, ActionError> {
        let props = self
            .board
            .object_mut(bot_id)
            .and_then(|obj| obj.bot_properties_mut())
            .ok_or(ActionError::NotABot(bot_id))?;
        if props.diamonds == 0 {
            return Ok(None);
        }
        let points = std::mem::take(&mut props.diamonds);
        props.score += points;
        info!(bot = %props.name, points, score = props.score, "diamonds deposited");
        Ok(Some(points))
    }

    /// Clears every diamond, scatters fresh ones and moves the button.
    fn press_button(&mut self, button_id: EntityId) -> Result<(), ActionError> {
        let old: Vec<EntityId> = self.board.diamonds().map(|obj| obj.id).collect();
        for id in old {
            self.board.remove_object(id)?;
        }

        let mut free: Vec<Position> = self
            .board
            .terrain()
            .enumerate()
            .map(|(pos, _)| pos)
            .filter(|pos| self.board.is_empty_floor(*pos))
            .collect();
        free.shuffle(&mut self.rng);

        if let Some(pos) = free.pop() {
            self.board.move_object(button_id, pos)?;
        }

        let chance = self.config.red_diamond_chance.clamp(0.0, 1.0);
        let count = self.config.respawn_diamonds.min(free.len());
        for pos in free.into_iter().take(count) {
            let points = if self.rng.random_bool(chance) { 2 } else { 1 };
            self.board.add_object(
                pos,
                GameObjectKind::Diamond(DiamondProperties {
                    points: Some(points),
                }),
            )?;
        }
        info!(respawned = count, "red button pressed");
        Ok(())
    }
}

/// Where a bot starts, and which behavior drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawn {
    Greedy(Position),
    Rival(Position),
}

/// Parses a map into a board and its spawn points.
///
/// Tokens are whitespace separated, one per tile:
/// `BL` floor, `WL` wall, `ST` greedy bot, `RV` random rival,
/// `D1`/`D2` diamonds worth 1/2 points, `DX` diamond without points, `RB` red button.
pub fn parse_map(map_string: &str) -> Result<(Board, Vec<Spawn>), MapError> {
    let lines: Vec<&str> = map_string.trim().lines().collect();
    if lines.is_empty() {
        return Err(MapError::Empty);
    }

    let height = lines.len();
    let mut width = 0;
    let mut parsed_rows: Vec<Vec<&str>> = Vec::with_capacity(height);

    for (y, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if y == 0 {
            width = tokens.len();
            if width == 0 {
                return Err(MapError::ZeroWidth);
            }
        } else if tokens.len() != width {
            return Err(MapError::InconsistentWidth {
                row: y,
                expected: width,
                found: tokens.len(),
            });
        }
        parsed_rows.push(tokens);
    }

    let mut board = Board::new(width, height);
    let mut spawns = Vec::new();

    for (y, row_tokens) in parsed_rows.iter().enumerate() {
        for (x, token) in row_tokens.iter().enumerate() {
            let pos = Position::new(x as i32, y as i32);
            let object = match *token {
                "BL" => None,
                "WL" => {
                    board.set_cell(pos, CellType::Wall)?;
                    None
                }
                "ST" => {
                    spawns.push(Spawn::Greedy(pos));
                    None
                }
                "RV" => {
                    spawns.push(Spawn::Rival(pos));
                    None
                }
                "D1" => Some(diamond(Some(1))),
                "D2" => Some(diamond(Some(2))),
                "DX" => Some(diamond(None)),
                "RB" => Some(GameObjectKind::RedButton),
                unknown => {
                    return Err(MapError::UnknownToken {
                        token: unknown.to_string(),
                        x,
                        y,
                    });
                }
            };
            if let Some(kind) = object {
                board.add_object(pos, kind)?;
            }
        }
    }

    if spawns.is_empty() {
        return Err(MapError::NoSpawn);
    }
    Ok((board, spawns))
}

fn diamond(points: Option<u32>) -> GameObjectKind {
    GameObjectKind::Diamond(DiamondProperties { points })
}

/// Loads a ready-to-run game from a map string.
///
/// Greedy bots are named `greedy-N` and rivals `rival-N`, numbered in map order.
pub fn load_game_from_string(map_string: &str, config: GameConfig) -> Result<Game, MapError> {
    let (board, spawns) = parse_map(map_string)?;
    let seed = config.seed;
    let mut game = Game::new(board, config);

    let (mut greedy_count, mut rival_count) = (0, 0);
    for spawn in spawns {
        match spawn {
            Spawn::Greedy(pos) => {
                greedy_count += 1;
                game.add_bot(format!("greedy-{greedy_count}"), pos, |id| -> Box<dyn Agent> {
                    Box::new(GreedyBot::new(id))
                })?;
            }
            Spawn::Rival(pos) => {
                rival_count += 1;
                game.add_bot(format!("rival-{rival_count}"), pos, |id| -> Box<dyn Agent> {
                    Box::new(RandomWalker::new(id, seed.wrapping_add(id as u64)))
                })?;
            }
        }
    }
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_MAP: &str = "
        ST BL D1 BL
        BL WL BL D2
        BL BL BL RB
    ";

    fn greedy_props(game: &Game) -> BotProperties {
        game.board()
            .bots()
            .next()
            .and_then(|bot| bot.bot_properties())
            .cloned()
            .unwrap()
    }

    #[test]
    fn action_delta_round_trip_of_wait() {
        assert_eq!(Action::from_delta(0, 0), Action::Wait);
        assert_eq!(Action::from_delta(0, -1), Action::Move { dx: 0, dy: -1 });
        assert_eq!(Action::Wait.delta(), (0, 0));
    }

    #[test]
    fn parse_map_places_terrain_and_objects() {
        let (board, spawns) = parse_map(SMALL_MAP).unwrap();
        assert_eq!((board.width(), board.height()), (4, 3));
        assert_eq!(spawns, vec![Spawn::Greedy(Position::new(0, 0))]);
        assert_eq!(board.terrain()[Position::new(1, 1)], CellType::Wall);
        assert_eq!(board.diamonds().count(), 2);
        assert_eq!(
            board.red_button().map(|b| b.position),
            Some(Position::new(3, 2))
        );
    }

    #[test]
    fn parse_map_reports_bad_input() {
        assert_eq!(parse_map("  \n "), Err(MapError::Empty));
        assert_eq!(
            parse_map("ST BL\nBL"),
            Err(MapError::InconsistentWidth {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            parse_map("ST ZZ"),
            Err(MapError::UnknownToken {
                token: "ZZ".to_string(),
                x: 1,
                y: 0
            })
        );
        assert_eq!(parse_map("BL D1"), Err(MapError::NoSpawn));
    }

    #[test]
    fn bots_spawn_on_their_base() {
        let game = load_game_from_string(SMALL_MAP, GameConfig::default()).unwrap();
        let bot = game.board().bots().next().unwrap();
        let props = bot.bot_properties().unwrap();
        assert_eq!(props.name, "greedy-1");
        assert_eq!(props.base, Position::new(0, 0));
        assert!(game.board().objects_at(Position::new(0, 0)).any(
            |obj| matches!(obj.kind, GameObjectKind::Base { owner } if owner == bot.id)
        ));
    }

    #[test]
    fn invalid_moves_are_rejected() {
        let mut game = load_game_from_string(SMALL_MAP, GameConfig::default()).unwrap();
        let id = game.board().bots().next().unwrap().id;
        assert_eq!(
            game.process_action(id, Action::Move { dx: -1, dy: 0 }),
            Err(ActionError::InvalidMove {
                x: 0,
                y: 0,
                dx: -1,
                dy: 0
            })
        );
        assert_eq!(
            game.process_action(id, Action::Wait),
            Ok(ActionOutcome::Waited)
        );
        assert_eq!(
            game.process_action(999, Action::Wait),
            Err(ActionError::UnknownBot(999))
        );
    }

    #[test]
    fn huge_move_deltas_are_rejected() {
        let mut game = load_game_from_string(SMALL_MAP, GameConfig::default()).unwrap();
        let id = game.board().bots().next().unwrap().id;
        for (dx, dy) in [(i32::MAX, 1), (i32::MIN, 0), (0, i32::MIN)] {
            assert_eq!(
                game.process_action(id, Action::Move { dx, dy }),
                Err(ActionError::InvalidMove { x: 0, y: 0, dx, dy })
            );
        }
        assert_eq!(game.board().object(id).unwrap().position, Position::new(0, 0));
    }

    #[test]
    fn collecting_and_depositing_scores_points() {
        let mut game = load_game_from_string(SMALL_MAP, GameConfig::default()).unwrap();
        let id = game.board().bots().next().unwrap().id;
        let right = Action::Move { dx: 1, dy: 0 };
        let left = Action::Move { dx: -1, dy: 0 };

        assert_eq!(game.process_action(id, right), Ok(ActionOutcome::Moved));
        assert_eq!(
            game.process_action(id, right),
            Ok(ActionOutcome::Collected { points: 1 })
        );
        assert_eq!(greedy_props(&game).diamonds, 1);
        assert_eq!(game.board().diamonds().count(), 1);

        game.process_action(id, left).unwrap();
        assert_eq!(
            game.process_action(id, left),
            Ok(ActionOutcome::Deposited { points: 1 })
        );
        let props = greedy_props(&game);
        assert_eq!((props.diamonds, props.score), (0, 1));
    }

    #[test]
    fn diamonds_that_do_not_fit_stay_on_the_board() {
        let config = GameConfig {
            inventory_size: Some(1),
            ..GameConfig::default()
        };
        let mut game = load_game_from_string("ST D2", config).unwrap();
        let id = game.board().bots().next().unwrap().id;
        assert_eq!(
            game.process_action(id, Action::Move { dx: 1, dy: 0 }),
            Ok(ActionOutcome::Moved)
        );
        assert_eq!(game.board().diamonds().count(), 1);
        assert_eq!(greedy_props(&game).diamonds, 0);
    }

    #[test]
    fn pressing_the_button_respawns_diamonds() {
        let config = GameConfig {
            respawn_diamonds: 3,
            seed: 11,
            ..GameConfig::default()
        };
        let mut game = load_game_from_string("ST RB D1\nBL BL BL\nBL BL BL", config).unwrap();
        let id = game.board().bots().next().unwrap().id;

        assert_eq!(
            game.process_action(id, Action::Move { dx: 1, dy: 0 }),
            Ok(ActionOutcome::PressedButton)
        );
        let board = game.board();
        assert_eq!(board.diamonds().count(), 3);
        let button = board.red_button().unwrap().position;
        assert_ne!(button, Position::new(1, 0));
        assert!(board.diamonds().all(|d| d.position != button
            && d.position != Position::new(1, 0)
            && d.position != Position::new(0, 0)));
    }

    #[test]
    fn game_finishes_after_max_turns() {
        let config = GameConfig {
            max_turns: 2,
            ..GameConfig::default()
        };
        let mut game = load_game_from_string("ST BL BL", config).unwrap();
        assert_eq!(game.process_turn(), TurnResult::Running);
        assert_eq!(game.process_turn(), TurnResult::Finished);
        assert!(game.is_finished());
        assert_eq!(game.process_turn(), TurnResult::Finished);
        assert_eq!(game.turn(), 2);
    }
}
