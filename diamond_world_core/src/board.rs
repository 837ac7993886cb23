use serde::{Deserialize, Serialize};

use crate::{
    EntityId, Position,
    map::{Grid, GridError},
};

/// Capacity assumed for bots that do not report an inventory size.
pub const DEFAULT_INVENTORY_SIZE: u32 = 5;

/// Value assumed for diamonds that do not report a points value.
pub const DEFAULT_DIAMOND_POINTS: u32 = 1;

/// Represents errors raised while building or mutating a board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("Cannot place an object inside a wall at ({x}, {y})")]
    Wall { x: i32, y: i32 },
    #[error("Position ({x}, {y}) is already occupied by bot {occupant}")]
    Occupied { x: i32, y: i32, occupant: EntityId },
    #[error("No game object with id {0}")]
    UnknownObject(EntityId),
}

/// Represents the static type of a cell in the board terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Floor,
    Wall,
}

/// State carried by a bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotProperties {
    pub name: String,
    /// Carrying capacity; [`DEFAULT_INVENTORY_SIZE`] when unset.
    pub inventory_size: Option<u32>,
    /// Points worth of diamonds currently carried.
    pub diamonds: u32,
    pub base: Position,
    pub score: u32,
}

impl BotProperties {
    pub fn new(name: impl Into<String>, base: Position) -> Self {
        Self {
            name: name.into(),
            inventory_size: None,
            diamonds: 0,
            base,
            score: 0,
        }
    }

    /// The inventory size, or the default capacity when the bot reports none.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.inventory_size.unwrap_or(DEFAULT_INVENTORY_SIZE)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.diamonds >= self.capacity()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiamondProperties {
    pub points: Option<u32>,
}

impl DiamondProperties {
    /// The points value, or [`DEFAULT_DIAMOND_POINTS`] when unset.
    #[inline]
    pub fn value(&self) -> u32 {
        self.points.unwrap_or(DEFAULT_DIAMOND_POINTS)
    }
}

/// The kind of a game object together with its kind-specific properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties")]
pub enum GameObjectKind {
    #[serde(rename = "DiamondGameObject")]
    Diamond(DiamondProperties),
    #[serde(rename = "RedButtonGameObject")]
    RedButton,
    #[serde(rename = "BotGameObject")]
    Bot(BotProperties),
    #[serde(rename = "BaseGameObject")]
    Base { owner: EntityId },
}

impl GameObjectKind {
    /// The type name the game host uses for this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            GameObjectKind::Diamond(_) => "DiamondGameObject",
            GameObjectKind::RedButton => "RedButtonGameObject",
            GameObjectKind::Bot(_) => "BotGameObject",
            GameObjectKind::Base { .. } => "BaseGameObject",
        }
    }
}

/// An entity present on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameObject {
    pub id: EntityId,
    pub position: Position,
    #[serde(flatten)]
    pub kind: GameObjectKind,
}

impl GameObject {
    pub fn is_diamond(&self) -> bool {
        matches!(self.kind, GameObjectKind::Diamond(_))
    }

    pub fn is_bot(&self) -> bool {
        matches!(self.kind, GameObjectKind::Bot(_))
    }

    pub fn bot_properties(&self) -> Option<&BotProperties> {
        match &self.kind {
            GameObjectKind::Bot(props) => Some(props),
            _ => None,
        }
    }

    pub fn bot_properties_mut(&mut self) -> Option<&mut BotProperties> {
        match &mut self.kind {
            GameObjectKind::Bot(props) => Some(props),
            _ => None,
        }
    }

    pub fn diamond_properties(&self) -> Option<&DiamondProperties> {
        match &self.kind {
            GameObjectKind::Diamond(props) => Some(props),
            _ => None,
        }
    }
}

/// Terrain plus every game object currently present.
///
/// Bots receive the board as a read-only snapshot; only the game host mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    terrain: Grid<CellType>,
    game_objects: Vec<GameObject>,
    next_entity_id: EntityId,
}

impl Board {
    /// Creates an empty all-floor board.
    pub fn new(width: usize, height: usize) -> Self {
        Board {
            terrain: Grid::new(width, height),
            game_objects: Vec::new(),
            next_entity_id: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.terrain.width()
    }

    pub fn height(&self) -> usize {
        self.terrain.height()
    }

    pub fn terrain(&self) -> &Grid<CellType> {
        &self.terrain
    }

    pub fn set_cell(&mut self, position: Position, cell: CellType) -> Result<(), BoardError> {
        self.terrain.set(position, cell)?;
        Ok(())
    }

    /// All objects on the board, in insertion order.
    pub fn game_objects(&self) -> &[GameObject] {
        &self.game_objects
    }

    /// Places a new object and returns its id.
    ///
    /// Objects may share a tile (a bot standing on its base or a diamond),
    /// but never two bots.
    pub fn add_object(
        &mut self,
        position: Position,
        kind: GameObjectKind,
    ) -> Result<EntityId, BoardError> {
        match self.terrain.get(position) {
            None => {
                return Err(GridError::OutOfBounds {
                    x: position.x,
                    y: position.y,
                    width: self.width(),
                    height: self.height(),
                }
                .into());
            }
            Some(CellType::Wall) => {
                return Err(BoardError::Wall {
                    x: position.x,
                    y: position.y,
                });
            }
            Some(CellType::Floor) => {}
        }
        if matches!(kind, GameObjectKind::Bot(_)) {
            if let Some(occupant) = self.bot_at(position) {
                return Err(BoardError::Occupied {
                    x: position.x,
                    y: position.y,
                    occupant: occupant.id,
                });
            }
        }

        let id = self.next_entity_id;
        self.next_entity_id += 1;
        self.game_objects.push(GameObject { id, position, kind });
        Ok(id)
    }

    pub fn remove_object(&mut self, id: EntityId) -> Result<GameObject, BoardError> {
        let index = self
            .game_objects
            .iter()
            .position(|obj| obj.id == id)
            .ok_or(BoardError::UnknownObject(id))?;
        Ok(self.game_objects.remove(index))
    }

    /// Relocates an object without any validity checks.
    pub fn move_object(&mut self, id: EntityId, to: Position) -> Result<(), BoardError> {
        let object = self.object_mut(id).ok_or(BoardError::UnknownObject(id))?;
        object.position = to;
        Ok(())
    }

    pub fn object(&self, id: EntityId) -> Option<&GameObject> {
        self.game_objects.iter().find(|obj| obj.id == id)
    }

    pub fn object_mut(&mut self, id: EntityId) -> Option<&mut GameObject> {
        self.game_objects.iter_mut().find(|obj| obj.id == id)
    }

    pub fn objects_at(&self, position: Position) -> impl Iterator<Item = &GameObject> {
        self.game_objects
            .iter()
            .filter(move |obj| obj.position == position)
    }

    pub fn bot_at(&self, position: Position) -> Option<&GameObject> {
        self.objects_at(position).find(|obj| obj.is_bot())
    }

    pub fn diamonds(&self) -> impl Iterator<Item = &GameObject> {
        self.game_objects.iter().filter(|obj| obj.is_diamond())
    }

    pub fn bots(&self) -> impl Iterator<Item = &GameObject> {
        self.game_objects.iter().filter(|obj| obj.is_bot())
    }

    /// The first red button on the board, if any.
    pub fn red_button(&self) -> Option<&GameObject> {
        self.game_objects
            .iter()
            .find(|obj| matches!(obj.kind, GameObjectKind::RedButton))
    }

    /// Whether a one-step move from `position` by `(dx, dy)` is legal.
    ///
    /// Exactly one axis must move by one. The target must be inside the board,
    /// must not be a wall and must not hold a bot.
    pub fn is_valid_move(&self, position: Position, dx: i32, dy: i32) -> bool {
        if !matches!((dx, dy), (-1 | 1, 0) | (0, -1 | 1)) {
            return false;
        }
        let target = position.offset(dx, dy);
        match self.terrain.get(target) {
            Some(CellType::Floor) => self.bot_at(target).is_none(),
            Some(CellType::Wall) | None => false,
        }
    }

    /// Whether `position` is a floor tile with no object on it.
    pub fn is_empty_floor(&self, position: Position) -> bool {
        matches!(self.terrain.get(position), Some(CellType::Floor))
            && self.objects_at(position).next().is_none()
    }
}
