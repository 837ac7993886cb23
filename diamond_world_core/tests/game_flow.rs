use diamond_world_core::{
    Position,
    board::BotProperties,
    game::{Game, GameConfig, TurnResult, load_game_from_string},
};

fn greedy(game: &Game) -> (Position, BotProperties) {
    let bot = game
        .board()
        .bots()
        .find(|bot| {
            bot.bot_properties()
                .is_some_and(|props| props.name.starts_with("greedy"))
        })
        .unwrap();
    (bot.position, bot.bot_properties().cloned().unwrap())
}

#[test]
fn fills_up_and_delivers_a_row_of_diamonds() {
    let mut game = load_game_from_string("ST BL D1 D1 D1 D1 D1", GameConfig::default()).unwrap();

    for _ in 0..6 {
        game.process_turn();
    }
    let (position, props) = greedy(&game);
    assert_eq!(position, Position::new(6, 0));
    assert_eq!(props.diamonds, 5);
    assert_eq!(game.board().diamonds().count(), 0);

    for _ in 0..6 {
        game.process_turn();
    }
    let (position, props) = greedy(&game);
    assert_eq!(position, Position::new(0, 0));
    assert_eq!((props.diamonds, props.score), (0, 5));
}

#[test]
fn walks_to_the_button_when_nothing_is_near() {
    let config = GameConfig {
        respawn_diamonds: 3,
        seed: 3,
        ..GameConfig::default()
    };
    let mut game = load_game_from_string("ST BL RB\nBL BL BL\nBL BL BL", config).unwrap();
    assert_eq!(game.board().diamonds().count(), 0);

    game.process_turn();
    game.process_turn();

    assert_eq!(greedy(&game).0, Position::new(2, 0));
    assert_eq!(game.board().diamonds().count(), 3);
}

#[test]
fn rivals_and_greedy_bots_share_a_board() {
    let config = GameConfig {
        max_turns: 50,
        seed: 42,
        ..GameConfig::default()
    };
    let map = "
        ST BL BL D1 BL
        BL WL BL BL D2
        BL BL RB BL RV
    ";
    let mut game = load_game_from_string(map, config).unwrap();
    assert_eq!(game.board().bots().count(), 2);

    let mut result = TurnResult::Running;
    while result == TurnResult::Running {
        result = game.process_turn();
    }
    assert_eq!(game.turn(), 50);

    let mut positions: Vec<Position> = game.board().bots().map(|bot| bot.position).collect();
    positions.dedup();
    assert_eq!(positions.len(), 2);
    for bot in game.board().bots() {
        let props = bot.bot_properties().unwrap();
        assert!(props.diamonds <= props.capacity());
    }
}
