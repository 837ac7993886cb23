use diamond_world_core::{
    Position,
    agent::GreedyBot,
    board::{Board, BotProperties, CellType, DiamondProperties, GameObject, GameObjectKind},
    goal::{BUTTON_SCAN_RADIUS, Goal, select_goal},
};

fn diamond(board: &mut Board, x: i32, y: i32, points: u32) {
    board
        .add_object(
            Position::new(x, y),
            GameObjectKind::Diamond(DiamondProperties {
                points: Some(points),
            }),
        )
        .unwrap();
}

fn bot(board: &mut Board, at: Position, base: Position, diamonds: u32) -> GameObject {
    let mut props = BotProperties::new("scenario", base);
    props.diamonds = diamonds;
    let id = board.add_object(at, GameObjectKind::Bot(props)).unwrap();
    board.object(id).unwrap().clone()
}

#[test]
fn picks_highest_value_per_step_and_steps_east() {
    let mut board = Board::new(10, 10);
    diamond(&mut board, 2, 0, 4);
    diamond(&mut board, 0, 3, 3);
    let me = bot(&mut board, Position::new(0, 0), Position::new(9, 9), 0);

    let mut greedy = GreedyBot::new(me.id);
    assert_eq!(greedy.next_move(&me, &board), (1, 0));
    assert_eq!(greedy.goal_position(), Some(Position::new(2, 0)));
}

#[test]
fn full_bot_on_base_stays_still() {
    let mut board = Board::new(10, 10);
    diamond(&mut board, 5, 6, 1);
    board
        .add_object(Position::new(0, 0), GameObjectKind::RedButton)
        .unwrap();
    let me = bot(&mut board, Position::new(5, 5), Position::new(5, 5), 5);

    let mut greedy = GreedyBot::new(me.id);
    assert_eq!(greedy.next_move(&me, &board), (0, 0));
    assert_eq!(greedy.next_move(&me, &board), (0, 0));
    assert_eq!(greedy.roam_cursor(), 0);
}

#[test]
fn button_beats_far_valuable_diamonds() {
    let mut board = Board::new(40, 40);
    diamond(&mut board, BUTTON_SCAN_RADIUS as i32 + 1, 0, 5);
    board
        .add_object(Position::new(0, 30), GameObjectKind::RedButton)
        .unwrap();
    let me = bot(&mut board, Position::new(0, 0), Position::new(0, 0), 0);
    let props = me.bot_properties().unwrap();

    assert_eq!(
        select_goal(me.position, props, &board),
        Goal::PressButton(Position::new(0, 30))
    );
}

#[test]
fn blocked_direct_step_uses_x_only_move() {
    let mut board = Board::new(6, 6);
    diamond(&mut board, 3, 3, 1);
    // Blocks the Y-only step so only X remains.
    board.set_cell(Position::new(1, 2), CellType::Wall).unwrap();
    let me = bot(&mut board, Position::new(1, 1), Position::new(0, 0), 0);

    let mut greedy = GreedyBot::new(me.id);
    assert_eq!(greedy.next_move(&me, &board), (1, 0));
    assert_eq!(greedy.roam_cursor(), 0);
}

#[test]
fn roaming_lands_on_the_fourth_direction() {
    let mut board = Board::new(3, 3);
    for (x, y) in [(2, 1), (1, 2), (0, 1)] {
        board.set_cell(Position::new(x, y), CellType::Wall).unwrap();
    }
    let me = bot(&mut board, Position::new(1, 1), Position::new(1, 1), 0);

    let mut greedy = GreedyBot::new(me.id);
    assert_eq!(greedy.next_move(&me, &board), (0, -1));
    assert_eq!(greedy.roam_cursor(), 3);
    assert_eq!(greedy.goal_position(), None);
}

#[test]
fn one_free_slot_never_targets_valuable_diamonds() {
    let mut board = Board::new(10, 10);
    diamond(&mut board, 1, 0, 2);
    diamond(&mut board, 0, 1, 5);
    let me = bot(&mut board, Position::new(0, 0), Position::new(9, 9), 4);

    let mut greedy = GreedyBot::new(me.id);
    assert_eq!(greedy.next_move(&me, &board), (1, 0));
    assert_eq!(greedy.goal_position(), None);
}

#[test]
fn separate_bots_keep_separate_state() {
    let mut board = Board::new(5, 5);
    let a = bot(&mut board, Position::new(1, 1), Position::new(1, 1), 0);
    let b = bot(&mut board, Position::new(3, 3), Position::new(3, 3), 0);

    let mut first = GreedyBot::new(a.id);
    let mut second = GreedyBot::new(b.id);
    first.next_move(&a, &board);
    first.next_move(&a, &board);
    assert_eq!(first.roam_cursor(), 2);
    assert_eq!(second.roam_cursor(), 0);
    assert_eq!(second.next_move(&b, &board), (1, 0));
}
