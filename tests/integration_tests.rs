//! Integration tests for tsumego-rust
//!
//! Puzzle sessions driven end to end through the public API. Fixtures live
//! in `tests/data`; the problem library layout is `tests/data/problems/<category>/<id>.sgf`.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tsumego_rust::annotate::{annotate, correct_subtrees, leads_to_correct};
use tsumego_rust::board::{GoBoard, Sign};
use tsumego_rust::config::{ReplyPolicy, Settings};
use tsumego_rust::coord::Vertex;
use tsumego_rust::error::{LoadError, TransformError};
use tsumego_rust::game::Game;
use tsumego_rust::library::{DirectorySource, ProblemLoader, SgfSource};
use tsumego_rust::session::PuzzleSession;
use tsumego_rust::sgf::NodeData;
use tsumego_rust::transform::{BoardTransformation, Reflection, Rotation};
use tsumego_rust::tree::GameTree;

// =============================================================================
// Helper functions
// =============================================================================

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

fn fixture(name: &str) -> GameTree {
    let text = fs::read_to_string(data_dir().join(name)).unwrap();
    GameTree::parse(&text).unwrap()
}

fn manual_settings() -> Settings {
    Settings {
        auto_play_opponent: false,
        ..Settings::default()
    }
}

fn tree_len(game: &Game) -> usize {
    game.tree().map(GameTree::len).unwrap_or(0)
}

// =============================================================================
// Transformations
// =============================================================================

#[test]
fn test_rotation_maps_corner() {
    let t = BoardTransformation::parse(90, "none", false).unwrap();
    let shown = t.transform_vertex(Vertex::new(0, 0), 19);
    assert_eq!(shown, Vertex::new(0, 18));
    assert_eq!(t.invert_vertex(shown, 19), Vertex::new(0, 0));
}

#[test]
fn test_invalid_transformation_rejected() {
    assert_eq!(
        BoardTransformation::parse(45, "none", false),
        Err(TransformError::InvalidRotation(45))
    );
    assert!(matches!(
        BoardTransformation::parse(90, "sideways", false),
        Err(TransformError::InvalidReflection(_))
    ));
}

#[test]
fn test_inverted_setup_stone() {
    let tree = GameTree::parse("(;GM[1]SZ[19]AB[dd](;B[pd]))").unwrap();
    let mut game = Game::new(tree, &manual_settings());
    assert_eq!(game.display_board().get(Vertex::new(3, 3)), Sign::Black);

    for t in [
        BoardTransformation::new(Rotation::Deg0, Reflection::None, true),
        BoardTransformation::new(Rotation::Deg270, Reflection::Diagonal, true),
    ] {
        game.set_transformation(t);
        let shown = t.transform_vertex(Vertex::new(3, 3), 19);
        assert_eq!(game.display_board().get(shown), Sign::White, "under {t}");
        assert_eq!(game.display_board().stones().count(), 1);
    }
    assert_eq!(game.original_board().get(Vertex::new(3, 3)), Sign::Black);
}

// =============================================================================
// Annotation
// =============================================================================

#[test]
fn test_annotation_fixture() {
    let tree = fixture("annotation.sgf");
    let root = tree.root();
    let (a, b) = (root.children[0], root.children[1]);
    assert!(!leads_to_correct(&tree, a).unwrap());
    assert!(leads_to_correct(&tree, b).unwrap());

    let sgf = annotate(&tree).unwrap().to_sgf();
    assert!(sgf.contains("LB[dd:x][pd:o]"), "{sgf}");
}

#[test]
fn test_annotation_single_correct_leaf() {
    let tree = GameTree::parse("(;AB[aa](;B[bb](;W[cc](;B[dd]C[Correct])(;B[ee]))(;W[ff]))(;B[gg]))").unwrap();
    let on_path: Vec<_> = {
        let bb = tree.root().children[0];
        let cc = tree.children(bb).unwrap()[0];
        let dd = tree.children(cc).unwrap()[0];
        vec![tree.root_id(), bb, cc, dd]
    };
    let memo = correct_subtrees(&tree);
    for node in tree.iter() {
        let expected = on_path.contains(&node.id);
        assert_eq!(leads_to_correct(&tree, node.id).unwrap(), expected, "node {}", node.id);
        assert_eq!(memo[&node.id], expected);
    }
    let annotated = annotate(&tree).unwrap();
    assert_eq!(annotated.root().data.labels, vec!["bb:o", "gg:x"]);
}

// =============================================================================
// Sessions and moves
// =============================================================================

#[test]
fn test_matching_move_reuses_node() {
    let mut game = Game::new(fixture("corner.sgf"), &manual_settings());
    let start = game.session().starting_node().unwrap();
    let expected = game.tree().unwrap().children(start).unwrap()[0];
    let before = tree_len(&game);

    assert!(game.place_stone(Vertex::new(18, 1)));
    assert_eq!(game.session().current_node(), Some(expected));
    assert_eq!(tree_len(&game), before);
    assert!(game.is_solved());
}

#[test]
fn test_new_move_appends_node() {
    let mut game = Game::new(fixture("corner.sgf"), &manual_settings());
    let start = game.session().starting_node().unwrap();
    let before = tree_len(&game);

    assert!(game.place_stone(Vertex::new(10, 10)));
    assert_eq!(tree_len(&game), before + 1);
    let node = game.current_node().unwrap();
    assert_eq!(node.parent, Some(start));
    assert_eq!(node.data.move_point(Sign::Black), Some("kk"));
    assert_eq!(node.data.move_point(Sign::White), None);
    assert_eq!(game.current_player(), Sign::White);
}

#[test]
fn test_illegal_move_is_false() {
    let mut game = Game::new(fixture("corner.sgf"), &manual_settings());
    let before = tree_len(&game);
    // occupied by a white setup stone
    assert!(!game.place_stone(Vertex::new(16, 1)));
    assert_eq!(tree_len(&game), before);
    assert_eq!(game.session().current_node(), game.session().starting_node());
}

#[test]
fn test_backward_floor_and_can_navigate() {
    let mut session = PuzzleSession::from_tree(fixture("corner.sgf"));
    let start = session.starting_node();
    for _ in 0..10 {
        assert!(!session.backward());
    }
    assert_eq!(session.current_node(), start);
    assert!(!session.can_navigate().backward);

    while session.forward() {
        assert!(session.can_navigate().backward);
    }
    assert!(session.is_at_leaf());
}

#[test]
fn test_add_move_idempotent() {
    let mut session = PuzzleSession::from_tree(fixture("corner.sgf"));
    let first = session.add_move(Vertex::new(5, 5), Sign::Black).unwrap();
    assert!(first.is_new());
    let len = session.tree().unwrap().len();
    assert!(session.backward());

    let second = session.add_move(Vertex::new(5, 5), Sign::Black).unwrap();
    assert!(!second.is_new());
    assert_eq!(second.node(), first.node());
    assert_eq!(session.tree().unwrap().len(), len);
}

#[test]
fn test_tree_values_are_independent() {
    let t1 = fixture("corner.sgf");
    let snapshot: Vec<(_, NodeData, Vec<_>)> = t1.iter().map(|n| (n.id, n.data.clone(), n.children.clone())).collect();
    let root = t1.root_id();

    let (t2, added) = t1
        .mutate(|draft| {
            draft.add_to_property(root, "LB", "aa:A")?;
            draft.append_node(root, NodeData::with_move(Sign::Black, Vertex::new(0, 0)))
        })
        .unwrap();

    for (id, data, children) in &snapshot {
        let node = t1.get(*id).unwrap();
        assert_eq!(&node.data, data);
        assert_eq!(&node.children, children);
    }
    assert!(!t1.contains(added));
    assert_eq!(t2.len(), t1.len() + 1);
    assert_eq!(t2.root().data.labels, vec!["aa:A"]);
    assert_eq!(t2.get(added).unwrap().parent, Some(root));
}

#[test]
fn test_comment_follows_color_inversion() {
    let mut game = Game::new(fixture("corner.sgf"), &manual_settings());
    assert_eq!(game.current_comment().as_deref(), Some("Black to play and kill."));
    game.toggle_color_inversion();
    assert_eq!(game.current_comment().as_deref(), Some("White to play and kill."));
    assert_eq!(game.current_player(), Sign::White);
}

// =============================================================================
// Opponent replies
// =============================================================================

#[test]
fn test_wrong_line_reply() {
    let mut game = Game::new(fixture("corner.sgf"), &Settings::default());
    let now = Instant::now();
    assert!(game.place_stone_at(Vertex::new(18, 2), now));
    assert!(!game.poll(now + Duration::from_millis(499)));
    assert!(game.poll(now + Duration::from_millis(500)));

    assert_eq!(game.original_board().get(Vertex::new(18, 1)), Sign::White);
    assert_eq!(game.current_comment().as_deref(), Some("White has two eyes."));
    assert!(!game.is_solved());
    assert!(game.session().is_at_leaf());
}

#[test]
fn test_first_child_policy_needs_opponent_move() {
    let tree = GameTree::parse("(;SZ[9]AB[ee](;B[dd](;B[ff])(;W[cc])))").unwrap();
    let mut game = Game::new(tree, &Settings::default());
    assert!(game.place_stone(Vertex::new(3, 3)));
    assert!(game.pending_reply().is_none());
}

#[test]
fn test_random_policy_picks_recorded_reply() {
    let tree = GameTree::parse("(;SZ[9]AB[ee](;B[dd](;B[ff])(;W[cc])(;W[cd])))").unwrap();
    let settings = Settings {
        reply_policy: ReplyPolicy::Random,
        seed: Some(7),
        ..Settings::default()
    };
    let mut game = Game::new(tree, &settings);
    assert!(game.place_stone(Vertex::new(3, 3)));
    assert!(game.flush_auto_play());
    let reply = game.current_node().unwrap().data.move_point(Sign::White).unwrap();
    assert!(["cc", "cd"].contains(&reply), "{reply}");
}

// =============================================================================
// Problem library
// =============================================================================

#[test]
fn test_directory_listing() {
    let source = DirectorySource::new(data_dir().join("problems"));
    assert_eq!(source.categories().unwrap(), vec!["life-and-death", "tesuji"]);
    assert_eq!(source.problem_ids("life-and-death").unwrap(), vec![0, 1]);
    assert_eq!(source.problem_ids("tesuji").unwrap(), vec![0, 3]);
}

#[test]
fn test_loader_reads_problem() {
    let mut loader = ProblemLoader::new(DirectorySource::new(data_dir().join("problems")));
    let tree = loader.load("tesuji", 0).unwrap();
    assert!(!loader.is_loading());

    let game = Game::new(tree, &manual_settings());
    assert_eq!(game.board_size(), 13);
    assert_eq!(game.player_color(), Sign::White);
    assert_eq!(game.display_board().size(), 13);
}

#[test]
fn test_loader_failures_keep_loading() {
    let mut loader = ProblemLoader::new(DirectorySource::new(data_dir().join("problems")));
    assert!(matches!(loader.load("tesuji", 9), Err(LoadError::NotFound { id: 9, .. })));
    assert!(loader.is_loading());
    assert!(loader.load("life-and-death", 1).is_ok());
    assert!(!loader.is_loading());
}

#[test]
fn test_malformed_problem_opens_empty_board() {
    let mut loader = ProblemLoader::new(DirectorySource::new(data_dir().join("problems")));
    let tree = loader.load("tesuji", 3).unwrap();
    assert!(!loader.is_loading());
    let root = tree.root_id();

    let mut game = Game::new(tree, &manual_settings());
    assert_eq!(game.session().starting_node(), Some(root));
    assert_eq!(game.session().current_node(), Some(root));
    assert_eq!(game.board_size(), 19);
    assert_eq!(game.display_board().stones().count(), 0);
    assert!(game.place_stone(Vertex::new(3, 3)));
}

#[test]
fn test_library_problem_solved_end_to_end() {
    let mut loader = ProblemLoader::new(DirectorySource::new(data_dir().join("problems")));
    let tree = loader.load("life-and-death", 0).unwrap();
    let mut game = Game::new(tree, &Settings::default());

    assert!(game.place_stone(Vertex::new(1, 2)));
    assert!(game.flush_auto_play());
    assert!(game.place_stone(Vertex::new(0, 2)));
    assert!(game.is_solved());

    assert!(game.first());
    assert_eq!(game.original_board().stones().count(), 5);
}

#[test]
fn test_malformed_input_rejected() {
    assert!(GameTree::parse("").is_err());
    assert!(GameTree::parse("(;B[aa]").is_err());
    assert!(GameTree::parse("(;C[unterminated").is_err());
}
