//! Puzzle session: a cursor over a game tree with a navigational floor.
//!
//! The session owns one [`GameTree`] value and the id of the node being
//! shown. The floor is the setup node discovered at load time; navigation
//! never climbs above it. Moves played by the user either snap onto an
//! existing variation or grow a new branch in the in-memory tree.

use tracing::{debug, info, warn};

use crate::annotate::is_correct_comment;
use crate::board::Sign;
use crate::constants::{DEFAULT_BOARD_SIZE, HINT_CORRECT, HINT_INCORRECT, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use crate::coord::Vertex;
use crate::error::TreeError;
use crate::sgf::NodeData;
use crate::transform::BoardTransformation;
use crate::tree::{GameTree, Node, NodeId};

/// How [`PuzzleSession::add_move`] placed the move in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move matched a recorded child, which is now current.
    Matched(NodeId),
    /// No child matched; a new node was appended.
    Created(NodeId),
}

impl MoveOutcome {
    pub fn node(self) -> NodeId {
        match self {
            MoveOutcome::Matched(id) | MoveOutcome::Created(id) => id,
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, MoveOutcome::Created(_))
    }
}

/// Which navigation controls would currently have an effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanNavigate {
    pub forward: bool,
    pub backward: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    First,
    Last,
}

/// A hint label (`LB[pt:o]` / `LB[pt:x]`) on the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub vertex: Vertex,
    pub correct: bool,
}

#[derive(Debug, Clone)]
pub struct PuzzleSession {
    tree: Option<GameTree>,
    starting_node: Option<NodeId>,
    current_node: Option<NodeId>,
    board_size: usize,
}

impl Default for PuzzleSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PuzzleSession {
    /// A session with nothing loaded yet.
    pub fn new() -> Self {
        Self {
            tree: None,
            starting_node: None,
            current_node: None,
            board_size: DEFAULT_BOARD_SIZE,
        }
    }

    pub fn from_tree(tree: GameTree) -> Self {
        let mut session = Self::new();
        session.load(tree);
        session
    }

    /// Replace the tree and position the cursor on its setup node.
    pub fn load(&mut self, tree: GameTree) {
        self.board_size = board_size_of(&tree);
        let setup = Self::find_setup_node(&tree);
        info!(
            nodes = tree.len(),
            board_size = self.board_size,
            setup = %setup,
            "loaded puzzle tree"
        );
        self.tree = Some(tree);
        self.starting_node = Some(setup);
        self.current_node = Some(setup);
    }

    /// Drop the tree, returning to the not-loaded state.
    pub fn unload(&mut self) {
        self.tree = None;
        self.starting_node = None;
        self.current_node = None;
    }

    /// Locate the node holding the initial position.
    ///
    /// Walks the main line from the root: the first node with `AB`/`AW` is
    /// the setup node; if a `B`/`W` move comes first, its parent is. A main
    /// line with neither falls back to the root.
    pub fn find_setup_node(tree: &GameTree) -> NodeId {
        let root = tree.root_id();
        let mut node = tree.root();
        // bounded by the node count so a malformed tree cannot loop forever
        for _ in 0..tree.len() {
            if node.data.has_setup() {
                return node.id;
            }
            if node.data.mv.is_some() {
                return node.parent.unwrap_or(root);
            }
            match node.first_child().and_then(|id| tree.get(id).ok()) {
                Some(next) => node = next,
                None => break,
            }
        }
        warn!("no setup stones or moves on the main line, using the root as setup node");
        root
    }

    pub fn is_ready(&self) -> bool {
        self.tree.is_some() && self.current_node.is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.tree.is_some()
    }

    pub fn tree(&self) -> Option<&GameTree> {
        self.tree.as_ref()
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn starting_node(&self) -> Option<NodeId> {
        self.starting_node
    }

    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    /// The current node, if the session is ready.
    pub fn current(&self) -> Option<&Node> {
        let tree = self.tree.as_ref()?;
        tree.get(self.current_node?).ok()
    }

    /// Repair a tree-without-cursor state.
    ///
    /// Returns whether the session is ready afterwards.
    pub fn ensure_ready(&mut self) -> bool {
        let Some(tree) = &self.tree else {
            return false;
        };
        let current_ok = self.current_node.is_some_and(|id| tree.contains(id));
        if !current_ok {
            let fallback = self
                .starting_node
                .filter(|id| tree.contains(*id))
                .unwrap_or_else(|| tree.root_id());
            warn!(node = %fallback, "current node missing, resetting cursor");
            self.starting_node.get_or_insert(fallback);
            self.current_node = Some(fallback);
        }
        true
    }

    /// Move the cursor to `id` if it exists in the current tree.
    pub fn set_current_node(&mut self, id: NodeId) -> Result<(), TreeError> {
        let tree = self.tree.as_ref().ok_or(TreeError::NodeNotFound(id))?;
        tree.get(id)?;
        self.current_node = Some(id);
        Ok(())
    }

    pub fn navigate(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.forward(),
            Direction::Backward => self.backward(),
            Direction::First => self.first(),
            Direction::Last => self.last(),
        }
    }

    /// Step onto the main-line child. Returns whether the cursor moved.
    pub fn forward(&mut self) -> bool {
        debug!("attempting to navigate forward");
        let Some(next) = self.current().and_then(Node::first_child) else {
            return false;
        };
        debug!(node = %next, "moving to next node");
        self.current_node = Some(next);
        true
    }

    /// Step to the parent, unless already on the setup node.
    pub fn backward(&mut self) -> bool {
        debug!("attempting to navigate backward");
        if !self.can_navigate().backward {
            return false;
        }
        let Some(parent) = self.current().and_then(|n| n.parent) else {
            return false;
        };
        debug!(node = %parent, "moving to previous node");
        self.current_node = Some(parent);
        true
    }

    /// Jump to the setup node.
    pub fn first(&mut self) -> bool {
        debug!("attempting to navigate to first");
        let Some(start) = self.starting_node.filter(|_| self.tree.is_some()) else {
            return false;
        };
        let moved = self.current_node != Some(start);
        self.current_node = Some(start);
        moved
    }

    /// Follow main-line children to a leaf.
    pub fn last(&mut self) -> bool {
        debug!("attempting to navigate to last");
        let (Some(tree), Some(current)) = (&self.tree, self.current_node) else {
            return false;
        };
        let Ok(end) = tree.main_line_end(current) else {
            return false;
        };
        debug!(node = %end, "moving to last node");
        self.current_node = Some(end);
        end != current
    }

    pub fn can_navigate(&self) -> CanNavigate {
        let Some(node) = self.current() else {
            return CanNavigate::default();
        };
        CanNavigate {
            forward: !node.is_leaf(),
            backward: Some(node.id) != self.starting_node && node.parent.is_some(),
        }
    }

    /// Record a move by `color` at `vertex` (original coordinates).
    ///
    /// Snaps onto an existing child carrying the same move, otherwise
    /// appends a new child. Returns `None` if the session is not ready.
    pub fn add_move(&mut self, vertex: Vertex, color: Sign) -> Option<MoveOutcome> {
        let (Some(tree), Some(current)) = (&self.tree, self.current_node) else {
            debug!("cannot add move: game tree or current node is not set");
            return None;
        };
        let point = vertex.to_sgf();
        let node = match tree.get(current) {
            Ok(node) => node,
            Err(err) => {
                warn!(%err, "cannot add move: current node is stale");
                self.ensure_ready();
                return None;
            }
        };

        let matched = node.children.iter().copied().find(|child| {
            tree.get(*child)
                .is_ok_and(|c| c.data.move_point(color) == Some(point.as_str()))
        });
        if let Some(child) = matched {
            debug!(node = %child, %point, "move matches a recorded variation");
            self.current_node = Some(child);
            return Some(MoveOutcome::Matched(child));
        }

        match tree.mutate(|draft| draft.append_node(current, NodeData::with_move(color, vertex))) {
            Ok((next_tree, id)) => {
                debug!(node = %id, %point, "appended new variation");
                self.tree = Some(next_tree);
                self.current_node = Some(id);
                Some(MoveOutcome::Created(id))
            }
            Err(err) => {
                warn!(%err, "failed to append move");
                None
            }
        }
    }

    /// Comment of the current node, with color words swapped per `transformation`.
    pub fn current_comment(&self, transformation: &BoardTransformation) -> Option<String> {
        let comment = self.current()?.data.comment.as_deref()?;
        Some(transformation.transform_comment(comment))
    }

    /// Correct/incorrect hint labels on the current node (original coordinates).
    pub fn hints(&self) -> Vec<Hint> {
        let Some(node) = self.current() else {
            return Vec::new();
        };
        node.data
            .labels
            .iter()
            .filter_map(|label| {
                let (point, text) = label.split_once(':')?;
                let correct = match text {
                    HINT_CORRECT => true,
                    HINT_INCORRECT => false,
                    _ => return None,
                };
                let vertex = Vertex::from_sgf(point).ok()?;
                Some(Hint { vertex, correct })
            })
            .collect()
    }

    /// Whether the current node's comment marks the puzzle as solved.
    pub fn is_solved(&self) -> bool {
        self.current()
            .and_then(|n| n.data.comment.as_deref())
            .is_some_and(is_correct_comment)
    }

    pub fn is_at_leaf(&self) -> bool {
        self.current().is_some_and(Node::is_leaf)
    }
}

/// Board size from the root `SZ` property (`"19"` or `"19:19"`).
fn board_size_of(tree: &GameTree) -> usize {
    let Some(raw) = tree.root().data.values("SZ").first().copied() else {
        return DEFAULT_BOARD_SIZE;
    };
    let width = raw.split(':').next().unwrap_or(raw).trim();
    match width.parse::<usize>() {
        Ok(size) if (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) => size,
        _ => {
            warn!(value = raw, "unsupported SZ value, using default board size");
            DEFAULT_BOARD_SIZE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUZZLE: &str = "(;GM[1]SZ[19];AB[cc][dc]AW[dd]C[Black to play]\
        (;B[ed]C[incorrect, try again])\
        (;B[de];W[ee];B[ef]C[Correct!]))";

    fn session() -> PuzzleSession {
        PuzzleSession::from_tree(GameTree::parse(PUZZLE).unwrap())
    }

    #[test]
    fn test_setup_node_with_stones() {
        let s = session();
        let tree = s.tree().unwrap();
        let start = s.starting_node().unwrap();
        assert_ne!(start, tree.root_id());
        assert!(tree.get(start).unwrap().data.has_setup());
        assert_eq!(s.current_node(), Some(start));
        assert_eq!(s.board_size(), 19);
    }

    #[test]
    fn test_setup_node_is_parent_of_first_move() {
        let tree = GameTree::parse("(;SZ[9];PL[B];B[aa];W[bb])").unwrap();
        let setup = PuzzleSession::find_setup_node(&tree);
        let node = tree.get(setup).unwrap();
        assert_eq!(node.data.values("PL"), vec!["B"]);
    }

    #[test]
    fn test_setup_node_degenerates_to_root() {
        let tree = GameTree::parse("(;SZ[9];C[nothing here])").unwrap();
        assert_eq!(PuzzleSession::find_setup_node(&tree), tree.root_id());
    }

    #[test]
    fn test_backward_floor() {
        let mut s = session();
        let start = s.starting_node();
        for _ in 0..5 {
            assert!(!s.backward());
        }
        assert_eq!(s.current_node(), start);
        assert!(!s.can_navigate().backward);
    }

    #[test]
    fn test_forward_last_first() {
        let mut s = session();
        assert!(s.can_navigate().forward);
        assert!(s.forward());
        assert!(s.can_navigate().backward);
        assert!(s.backward());
        assert!(s.last());
        assert!(s.is_at_leaf());
        assert!(!s.can_navigate().forward);
        assert!(!s.forward());
        assert!(s.first());
        assert_eq!(s.current_node(), s.starting_node());
    }

    #[test]
    fn test_add_move_matches_existing_child() {
        let mut s = session();
        let before = s.tree().unwrap().len();
        let outcome = s.add_move(Vertex::new(3, 4), Sign::Black).unwrap();
        assert!(matches!(outcome, MoveOutcome::Matched(_)));
        assert_eq!(s.tree().unwrap().len(), before);
        assert_eq!(s.current_node(), Some(outcome.node()));
    }

    #[test]
    fn test_add_move_color_must_match() {
        let mut s = session();
        let before = s.tree().unwrap().len();
        let outcome = s.add_move(Vertex::new(3, 4), Sign::White).unwrap();
        assert!(outcome.is_new());
        assert_eq!(s.tree().unwrap().len(), before + 1);
    }

    #[test]
    fn test_add_move_creates_branch() {
        let mut s = session();
        let start = s.starting_node().unwrap();
        let before = s.tree().unwrap().len();
        let outcome = s.add_move(Vertex::new(10, 10), Sign::Black).unwrap();
        let tree = s.tree().unwrap();
        assert_eq!(tree.len(), before + 1);
        let node = tree.get(outcome.node()).unwrap();
        assert_eq!(node.data.move_point(Sign::Black), Some("kk"));
        assert_eq!(node.parent, Some(start));
        assert_eq!(tree.children(start).unwrap().last(), Some(&outcome.node()));
        assert!(s.backward());
        assert_eq!(s.current_node(), Some(start));
    }

    #[test]
    fn test_not_ready_is_noop() {
        let mut s = PuzzleSession::new();
        assert!(!s.is_ready());
        assert!(!s.forward());
        assert!(!s.backward());
        assert!(!s.first());
        assert!(!s.last());
        assert_eq!(s.can_navigate(), CanNavigate::default());
        assert_eq!(s.add_move(Vertex::new(0, 0), Sign::Black), None);
        assert!(!s.ensure_ready());
    }

    #[test]
    fn test_ensure_ready_recovers_stale_cursor() {
        let mut s = session();
        s.current_node = Some(NodeId::from_raw(10_000));
        assert!(s.ensure_ready());
        assert_eq!(s.current_node(), s.starting_node());
        assert!(s.set_current_node(NodeId::from_raw(10_000)).is_err());
        assert_eq!(s.current_node(), s.starting_node());
    }

    #[test]
    fn test_comment_and_solution() {
        let mut s = session();
        let inverted = BoardTransformation {
            invert_colors: true,
            ..BoardTransformation::IDENTITY
        };
        assert_eq!(s.current_comment(&inverted).as_deref(), Some("White to play"));
        assert!(!s.is_solved());
        s.forward();
        assert!(!s.is_solved());
        s.first();
        s.add_move(Vertex::new(3, 4), Sign::Black);
        s.last();
        assert!(s.is_solved());
    }

    #[test]
    fn test_hints_parsed() {
        let tree = GameTree::parse("(;AB[aa]LB[bb:o][cc:x][dd:A](;B[bb])(;B[cc]))").unwrap();
        let s = PuzzleSession::from_tree(tree);
        let hints = s.hints();
        assert_eq!(
            hints,
            vec![
                Hint { vertex: Vertex::new(1, 1), correct: true },
                Hint { vertex: Vertex::new(2, 2), correct: false },
            ]
        );
    }

    #[test]
    fn test_board_size_from_sz() {
        let s = PuzzleSession::from_tree(GameTree::parse("(;SZ[9:9]AB[aa])").unwrap());
        assert_eq!(s.board_size(), 9);
        let s = PuzzleSession::from_tree(GameTree::parse("(;SZ[99]AB[aa])").unwrap());
        assert_eq!(s.board_size(), DEFAULT_BOARD_SIZE);
    }
}
