//! Board state projection and player moves.
//!
//! [`Game`] keeps two boards: the *original* position obtained by replaying
//! the tree from the setup node to the cursor, and the *display* position
//! obtained by pushing the original through the active
//! [`BoardTransformation`]. Callers speak display coordinates; everything
//! stored in the tree stays in original coordinates.
//!
//! Turn state is held in original colors as well (`player`, `to_play`) and
//! only passed through color inversion when read, so toggling inversion
//! mid-puzzle never desynchronizes the two.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::board::{Board, GoBoard, Sign};
use crate::config::{ReplyPolicy, Settings};
use crate::constants::{HINT_CORRECT, HINT_INCORRECT, RANGE_MARGIN};
use crate::coord::{BoardRange, Vertex, expand_point_list};
use crate::error::ReplayError;
use crate::session::{CanNavigate, Direction, MoveOutcome, PuzzleSession};
use crate::transform::{BoardTransformation, Reflection, RotateDirection};
use crate::tree::{GameTree, Node, NodeId};

/// Automatic answer with the recorded opponent reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoPlay {
    pub enabled: bool,
    pub delay: Duration,
    pub policy: ReplyPolicy,
}

impl AutoPlay {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enabled: settings.auto_play_opponent,
            delay: Duration::from_millis(settings.auto_play_delay_ms),
            policy: settings.reply_policy,
        }
    }
}

/// A scheduled opponent reply.
///
/// It only fires while the cursor is still on `from`; any navigation or new
/// move cancels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReply {
    pub due: Instant,
    pub from: NodeId,
    pub target: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkKind {
    Circle,
    Triangle,
    Square,
    Cross,
    Label(String),
    Hint { correct: bool },
}

/// Board markup of the current node, in display coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub vertex: Vertex,
    pub kind: MarkKind,
}

#[derive(Debug, Clone)]
pub struct Game<B: GoBoard = Board> {
    session: PuzzleSession,
    transformation: BoardTransformation,
    /// Side the human plays, original colors.
    player: Sign,
    /// Side to move at the cursor, original colors.
    to_play: Sign,
    original_board: B,
    display_board: B,
    /// Viewport fitted to the recorded stones, original coordinates.
    fitted_range: BoardRange,
    /// Viewport chosen in the settings, replacing the fitted one.
    fixed_range: Option<BoardRange>,
    /// Current viewport in original coordinates.
    problem_range: BoardRange,
    auto_play: AutoPlay,
    show_hint: bool,
    pending: Option<PendingReply>,
    rng: fastrand::Rng,
}

impl Game<Board> {
    pub fn new(tree: GameTree, settings: &Settings) -> Self {
        Self::with_engine(tree, settings)
    }
}

impl<B: GoBoard> Game<B> {
    /// Start a session on `tree` using rules engine `B`.
    pub fn with_engine(tree: GameTree, settings: &Settings) -> Self {
        let session = PuzzleSession::from_tree(tree);
        let size = session.board_size();
        let mut rng = settings.rng();
        let transformation = if settings.randomize_board {
            BoardTransformation::random(&mut rng)
        } else {
            BoardTransformation::IDENTITY
        };
        let player = settings
            .player_color
            .map(Sign::from)
            .unwrap_or_else(|| infer_player(&session));
        let fitted_range = problem_range(&session);
        let fixed_range = settings.board_range.map(|preset| preset.range().clamp(size));
        let empty = B::from_dimensions(size);
        let mut game = Self {
            session,
            transformation,
            player,
            to_play: player,
            original_board: empty.clone(),
            display_board: empty,
            fitted_range,
            fixed_range,
            problem_range: fixed_range.unwrap_or(fitted_range),
            auto_play: AutoPlay::from_settings(settings),
            show_hint: settings.show_hint,
            pending: None,
            rng,
        };
        game.resync();
        info!(
            player = %player,
            transformation = %game.transformation,
            "puzzle session started"
        );
        game
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn session(&self) -> &PuzzleSession {
        &self.session
    }

    pub fn tree(&self) -> Option<&GameTree> {
        self.session.tree()
    }

    pub fn current_node(&self) -> Option<&Node> {
        self.session.current()
    }

    pub fn board_size(&self) -> usize {
        self.session.board_size()
    }

    pub fn transformation(&self) -> BoardTransformation {
        self.transformation
    }

    /// Position as presented to the player.
    pub fn display_board(&self) -> &B {
        &self.display_board
    }

    /// Position in the puzzle's stored orientation and colors.
    pub fn original_board(&self) -> &B {
        &self.original_board
    }

    /// Side to move, in display colors.
    pub fn current_player(&self) -> Sign {
        self.transformation.transform_sign(self.to_play)
    }

    /// Side the human plays, in display colors.
    pub fn player_color(&self) -> Sign {
        self.transformation.transform_sign(self.player)
    }

    /// The puzzle's viewport, in display coordinates.
    pub fn visible_range(&self) -> BoardRange {
        self.transformation.transform_range(self.problem_range, self.board_size())
    }

    pub fn current_comment(&self) -> Option<String> {
        self.session.current_comment(&self.transformation)
    }

    pub fn can_navigate(&self) -> CanNavigate {
        self.session.can_navigate()
    }

    pub fn is_solved(&self) -> bool {
        self.session.is_solved()
    }

    pub fn auto_play(&self) -> AutoPlay {
        self.auto_play
    }

    pub fn set_auto_play(&mut self, auto_play: AutoPlay) {
        self.auto_play = auto_play;
        if !auto_play.enabled {
            self.pending = None;
        }
    }

    pub fn show_hint(&self) -> bool {
        self.show_hint
    }

    pub fn set_show_hint(&mut self, show: bool) {
        self.show_hint = show;
    }

    pub fn pending_reply(&self) -> Option<PendingReply> {
        self.pending
    }

    // -------------------------------------------------------------------------
    // Projection
    // -------------------------------------------------------------------------

    /// Rebuild the original board by replaying from the setup node to the
    /// cursor, then re-derive the display board.
    pub fn sync_board(&mut self) -> Result<(), ReplayError> {
        let (Some(tree), Some(start), Some(current)) = (
            self.session.tree(),
            self.session.starting_node(),
            self.session.current_node(),
        ) else {
            debug!("board sync skipped: session not ready");
            return Ok(());
        };
        let size = self.session.board_size();
        let mut board = setup_board::<B>(tree.get(start)?, size);
        let mut to_play = self.player;
        let mut played = Vec::new();

        for id in tree.path_from(start, current)? {
            let Some(mv) = tree.get(id)?.data.mv.as_ref() else {
                continue;
            };
            match mv.vertex() {
                Ok(vertex) if vertex.in_bounds(size) => {
                    board = board
                        .make_move(mv.color, vertex)
                        .ok_or_else(|| ReplayError::IllegalMove {
                            node: id,
                            point: mv.point.clone(),
                        })?;
                    played.push(vertex);
                }
                _ => debug!(node = %id, point = %mv.point, "treating move as a pass"),
            }
            to_play = mv.color.opponent();
        }

        self.original_board = board;
        self.to_play = to_play;
        self.problem_range = self.fitted_range;
        self.cover_moves(played);
        self.refresh_display();
        Ok(())
    }

    /// Grow the fitted viewport so `moves` stay visible.
    fn cover_moves(&mut self, moves: impl IntoIterator<Item = Vertex>) {
        let size = self.board_size();
        self.problem_range = match self.fixed_range {
            Some(range) => range,
            None => self.problem_range.cover(moves, RANGE_MARGIN, size),
        };
    }

    /// [`Game::sync_board`], falling back to the setup node on inconsistent
    /// tree data.
    fn resync(&mut self) {
        if let Err(err) = self.sync_board() {
            error!(%err, "inconsistent tree state, returning to the setup node");
            self.session.first();
            if let Err(err) = self.sync_board() {
                error!(%err, "setup position could not be rebuilt");
            }
        }
    }

    fn refresh_display(&mut self) {
        self.display_board = self.transformation.transform_board(&self.original_board);
    }

    // -------------------------------------------------------------------------
    // Moves
    // -------------------------------------------------------------------------

    /// Whether the side to move may play at display vertex `vertex`.
    pub fn is_valid_move(&self, vertex: Vertex) -> bool {
        let size = self.board_size();
        if !self.session.is_ready() || !vertex.in_bounds(size) {
            return false;
        }
        let original = self.transformation.invert_vertex(vertex, size);
        !self.original_board.analyze_move(self.to_play, original).pass
    }

    pub fn place_stone(&mut self, vertex: Vertex) -> bool {
        self.place_stone_at(vertex, Instant::now())
    }

    /// Play the side to move at display vertex `vertex`.
    ///
    /// Illegal moves return `false` and change nothing. A legal move is
    /// recorded in the tree in original coordinates and may schedule the
    /// recorded reply, due `delay` after `now`.
    pub fn place_stone_at(&mut self, vertex: Vertex, now: Instant) -> bool {
        if !self.session.ensure_ready() {
            debug!("cannot place stone: puzzle not loaded");
            return false;
        }
        let size = self.board_size();
        if !vertex.in_bounds(size) {
            return false;
        }
        self.pending = None;

        let original = self.transformation.invert_vertex(vertex, size);
        let color = self.to_play;
        let Some(next_board) = self.original_board.make_move(color, original) else {
            debug!(%vertex, %original, %color, "illegal move rejected");
            return false;
        };
        let Some(outcome) = self.session.add_move(original, color) else {
            return false;
        };

        self.original_board = next_board;
        self.to_play = color.opponent();
        self.cover_moves([original]);
        self.refresh_display();
        match outcome {
            MoveOutcome::Matched(id) => info!(node = %id, %original, "move follows a recorded line"),
            MoveOutcome::Created(id) => info!(node = %id, %original, "move leaves the recorded lines"),
        }
        self.schedule_reply(now);
        true
    }

    fn schedule_reply(&mut self, now: Instant) {
        if !self.auto_play.enabled {
            return;
        }
        let (Some(tree), Some(node)) = (self.session.tree(), self.session.current()) else {
            return;
        };
        let opponent = self.player.opponent();
        let is_reply = |id: &NodeId| {
            tree.get(*id)
                .is_ok_and(|n| n.data.mv.as_ref().is_some_and(|m| m.color == opponent))
        };
        let target = match self.auto_play.policy {
            ReplyPolicy::FirstChild => node.first_child().filter(is_reply),
            ReplyPolicy::Random => {
                let replies: Vec<NodeId> = node.children.iter().copied().filter(is_reply).collect();
                (!replies.is_empty()).then(|| replies[self.rng.usize(..replies.len())])
            }
        };
        if let Some(target) = target {
            debug!(node = %target, delay_ms = self.auto_play.delay.as_millis() as u64, "scheduling opponent reply");
            self.pending = Some(PendingReply {
                due: now + self.auto_play.delay,
                from: node.id,
                target,
            });
        }
    }

    /// Fire the pending reply if it is due at `now`. Returns whether it fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(pending) = self.pending else {
            return false;
        };
        if now < pending.due {
            return false;
        }
        self.pending = None;
        if self.session.current_node() != Some(pending.from) {
            debug!("dropping superseded opponent reply");
            return false;
        }
        if let Err(err) = self.session.set_current_node(pending.target) {
            warn!(%err, "scheduled reply no longer exists");
            return false;
        }
        self.resync();
        true
    }

    /// Fire the pending reply immediately, ignoring its delay.
    pub fn flush_auto_play(&mut self) -> bool {
        match self.pending {
            Some(pending) => self.poll(pending.due),
            None => false,
        }
    }

    pub fn cancel_auto_play(&mut self) {
        self.pending = None;
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    pub fn navigate(&mut self, direction: Direction) -> bool {
        self.pending = None;
        let moved = self.session.navigate(direction);
        if moved {
            self.resync();
        }
        moved
    }

    pub fn forward(&mut self) -> bool {
        self.navigate(Direction::Forward)
    }

    pub fn backward(&mut self) -> bool {
        self.navigate(Direction::Backward)
    }

    pub fn first(&mut self) -> bool {
        self.navigate(Direction::First)
    }

    pub fn last(&mut self) -> bool {
        self.navigate(Direction::Last)
    }

    // -------------------------------------------------------------------------
    // Transformation controls
    // -------------------------------------------------------------------------

    pub fn set_transformation(&mut self, transformation: BoardTransformation) {
        self.transformation = transformation;
        debug!(transformation = %self.transformation, "transformation changed");
        self.refresh_display();
    }

    pub fn rotate(&mut self, direction: RotateDirection) {
        let mut t = self.transformation;
        t.rotate(direction);
        self.set_transformation(t);
    }

    pub fn reflect(&mut self, kind: Reflection) {
        let mut t = self.transformation;
        t.reflect(kind);
        self.set_transformation(t);
    }

    pub fn toggle_color_inversion(&mut self) {
        let mut t = self.transformation;
        t.toggle_color_inversion();
        self.set_transformation(t);
    }

    pub fn random_transformation(&mut self) {
        let t = BoardTransformation::random(&mut self.rng);
        self.set_transformation(t);
    }

    // -------------------------------------------------------------------------
    // Markup
    // -------------------------------------------------------------------------

    /// Labels, marks and (if enabled) hints of the current node.
    pub fn display_markup(&self) -> Vec<Mark> {
        let Some(node) = self.session.current() else {
            return Vec::new();
        };
        let size = self.board_size();
        let t = self.transformation;
        let mut marks = Vec::new();
        let mut push = |vertex: Vertex, kind: MarkKind| {
            if vertex.in_bounds(size) {
                marks.push(Mark {
                    vertex: t.transform_vertex(vertex, size),
                    kind,
                });
            }
        };

        for label in &node.data.labels {
            let Some((point, text)) = label.split_once(':') else {
                continue;
            };
            let Ok(vertex) = Vertex::from_sgf(point) else {
                continue;
            };
            match text {
                HINT_CORRECT | HINT_INCORRECT => {
                    if self.show_hint {
                        push(vertex, MarkKind::Hint {
                            correct: text == HINT_CORRECT,
                        });
                    }
                }
                _ => push(vertex, MarkKind::Label(t.transform_comment(text))),
            }
        }

        let shapes = [
            (&node.data.circles, MarkKind::Circle),
            (&node.data.triangles, MarkKind::Triangle),
            (&node.data.squares, MarkKind::Square),
            (&node.data.crosses, MarkKind::Cross),
        ];
        for (values, kind) in shapes {
            for value in values {
                match expand_point_list(value) {
                    Ok(points) => points.into_iter().for_each(|v| push(v, kind.clone())),
                    Err(err) => warn!(%err, "skipping malformed markup"),
                }
            }
        }
        marks
    }
}

/// Empty board with the setup node's `AB`/`AW` stones placed.
fn setup_board<B: GoBoard>(setup: &Node, size: usize) -> B {
    let mut board = B::from_dimensions(size);
    let lists = [(Sign::Black, &setup.data.add_black), (Sign::White, &setup.data.add_white)];
    for (sign, values) in lists {
        for value in values {
            match expand_point_list(value) {
                Ok(points) => {
                    for v in points.into_iter().filter(|v| v.in_bounds(size)) {
                        board = board.set_stone(sign, v);
                    }
                }
                Err(err) => warn!(%err, "skipping malformed setup stone"),
            }
        }
    }
    board
}

/// Side to play in the puzzle: `PL` on the setup node, else the color of
/// the first recorded move, else Black.
fn infer_player(session: &PuzzleSession) -> Sign {
    let (Some(tree), Some(start)) = (session.tree(), session.starting_node()) else {
        return Sign::Black;
    };
    let Ok(setup) = tree.get(start) else {
        return Sign::Black;
    };
    match setup.data.values("PL").first().copied() {
        Some("B" | "b") => return Sign::Black,
        Some("W" | "w") => return Sign::White,
        _ => {}
    }
    setup
        .first_child()
        .and_then(|id| tree.get(id).ok())
        .and_then(|n| n.data.mv.as_ref())
        .map(|m| m.color)
        .unwrap_or(Sign::Black)
}

/// Bounding box of every stone and move below the setup node.
fn problem_range(session: &PuzzleSession) -> BoardRange {
    let size = session.board_size();
    let (Some(tree), Some(start)) = (session.tree(), session.starting_node()) else {
        return BoardRange::full(size);
    };
    let mut points = Vec::new();
    if let Ok(setup) = tree.get(start) {
        for value in setup.data.add_black.iter().chain(&setup.data.add_white) {
            points.extend(expand_point_list(value).unwrap_or_default());
        }
    }
    for node in tree.iter().filter(|n| tree.is_ancestor(start, n.id)) {
        if let Some(Ok(v)) = node.data.mv.as_ref().map(|m| m.vertex()) {
            points.push(v);
        }
    }
    BoardRange::fit(points, RANGE_MARGIN, size)
}
