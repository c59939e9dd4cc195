//! Line-oriented puzzle console.
//!
//! Reads one command per line and answers GTP style: `=` on success, `?` on
//! failure, optionally echoing a numeric command id.
//!
//! ## Commands
//!
//! - `show` - Print the board, comment and status
//! - `play <vertex>` - Play at `D4` or `dd` style coordinates (display space)
//! - `forward`, `back`, `first`, `last` - Move through the recorded lines
//! - `rotate cw|ccw` - Turn the board by 90 degrees
//! - `reflect <none|horizontal|vertical|diagonal>` - Toggle a mirror
//! - `invert` - Swap stone colors
//! - `random` - Pick a random transformation
//! - `hint` - Toggle correct/incorrect markers
//! - `comment` - Print the current comment
//! - `help` - List commands
//! - `quit` - Leave

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Instant;

use tracing::debug;

use crate::board::{GoBoard, Sign};
use crate::coord::{Vertex, human_coord, parse_vertex};
use crate::game::{Game, MarkKind};
use crate::session::Direction;
use crate::transform::{Reflection, RotateDirection};

const KNOWN_COMMANDS: &[&str] = &[
    "back", "comment", "first", "forward", "help", "hint", "invert", "last", "play", "quit", "random", "reflect",
    "rotate", "show",
];

pub struct Repl<B: GoBoard = crate::board::Board> {
    game: Game<B>,
    show_coordinates: bool,
}

impl<B: GoBoard> Repl<B> {
    pub fn new(game: Game<B>, show_coordinates: bool) -> Self {
        Self { game, show_coordinates }
    }

    pub fn game(&self) -> &Game<B> {
        &self.game
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        writeln!(output, "{}", self.render())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Split an optional numeric command id from the start of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "help" => (true, KNOWN_COMMANDS.join(" ")),

            "quit" => (true, String::new()),

            "show" => (true, self.render()),

            "comment" => (true, self.game.current_comment().unwrap_or_default()),

            "forward" | "f" => self.navigate(Direction::Forward),
            "back" | "b" => self.navigate(Direction::Backward),
            "first" => self.navigate(Direction::First),
            "last" => self.navigate(Direction::Last),

            "play" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let size = self.game.board_size();
                let Some(vertex) = parse_vertex(arg, size) else {
                    return (false, format!("invalid vertex: {arg}"));
                };
                if !self.game.place_stone_at(vertex, Instant::now()) {
                    return (false, "illegal move".to_string());
                }
                let mut message = String::new();
                if let Some(reply) = self.await_reply() {
                    let _ = writeln!(message, "reply {}", human_coord(reply, size));
                }
                message.push_str(&self.render());
                (true, message)
            }

            "rotate" => match args.first().map(|a| a.parse::<RotateDirection>()) {
                Some(Ok(direction)) => {
                    self.game.rotate(direction);
                    (true, self.render())
                }
                Some(Err(err)) => (false, err.to_string()),
                None => (false, "missing argument".to_string()),
            },

            "reflect" => match args.first().map(|a| a.parse::<Reflection>()) {
                Some(Ok(kind)) => {
                    self.game.reflect(kind);
                    (true, self.render())
                }
                Some(Err(err)) => (false, err.to_string()),
                None => (false, "missing argument".to_string()),
            },

            "invert" => {
                self.game.toggle_color_inversion();
                (true, self.render())
            }

            "random" => {
                self.game.random_transformation();
                (true, self.render())
            }

            "hint" => {
                let show = !self.game.show_hint();
                self.game.set_show_hint(show);
                (true, self.render())
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }

    fn navigate(&mut self, direction: Direction) -> (bool, String) {
        if self.game.navigate(direction) {
            (true, self.render())
        } else {
            (false, "cannot move there".to_string())
        }
    }

    /// Wait out the pending reply, if any, and return where it was played
    /// in display coordinates.
    fn await_reply(&mut self) -> Option<Vertex> {
        let pending = self.game.pending_reply()?;
        let wait = pending.due.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "waiting for opponent reply");
            thread::sleep(wait);
        }
        if !self.game.poll(pending.due.max(Instant::now())) {
            return None;
        }
        let node = self.game.current_node()?;
        let vertex = node.data.mv.as_ref()?.vertex().ok()?;
        Some(self.game.transformation().transform_vertex(vertex, self.game.board_size()))
    }

    /// Board, markup and status as text.
    pub fn render(&self) -> String {
        let game = &self.game;
        let size = game.board_size();
        let board = game.display_board();
        let range = game.visible_range();
        let marks = game.display_markup();

        let mut out = String::new();
        if self.show_coordinates {
            out.push_str("   ");
            for x in range.start_x..=range.end_x {
                let label = human_coord(Vertex::new(x, 0), size);
                let _ = write!(out, " {}", &label[..1]);
            }
            out.push('\n');
        }
        for y in range.start_y..=range.end_y {
            if self.show_coordinates {
                let _ = write!(out, "{:>3}", size - y);
            }
            for x in range.start_x..=range.end_x {
                let v = Vertex::new(x, y);
                let ch = match board.get(v) {
                    Sign::Black => 'X',
                    Sign::White => 'O',
                    Sign::Empty => marks
                        .iter()
                        .find(|m| m.vertex == v)
                        .map(|m| mark_char(&m.kind))
                        .unwrap_or('.'),
                };
                let _ = write!(out, " {ch}");
            }
            out.push('\n');
        }

        let _ = writeln!(
            out,
            "{} to play, you are {} [{}]",
            game.current_player(),
            game.player_color(),
            game.transformation()
        );
        if let Some(comment) = game.current_comment() {
            let _ = writeln!(out, "{comment}");
        }
        if game.is_solved() {
            out.push_str("Solved!\n");
        } else if game.session().is_at_leaf() {
            out.push_str("End of line.\n");
        }
        out
    }
}

fn mark_char(kind: &MarkKind) -> char {
    match kind {
        MarkKind::Circle => '@',
        MarkKind::Triangle => '^',
        MarkKind::Square => '#',
        MarkKind::Cross => '*',
        MarkKind::Label(text) => text.chars().next().unwrap_or('?'),
        MarkKind::Hint { correct: true } => 'o',
        MarkKind::Hint { correct: false } => 'x',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::tree::GameTree;

    const PUZZLE: &str = "(;SZ[9];AB[ca][cb][cc]AW[ba][bb]C[Black to play]LB[bc:o][ea:x]\
        (;B[ea]C[Wrong];W[bc])\
        (;B[bc];W[ab];B[ac]C[Correct]))";

    fn repl() -> Repl {
        let settings = Settings {
            auto_play_delay_ms: 0,
            ..Settings::default()
        };
        Repl::new(Game::new(GameTree::parse(PUZZLE).unwrap(), &settings), true)
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = Repl::<crate::board::Board>::parse_id("12 show");
        assert_eq!(id, Some(12));
        assert_eq!(cmd, "show");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = Repl::<crate::board::Board>::parse_id("forward");
        assert_eq!(id, None);
        assert_eq!(cmd, "forward");
    }

    #[test]
    fn test_unknown_and_missing_args() {
        let mut r = repl();
        assert!(!r.execute("genmove", &[]).0);
        assert!(!r.execute("play", &[]).0);
        assert!(!r.execute("rotate", &["sideways"]).0);
        assert!(!r.execute("play", &["Z99"]).0);
    }

    #[test]
    fn test_play_with_reply() {
        let mut r = repl();
        // bc on a 9x9 board is B7
        let (ok, message) = r.execute("play", &["B7"]);
        assert!(ok, "{message}");
        assert!(message.starts_with("reply A8"), "{message}");
        let (ok, message) = r.execute("play", &["ac"]);
        assert!(ok);
        assert!(message.contains("Solved!"));
    }

    #[test]
    fn test_navigation_commands() {
        let mut r = repl();
        assert!(!r.execute("back", &[]).0);
        assert!(r.execute("forward", &[]).0);
        assert_eq!(r.execute("comment", &[]).1, "Wrong");
        assert!(r.execute("first", &[]).0);
        assert!(r.execute("last", &[]).0);
        assert!(r.game().session().is_at_leaf());
    }

    #[test]
    fn test_render_marks_and_hints() {
        let mut r = repl();
        let plain = r.render();
        assert!(plain.contains("Black to play"));
        assert!(plain.contains("  7 . . X"), "{plain}");
        let (ok, shown) = r.execute("hint", &[]);
        assert!(ok);
        assert!(shown.contains("  7 . o X"), "{shown}");
        assert!(shown.contains("  9 . O X . x"), "{shown}");
    }

    #[test]
    fn test_render_follows_move_outside_window() {
        let mut r = repl();
        assert!(!r.render().contains("  2 "));
        let (ok, shown) = r.execute("play", &["H2"]);
        assert!(ok, "{shown}");
        assert!(shown.contains("  2 . . . . . . . X ."), "{shown}");
    }

    #[test]
    fn test_invert_swaps_render() {
        let mut r = repl();
        let (_, shown) = r.execute("invert", &[]);
        assert!(shown.contains("White to play, you are White"));
        assert!(shown.contains("\nWhite to play\n"));
        assert!(shown.contains("  9 . X O"), "{shown}");
    }

    #[test]
    fn test_run_loop_stops_at_quit() {
        let mut r = repl();
        let input = b"1 show\n\n# comment\n2 rotate cw\n3 quit\n4 show\n";
        let mut output = Vec::new();
        r.run(&input[..], &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("=1 "));
        assert!(text.contains("=2 "));
        assert!(text.contains("=3 "));
        assert!(!text.contains("=4"));
    }
}
