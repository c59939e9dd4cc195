//! Constants for board dimensions, puzzle annotation and session defaults.
//!
//! Board size is a runtime value read from the SGF `SZ` property, so the
//! bounds here only describe what SGF coordinates can express.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size used when the SGF root does not carry an `SZ` property.
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Smallest board a puzzle can be played on.
pub const MIN_BOARD_SIZE: usize = 1;

/// Largest board expressible with single-letter SGF coordinates (`a`..`z`).
pub const MAX_BOARD_SIZE: usize = 26;

/// Character that encodes coordinate 0 in SGF.
pub const SGF_COORD_BASE: u8 = b'a';

/// Padding (in points) kept around the stones when fitting a puzzle viewport.
pub const RANGE_MARGIN: usize = 2;

// =============================================================================
// Puzzle Annotation
// =============================================================================

/// Word (case-insensitive, matched at a word start) marking a solved leaf.
pub const CORRECT_MARKER: &str = "correct";

/// Label suffix for a child that leads to a correct leaf.
pub const HINT_CORRECT: &str = "o";

/// Label suffix for a child that never reaches a correct leaf.
pub const HINT_INCORRECT: &str = "x";

// =============================================================================
// Session Defaults
// =============================================================================

/// Delay before a recorded opponent reply is played automatically.
pub const DEFAULT_AUTO_PLAY_DELAY_MS: u64 = 500;

/// Environment variable pointing at a settings file.
pub const SETTINGS_ENV: &str = "TSUMEGO_SETTINGS";
