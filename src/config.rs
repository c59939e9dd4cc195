//! User settings for a puzzle session.
//!
//! Settings come from an optional TOML file (path given on the command line
//! or in `TSUMEGO_SETTINGS`); missing keys keep their defaults and command
//! line flags override whatever the file says.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::Sign;
use crate::constants::{DEFAULT_AUTO_PLAY_DELAY_MS, SETTINGS_ENV};
use crate::coord::{BoardRange, presets};
use crate::error::ConfigError;

/// How the recorded opponent reply is picked when several exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyPolicy {
    #[default]
    FirstChild,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Black,
    White,
}

impl From<PlayerColor> for Sign {
    fn from(color: PlayerColor) -> Self {
        match color {
            PlayerColor::Black => Sign::Black,
            PlayerColor::White => Sign::White,
        }
    }
}

/// Named viewport on a 19x19 board, clamped on smaller ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RangePreset {
    Full,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Left,
    Right,
    Top,
    Bottom,
}

impl RangePreset {
    pub fn range(self) -> BoardRange {
        match self {
            RangePreset::Full => presets::FULL,
            RangePreset::TopLeft => presets::TOP_LEFT,
            RangePreset::TopRight => presets::TOP_RIGHT,
            RangePreset::BottomLeft => presets::BOTTOM_LEFT,
            RangePreset::BottomRight => presets::BOTTOM_RIGHT,
            RangePreset::Left => presets::LEFT,
            RangePreset::Right => presets::RIGHT,
            RangePreset::Top => presets::TOP,
            RangePreset::Bottom => presets::BOTTOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Start each puzzle with a random rotation, reflection and color swap.
    pub randomize_board: bool,
    /// Show correct/incorrect hint marks on the board.
    pub show_hint: bool,
    pub show_coordinates: bool,
    /// Answer the player's move with the recorded reply.
    pub auto_play_opponent: bool,
    pub auto_play_delay_ms: u64,
    pub reply_policy: ReplyPolicy,
    /// Side the player takes; inferred from the puzzle when unset.
    pub player_color: Option<PlayerColor>,
    /// Seed for random transformations and replies.
    pub seed: Option<u64>,
    /// Fixed viewport, in the puzzle's own orientation. Fitted to the
    /// stones when unset.
    pub board_range: Option<RangePreset>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            randomize_board: false,
            show_hint: false,
            show_coordinates: true,
            auto_play_opponent: true,
            auto_play_delay_ms: DEFAULT_AUTO_PLAY_DELAY_MS,
            reply_policy: ReplyPolicy::default(),
            player_color: None,
            seed: None,
            board_range: None,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from the file named by `TSUMEGO_SETTINGS`, or defaults if unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var_os(SETTINGS_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}
