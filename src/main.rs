//! Tsumego-Rust: play and annotate Go problems from the terminal.
//!
//! ## Usage
//!
//! - `tsumego-rust play problem.sgf` - Work through a problem interactively
//! - `tsumego-rust play --library assets --category tesuji --id 3` - Same, from a problem library
//! - `tsumego-rust show problem.sgf --range top-right` - Print the starting position
//! - `tsumego-rust annotate problem.sgf -o labelled.sgf` - Add correct/incorrect hint labels
//! - `tsumego-rust list assets` - List problems in a library
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use tsumego_rust::annotate::annotate;
use tsumego_rust::config::{PlayerColor, RangePreset, ReplyPolicy, Settings};
use tsumego_rust::game::Game;
use tsumego_rust::library::{DirectorySource, ProblemLoader, SgfSource};
use tsumego_rust::repl::Repl;
use tsumego_rust::tree::{GameTree, SequentialIds};

/// Tsumego-Rust: Go problem trainer
#[derive(Parser)]
#[command(name = "tsumego-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML). Falls back to $TSUMEGO_SETTINGS.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work through a problem interactively
    Play {
        #[command(flatten)]
        problem: ProblemArgs,
        #[command(flatten)]
        overrides: SettingOverrides,
    },
    /// Print a problem's starting position
    Show {
        #[command(flatten)]
        problem: ProblemArgs,
        #[command(flatten)]
        overrides: SettingOverrides,
    },
    /// Label every move with a correct/incorrect hint
    Annotate {
        file: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the problems of a library directory
    List {
        library: PathBuf,
        /// Only this category
        category: Option<String>,
    },
}

#[derive(Args)]
struct ProblemArgs {
    /// SGF file to open
    #[arg(required_unless_present = "library")]
    file: Option<PathBuf>,

    /// Library root holding <category>/<id>.sgf
    #[arg(long, conflicts_with = "file", requires = "category")]
    library: Option<PathBuf>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long, default_value_t = 0)]
    id: u32,
}

#[derive(Args)]
struct SettingOverrides {
    /// Start with a random rotation, reflection and color swap
    #[arg(long)]
    randomize: bool,

    /// Show correct/incorrect hint markers
    #[arg(long)]
    hints: bool,

    /// Do not answer moves with the recorded reply
    #[arg(long)]
    no_auto_play: bool,

    #[arg(long)]
    delay_ms: Option<u64>,

    #[arg(long, value_enum)]
    reply_policy: Option<ReplyPolicy>,

    /// Side to play instead of the one inferred from the problem
    #[arg(long, value_enum)]
    player: Option<PlayerColor>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    no_coordinates: bool,

    /// Show a fixed part of the board instead of fitting the stones
    #[arg(long, value_enum)]
    range: Option<RangePreset>,
}

impl SettingOverrides {
    fn apply(&self, settings: &mut Settings) {
        settings.randomize_board |= self.randomize;
        settings.show_hint |= self.hints;
        if self.no_auto_play {
            settings.auto_play_opponent = false;
        }
        if self.no_coordinates {
            settings.show_coordinates = false;
        }
        if let Some(delay) = self.delay_ms {
            settings.auto_play_delay_ms = delay;
        }
        if let Some(policy) = self.reply_policy {
            settings.reply_policy = policy;
        }
        if self.player.is_some() {
            settings.player_color = self.player;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        if self.range.is_some() {
            settings.board_range = self.range;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => Settings::load(path),
        None => Settings::from_env(),
    }
    .context("failed to load settings")?;

    match cli.command {
        Commands::Play { problem, overrides } => {
            let repl = open_problem(&problem, &overrides, settings)?;
            run_console(repl)
        }
        Commands::Show { problem, overrides } => {
            let repl = open_problem(&problem, &overrides, settings)?;
            println!("{}", repl.render());
            Ok(())
        }
        Commands::Annotate { file, output } => run_annotate(&file, output.as_deref()),
        Commands::List { library, category } => run_list(library, category),
    }
}

fn open_problem(problem: &ProblemArgs, overrides: &SettingOverrides, mut settings: Settings) -> Result<Repl> {
    overrides.apply(&mut settings);
    let tree = load_tree(problem)?;
    let game = Game::new(tree, &settings);
    Ok(Repl::new(game, settings.show_coordinates))
}

fn load_tree(problem: &ProblemArgs) -> Result<GameTree> {
    match (&problem.file, &problem.library, &problem.category) {
        (Some(file), _, _) => {
            let text = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
            Ok(GameTree::parse_or_degenerate(&text, Arc::new(SequentialIds::new())))
        }
        (None, Some(root), Some(category)) => {
            let mut loader = ProblemLoader::new(DirectorySource::new(root));
            loader
                .load(category, problem.id)
                .with_context(|| format!("failed to load problem {category}/{}", problem.id))
        }
        _ => bail!("give an SGF file or --library with --category"),
    }
}

fn run_console(mut repl: Repl) -> Result<()> {
    let stdin = io::stdin();
    repl.run(stdin.lock(), io::stdout()).context("console I/O failed")
}

fn run_annotate(file: &Path, output: Option<&Path>) -> Result<()> {
    let text = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let tree = GameTree::parse(&text).with_context(|| format!("failed to parse {}", file.display()))?;
    let labelled = annotate(&tree).context("failed to annotate game tree")?;
    let sgf = labelled.to_sgf();
    match output {
        Some(path) => {
            fs::write(path, sgf).with_context(|| format!("failed to write {}", path.display()))?;
            info!("Wrote annotated problem to {}", path.display());
        }
        None => println!("{sgf}"),
    }
    Ok(())
}

fn run_list(library: PathBuf, category: Option<String>) -> Result<()> {
    let source = DirectorySource::new(library);
    let categories = match category {
        Some(category) => vec![category],
        None => source.categories().context("failed to read library")?,
    };
    for category in categories {
        let ids = source
            .problem_ids(&category)
            .with_context(|| format!("failed to list {category}"))?;
        let ids: Vec<String> = ids.iter().map(u32::to_string).collect();
        println!("{category}: {}", ids.join(" "));
    }
    Ok(())
}
