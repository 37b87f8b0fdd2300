//! triptui — three-in-one terminal puzzle bundle: swap match-3, falling
//! capsules, and layered pair matching, with a shared local leaderboard.

mod app;
mod capsule;
mod cascade;
mod grid;
mod highscores;
mod input;
mod match3;
mod matcher;
mod pairs;
mod piece;
mod rng;
mod sfx;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: u32,
    pub tick_rate: f64,
    pub no_animation: bool,
    pub bell: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let seed = args.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
            .unwrap_or(0x5EED)
    });
    let config = GameConfig {
        seed,
        tick_rate: args.tick_rate,
        no_animation: args.no_animation,
        bell: !args.no_bell,
    };
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Three-in-one puzzle bundle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "triptui",
    version,
    about = "Three-in-one terminal puzzle bundle: swap match-3, falling capsules, pair matching.",
    long_about = "Triptui bundles three small puzzle games behind one menu.\n\n\
        swap:    pick two adjacent cells to swap; runs of 3+ clear and refill. 4-runs\n\
        leave a bomb symbol behind, 5-runs a rainbow.\n\
        capsule: steer two-colour capsules onto matching targets; runs of 3+ clear\n\
        and the rest falls. Clear every target to finish the level.\n\
        pairs:   tap two free tiles with the same face to remove them; empty the\n\
        layered board.\n\n\
        CONTROLS:\n  Arrows/hjkl  Move cursor / capsule   Enter/Space  Pick / tap\n  Up           Rotate capsule          Down         Soft drop\n  P            Pause                   Q / Esc      Quit / back\n\n\
        Scores land on a local per-game leaderboard. Use --theme to load a btop-style theme."
)]
pub struct Args {
    /// Start directly in one game, skipping the menu.
    #[arg(short, long)]
    pub game: Option<GameKind>,

    /// Path to theme file (btop-style theme[key]="value"). One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Seed for board generation and symbol draws (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,

    /// Capsule descent ticks per second at level 1.
    #[arg(long, default_value = "2.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Disable the match-clear animation (cascades resolve instantly).
    #[arg(long)]
    pub no_animation: bool,

    /// Disable the terminal bell on match/clear cues.
    #[arg(long)]
    pub no_bell: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

/// The three bundled games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GameKind {
    #[default]
    Swap,
    Capsule,
    Pairs,
}

impl GameKind {
    pub const ALL: [Self; 3] = [Self::Swap, Self::Capsule, Self::Pairs];

    /// Stable key used in the leaderboard file.
    pub fn key(self) -> &'static str {
        match self {
            Self::Swap => "swap",
            Self::Capsule => "capsule",
            Self::Pairs => "pairs",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Swap => "Gem Swap",
            Self::Capsule => "Capsule Drop",
            Self::Pairs => "Tile Pairs",
        }
    }
}
