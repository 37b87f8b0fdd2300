//! App: terminal init, main loop, tick and key handling.

use crate::capsule::{CapsuleBoard, Phase};
use crate::highscores;
use crate::input::{Action, key_to_action};
use crate::match3::SwapBoard;
use crate::pairs::PairBoard;
use crate::sfx::Cue;
use crate::theme::Theme;
use crate::{Args, GameConfig, GameKind};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use std::io::Write;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Delay between cascade steps so each clear/fall can be seen.
const RESOLVE_STEP_MS: u64 = 150;
/// How long the status flash stays up.
const FLASH_MS: u64 = 2000;
const NAME_MAX: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    Scores,
}

/// Which board is active this session.
pub enum Board {
    Swap(SwapBoard),
    Capsule(CapsuleBoard),
    Pairs(PairBoard),
}

impl Board {
    pub fn kind(&self) -> GameKind {
        match self {
            Self::Swap(_) => GameKind::Swap,
            Self::Capsule(_) => GameKind::Capsule,
            Self::Pairs(_) => GameKind::Pairs,
        }
    }

    pub fn score(&self) -> u32 {
        match self {
            Self::Swap(b) => b.score,
            Self::Capsule(b) => b.score,
            Self::Pairs(b) => b.score,
        }
    }

    pub fn level(&self) -> u32 {
        match self {
            Self::Swap(b) => b.level,
            Self::Capsule(b) => b.level,
            Self::Pairs(b) => b.level,
        }
    }
}

pub struct App {
    args: Args,
    config: GameConfig,
    pub theme: Theme,
    pub screen: Screen,
    pub menu_selected: GameKind,
    pub board: Option<Board>,
    pub paused: bool,
    /// Last gravity tick (capsule descent).
    last_tick: Instant,
    /// Last cascade animation step.
    last_resolve: Instant,
    /// Name entry on the game-over screen.
    pub name_input: String,
    pub final_score: u32,
    pub final_game: GameKind,
    /// Transient status message.
    pub flash: Option<(String, Instant)>,
    /// Match-clear fade (created by ui when a match lands).
    pub match_effect: Option<Effect>,
    pub match_effect_time: Option<Instant>,
    /// Set when a fresh match landed; ui consumes it to build the fade.
    pub pending_effect: bool,
    /// Leaderboard entries for the sidebar, refreshed on game start/submit.
    pub top_scores: Vec<highscores::Entry>,
    games_played: u32,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let menu_selected = args.game.unwrap_or_default();
        let now = Instant::now();
        let mut app = Self {
            args,
            config,
            theme,
            screen: Screen::Menu,
            menu_selected,
            board: None,
            paused: false,
            last_tick: now,
            last_resolve: now,
            name_input: String::new(),
            final_score: 0,
            final_game: GameKind::Swap,
            flash: None,
            match_effect: None,
            match_effect_time: None,
            pending_effect: false,
            top_scores: Vec::new(),
            games_played: 0,
        };
        if app.args.game.is_some() {
            app.start_game(menu_selected);
        }
        Ok(app)
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| crate::ui::draw(f, self, now))?;

            if self.match_effect.as_ref().is_some_and(Effect::done) {
                self.match_effect = None;
                self.match_effect_time = None;
            }
            if self.flash.as_ref().is_some_and(|(_, t)| t.elapsed() >= Duration::from_millis(FLASH_MS)) {
                self.flash = None;
            }

            let timeout = Duration::from_millis(16).saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key) {
                            return Ok(());
                        }
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                self.tick(Instant::now());
            }
            self.present_cues();
        }
    }

    fn start_game(&mut self, kind: GameKind) {
        // Vary the seed per game so retries don't replay the same board.
        let seed = self.config.seed.wrapping_add(self.games_played.wrapping_mul(0x9E37));
        self.games_played += 1;
        self.board = Some(match kind {
            GameKind::Swap => Board::Swap(SwapBoard::new(seed)),
            GameKind::Capsule => Board::Capsule(CapsuleBoard::new(seed)),
            GameKind::Pairs => Board::Pairs(PairBoard::new(seed)),
        });
        self.screen = Screen::Playing;
        self.paused = false;
        self.flash = None;
        self.match_effect = None;
        self.match_effect_time = None;
        self.pending_effect = false;
        self.top_scores = highscores::top_scores(kind, 5);
        self.last_tick = Instant::now();
        self.last_resolve = self.last_tick;
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let action = key_to_action(key);
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return true,
                Action::Left | Action::Up => {
                    self.menu_selected = prev_game(self.menu_selected);
                }
                Action::Right | Action::Down => {
                    self.menu_selected = next_game(self.menu_selected);
                }
                Action::Select => self.start_game(self.menu_selected),
                _ => {}
            },
            Screen::Playing => {
                if action == Action::Pause {
                    self.paused = !self.paused;
                } else if action == Action::Quit {
                    if self.paused {
                        self.screen = Screen::Menu;
                        self.board = None;
                    } else {
                        self.paused = true;
                    }
                } else if !self.paused {
                    self.apply_action(action);
                }
            }
            Screen::GameOver => match key.code {
                KeyCode::Esc => {
                    self.screen = Screen::Menu;
                    self.board = None;
                }
                KeyCode::Enter => {
                    let name = if self.name_input.trim().is_empty() {
                        "anon"
                    } else {
                        self.name_input.trim()
                    };
                    if highscores::record_score(self.final_game, name, self.final_score).is_err() {
                        self.flash = Some(("could not save score".into(), Instant::now()));
                    }
                    self.top_scores = highscores::top_scores(self.final_game, highscores::MAX_ENTRIES);
                    self.screen = Screen::Scores;
                    self.board = None;
                }
                KeyCode::Backspace => {
                    self.name_input.pop();
                }
                KeyCode::Char(c) => {
                    if !c.is_control() && self.name_input.len() < NAME_MAX {
                        self.name_input.push(c);
                    }
                }
                _ => {}
            },
            Screen::Scores => match action {
                Action::Quit | Action::Select => self.screen = Screen::Menu,
                _ => {}
            },
        }
        false
    }

    fn apply_action(&mut self, action: Action) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        match board {
            Board::Swap(b) => match action {
                Action::Left => b.move_cursor(0, -1),
                Action::Right => b.move_cursor(0, 1),
                Action::Up => b.move_cursor(-1, 0),
                Action::Down => b.move_cursor(1, 0),
                Action::Select => {
                    let before = b.score;
                    b.select();
                    if b.score > before {
                        // ui picks this up and builds the fade effect.
                        self.pending_effect = true;
                        self.match_effect = None;
                        self.match_effect_time = None;
                    }
                }
                _ => {}
            },
            Board::Capsule(b) => match action {
                Action::Left => b.move_left(),
                Action::Right => b.move_right(),
                Action::Up | Action::Select => b.rotate(),
                Action::Down => b.set_soft_drop(true),
                _ => {}
            },
            Board::Pairs(b) => match action {
                Action::Left => b.move_cursor(-1, 0),
                Action::Right => b.move_cursor(1, 0),
                Action::Up => b.move_cursor(0, -1),
                Action::Down => b.move_cursor(0, 1),
                Action::Select => {
                    b.tap();
                    b.ensure_cursor_visible();
                }
                _ => {}
            },
        }
    }

    fn tick(&mut self, now: Instant) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        match board {
            Board::Swap(b) => {
                if b.level_cleared {
                    b.level_cleared = false;
                    self.flash = Some((format!("Level {}!", b.level), now));
                }
            }
            Board::Capsule(b) => {
                match b.phase {
                    Phase::Spawning | Phase::Locking => b.tick(),
                    Phase::Falling => {
                        let rate = self.config.tick_rate
                            * (1.0 + f64::from(b.level.saturating_sub(1)) * 0.15);
                        let mut interval = Duration::from_secs_f64(1.0 / rate.max(0.1));
                        if b.soft_drop {
                            interval /= 8;
                        }
                        if now.duration_since(self.last_tick) >= interval {
                            self.last_tick = now;
                            b.tick();
                        }
                    }
                    Phase::Resolving => {
                        if self.config.no_animation {
                            // Drain the whole cascade in one frame. Each step
                            // leaves matches behind until the grid is stable.
                            while b.phase == Phase::Resolving {
                                b.tick();
                                if b.last_matched.is_empty() {
                                    break;
                                }
                            }
                        } else if now.duration_since(self.last_resolve)
                            >= Duration::from_millis(RESOLVE_STEP_MS)
                        {
                            self.last_resolve = now;
                            b.tick();
                            if !b.last_matched.is_empty() {
                                self.pending_effect = true;
                                self.match_effect = None;
                                self.match_effect_time = None;
                            }
                        }
                    }
                    Phase::GameOver => {}
                }
                let cascade_drained = b.last_matched.is_empty() || self.config.no_animation;
                if b.level_cleared && cascade_drained {
                    let level = b.level;
                    b.next_level();
                    self.flash = Some((format!("Level {} cleared!", level), now));
                } else if b.is_game_over() {
                    self.final_score = b.score;
                    self.final_game = GameKind::Capsule;
                    self.name_input.clear();
                    self.screen = Screen::GameOver;
                }
            }
            Board::Pairs(b) => {
                if b.board_cleared {
                    let level = b.level;
                    let seed = self.config.seed.wrapping_add(b.level.wrapping_mul(0x51DE));
                    b.next_level(seed);
                    self.flash = Some((format!("Board {} cleared!", level), now));
                } else if !b.has_moves() && b.remaining() > 0 {
                    self.final_score = b.score;
                    self.final_game = GameKind::Pairs;
                    self.name_input.clear();
                    self.screen = Screen::GameOver;
                }
            }
        }
    }

    /// Drain semantic cues. Match/clear cues ring the terminal bell when
    /// enabled; terminal failures never touch board state.
    fn present_cues(&mut self) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        let cues = match board {
            Board::Swap(b) => b.cues.drain(),
            Board::Capsule(b) => b.cues.drain(),
            Board::Pairs(b) => b.cues.drain(),
        };
        if cues.is_empty() {
            return;
        }
        if self.config.bell {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(b"\x07");
            let _ = stdout.flush();
        }
        if cues.contains(&Cue::Victory) {
            self.flash = Some(("Cleared!".into(), Instant::now()));
        }
    }

    pub fn no_animation(&self) -> bool {
        self.config.no_animation
    }
}

fn next_game(kind: GameKind) -> GameKind {
    match kind {
        GameKind::Swap => GameKind::Capsule,
        GameKind::Capsule => GameKind::Pairs,
        GameKind::Pairs => GameKind::Swap,
    }
}

fn prev_game(kind: GameKind) -> GameKind {
    match kind {
        GameKind::Swap => GameKind::Pairs,
        GameKind::Capsule => GameKind::Swap,
        GameKind::Pairs => GameKind::Capsule,
    }
}
