//! Persist the local leaderboard to disk (XDG config or ~/.config/triptui).
//!
//! One line per entry: `game<TAB>score<TAB>name`. Lines that don't parse are
//! skipped; a missing file is an empty board.

use crate::GameKind;
use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

const FILENAME: &str = "leaderboard";

/// Entries kept per game.
pub const MAX_ENTRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub score: u32,
}

/// Returns the path to the leaderboard file (config dir / triptui / leaderboard).
fn config_path() -> Result<PathBuf> {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if xdg.is_empty() {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".config")
        } else {
            PathBuf::from(xdg)
        }
    } else {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    Ok(base.join("triptui").join(FILENAME))
}

fn load_all() -> Vec<(String, Entry)> {
    let path = match config_path() {
        Ok(p) => p,
        Err(_) => return Vec::new(),
    };
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    parse(&content)
}

fn parse(content: &str) -> Vec<(String, Entry)> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let game = parts.next()?.trim();
            let score = parts.next()?.trim().parse::<u32>().ok()?;
            let name = parts.next()?.trim();
            if game.is_empty() || name.is_empty() {
                return None;
            }
            Some((
                game.to_string(),
                Entry {
                    name: name.to_string(),
                    score,
                },
            ))
        })
        .collect()
}

/// Top scores for one game, highest first, at most `n`.
pub fn top_scores(game: GameKind, n: usize) -> Vec<Entry> {
    let mut entries: Vec<Entry> = load_all()
        .into_iter()
        .filter(|(g, _)| g == game.key())
        .map(|(_, e)| e)
        .collect();
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(n);
    entries
}

/// Record a finished game's score. Keeps at most MAX_ENTRIES per game.
/// Creates the config directory if needed.
pub fn record_score(game: GameKind, name: &str, score: u32) -> Result<()> {
    let mut all = load_all();
    all.push((
        game.key().to_string(),
        Entry {
            name: name.trim().to_string(),
            score,
        },
    ));
    all.sort_by(|a, b| b.1.score.cmp(&a.1.score));

    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    for kind in GameKind::ALL {
        for (_, entry) in all
            .iter()
            .filter(|(g, _)| g == kind.key())
            .take(MAX_ENTRIES)
        {
            writeln!(f, "{}\t{}\t{}", kind.key(), entry.score, entry.name)?;
        }
    }
    Ok(())
}
