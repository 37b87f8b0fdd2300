//! Semantic audio cues. The boards emit cues; the shell decides how to
//! present them (status flash / terminal bell). No synthesis here.

/// What just happened, for whoever plays sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// A run matched (or a tile pair was found).
    Match,
    /// A board/level finished clearing.
    Clear,
    /// Level or board fully cleared.
    Victory,
    GameOver,
}

/// Queue the shell drains once per frame. Board failures to present a cue
/// must never affect grid state, so this is fire-and-forget.
#[derive(Debug, Default)]
pub struct Cues {
    queue: Vec<Cue>,
}

impl Cues {
    pub fn push(&mut self, cue: Cue) {
        self.queue.push(cue);
    }

    pub fn drain(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_queue() {
        let mut cues = Cues::default();
        cues.push(Cue::Match);
        cues.push(Cue::Victory);
        assert_eq!(cues.drain(), vec![Cue::Match, Cue::Victory]);
        assert!(cues.drain().is_empty());
    }
}
