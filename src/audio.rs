use std::io::{self, Write};

use anyhow::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Correct,
    Incorrect,
}

impl Cue {
    pub fn as_str(self) -> &'static str {
        match self {
            Cue::Correct => "correct",
            Cue::Incorrect => "incorrect",
        }
    }
}

/// Fire-and-forget sound output. Callers log failures and carry on.
pub trait CuePlayer {
    fn play(&mut self, cue: Cue) -> Result<()>;
}

/// Rings the terminal bell: once for a correct answer, twice otherwise.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl CuePlayer for TerminalBell {
    fn play(&mut self, cue: Cue) -> Result<()> {
        let bells: &[u8] = match cue {
            Cue::Correct => b"\x07",
            Cue::Incorrect => b"\x07\x07",
        };
        let mut stdout = io::stdout();
        stdout.write_all(bells)?;
        stdout.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Silent;

impl CuePlayer for Silent {
    fn play(&mut self, _cue: Cue) -> Result<()> {
        Ok(())
    }
}

impl<P: CuePlayer + ?Sized> CuePlayer for Box<P> {
    fn play(&mut self, cue: Cue) -> Result<()> {
        (**self).play(cue)
    }
}
