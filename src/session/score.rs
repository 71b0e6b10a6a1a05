/// Running tally for the current session. `correct <= total` always.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreTally {
    correct: u32,
    total: u32,
}

impl ScoreTally {
    pub fn record(&mut self, was_correct: bool) {
        self.total = self.total.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }
}
