/// Tracks which question of the interview is currently in play.
///
/// `current` is monotonically non-decreasing and bounded by `total`; `0`
/// means no question has been asked yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionProgress {
    current: usize,
    total: usize,
}

impl QuestionProgress {
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    /// Marks the first question as asked. Called when the call goes live.
    pub fn begin(&mut self) {
        self.current = self.current.max(1).min(self.total);
    }

    /// Advances to the next question, clamped to the total. Returns whether
    /// the index moved.
    pub fn advance(&mut self) -> bool {
        if self.current < self.total {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.current == self.total
    }

    /// Share of questions asked so far, for progress bars.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}
