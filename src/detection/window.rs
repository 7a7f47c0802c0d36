/// The last three similarity scores, oldest first.
///
/// Slots start at `0.0`, so fewer than three pushes can never form a falling edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreWindow {
    oldest: f64,
    previous: f64,
    current: f64,
}

impl ScoreWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, score: f64) {
        self.oldest = self.previous;
        self.previous = self.current;
        self.current = score;
    }

    /// Two scores strictly above `threshold` followed by one strictly below it.
    pub fn is_falling_edge(&self, threshold: f64) -> bool {
        self.oldest > threshold && self.previous > threshold && self.current < threshold
    }

    #[cfg(test)]
    pub fn scores(&self) -> [f64; 3] {
        [self.oldest, self.previous, self.current]
    }
}
