use crate::types::Bar;
use chrono::{DateTime, Utc};

/// Single-pass cursor over a timestamp-ordered bar sequence.
///
/// `look_back(n)` returns the up-to-`n` most recent bars ending at (and
/// including) the bar most recently returned by `next()`. Strategies
/// therefore see the current bar as the last element of their history.
#[derive(Debug)]
pub struct DataFeed {
    bars: Vec<Bar>,
    cursor: usize,
}

impl DataFeed {
    pub fn new(bars: Vec<Bar>) -> Result<Self, String> {
        if bars.is_empty() {
            return Err("DataFeed requires at least one bar".to_string());
        }
        for pair in bars.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(format!(
                    "bar timestamps must be strictly increasing: {} followed by {}",
                    pair[0].timestamp, pair[1].timestamp
                ));
            }
        }
        Ok(Self { bars, cursor: 0 })
    }

    pub fn next(&mut self) -> Option<&Bar> {
        if self.cursor >= self.bars.len() {
            return None;
        }
        let bar = &self.bars[self.cursor];
        self.cursor += 1;
        Some(bar)
    }

    /// Timestamp of the bar most recently returned by `next()`.
    pub fn current_time(&self) -> Option<DateTime<Utc>> {
        if self.cursor == 0 {
            return None;
        }
        Some(self.bars[self.cursor - 1].timestamp)
    }

    pub fn look_back(&self, periods: usize) -> &[Bar] {
        if self.cursor == 0 {
            return &[];
        }
        let start = self.cursor.saturating_sub(periods);
        &self.bars[start..self.cursor]
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }
}
