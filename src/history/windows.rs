//! Fixed-size time windows over a history range

/// Order in which windows are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Most recent window first
    Backward,
    /// Oldest window first
    Forward,
}

/// Half-open `[start_ms, end_ms)` span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Iterator splitting `[start, end)` into windows no longer than `span_ms`.
///
/// Windows are contiguous, non-overlapping and cover the range exactly.
/// An empty or inverted range yields nothing.
#[derive(Debug, Clone)]
pub struct TimeWindows {
    start_ms: i64,
    end_ms: i64,
    span_ms: i64,
    direction: Direction,
}

impl TimeWindows {
    pub fn new(start_ms: i64, end_ms: i64, span_ms: i64, direction: Direction) -> Self {
        Self {
            start_ms,
            end_ms,
            span_ms: span_ms.max(1),
            direction,
        }
    }
}

impl Iterator for TimeWindows {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<TimeWindow> {
        if self.start_ms >= self.end_ms {
            return None;
        }

        let window = match self.direction {
            Direction::Backward => {
                let start_ms = self.end_ms.saturating_sub(self.span_ms).max(self.start_ms);
                let window = TimeWindow {
                    start_ms,
                    end_ms: self.end_ms,
                };
                self.end_ms = start_ms;
                window
            }
            Direction::Forward => {
                let end_ms = self.start_ms.saturating_add(self.span_ms).min(self.end_ms);
                let window = TimeWindow {
                    start_ms: self.start_ms,
                    end_ms,
                };
                self.start_ms = end_ms;
                window
            }
        };

        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.start_ms >= self.end_ms {
            return (0, Some(0));
        }
        let span = (self.end_ms - self.start_ms) as u64;
        let count = span.div_ceil(self.span_ms as u64) as usize;
        (count, Some(count))
    }
}
