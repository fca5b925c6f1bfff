//! Byte-progress accounting for copy-in.
//!
//! rsync's `--progress` output is consumed line by line. A line is progress
//! data only if its first whitespace-delimited token is an unsigned integer
//! (thousands separators allowed). That number is the byte count reported for
//! the *current file*, and it is simply accumulated, so intermediate reports
//! for the same file are counted again and the running total can overshoot
//! the profile size. Percentages are clamped to 100, which keeps the reported
//! sequence monotonic.

/// Receiver of percent-complete events, implemented by the presentation layer.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, percent: u8);
}

impl<F> ProgressSink for F
where
    F: Fn(u8) + Send + Sync,
{
    fn on_progress(&self, percent: u8) {
        self(percent)
    }
}

/// Running byte count of one copy operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferState {
    total_bytes: u64,
    transferred_bytes: u64,
}

impl TransferState {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            transferred_bytes: 0,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    /// Add `bytes` and return the new clamped percentage.
    pub fn record(&mut self, bytes: u64) -> u8 {
        self.transferred_bytes = self.transferred_bytes.saturating_add(bytes);
        self.percent()
    }

    /// `min(100, transferred / total * 100)`; an empty source is complete.
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let pct = u128::from(self.transferred_bytes) * 100 / u128::from(self.total_bytes);
        pct.min(100) as u8
    }
}

/// Byte count carried by a progress line, if the line is progress data.
pub fn parse_progress_line(line: &str) -> Option<u64> {
    let token = line.split_whitespace().next()?;
    if !token.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let digits: String = token.chars().filter(|c| *c != ',').collect();
    digits.parse().ok()
}
