// src/config.rs
use crate::constants::{DEFAULT_COLUMNS, DEFAULT_LINES, SCROLLBACK_LIMIT};
use crate::error::ScreenError;

/// Construction-time knobs for a [`Screen`](crate::Screen).
#[derive(Clone, Debug)]
pub struct ScreenConfig {
    pub lines: usize,
    pub columns: usize,
    /// Maximum scrollback length; zero disables history entirely.
    pub history_limit: usize,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            lines: DEFAULT_LINES,
            columns: DEFAULT_COLUMNS,
            history_limit: SCROLLBACK_LIMIT,
        }
    }
}

impl ScreenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, lines: usize, columns: usize) -> Self {
        self.lines = lines;
        self.columns = columns;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ScreenError> {
        if self.lines == 0 || self.columns == 0 {
            return Err(ScreenError::InvalidDimensions {
                lines: self.lines,
                columns: self.columns,
            });
        }
        Ok(())
    }
}
