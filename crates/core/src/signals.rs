// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::Serialize;

/// Represents a digital signal level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitalLevel {
    #[default]
    Low,
    High,
}

impl From<bool> for DigitalLevel {
    fn from(b: bool) -> Self {
        if b {
            DigitalLevel::High
        } else {
            DigitalLevel::Low
        }
    }
}

impl From<DigitalLevel> for bool {
    fn from(level: DigitalLevel) -> Self {
        match level {
            DigitalLevel::High => true,
            DigitalLevel::Low => false,
        }
    }
}

/// Change history of one line. `None` means nothing drives it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignalTrace {
    changes: Vec<(u64, Option<DigitalLevel>)>,
}

impl SignalTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `level` if it differs from the current one.
    pub fn record(&mut self, cycle: u64, level: Option<DigitalLevel>) {
        if self.current() != level {
            self.changes.push((cycle, level));
        }
    }

    pub fn current(&self) -> Option<DigitalLevel> {
        self.changes.last().and_then(|&(_, level)| level)
    }

    pub fn changes(&self) -> &[(u64, Option<DigitalLevel>)] {
        &self.changes
    }

    /// Successive driven levels, skipping intervals where the line floats.
    pub fn driven_levels(&self) -> Vec<DigitalLevel> {
        let mut levels: Vec<DigitalLevel> = Vec::new();
        for level in self.changes.iter().filter_map(|&(_, level)| level) {
            if levels.last() != Some(&level) {
                levels.push(level);
            }
        }
        levels
    }
}
