// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::signals::{DigitalLevel, SignalTrace};
use crate::{Peripheral, SimResult};
use zube_bridge::regs::LA_BANKS;

pub const LA_LINES: usize = LA_BANKS * 32;

/// Management-side logic analyzer: data, output-enable-bar and input-enable
/// banks of 32 lines each. Writes take effect immediately.
#[derive(Debug)]
pub struct LogicAnalyzer {
    data: [u32; LA_BANKS],
    oenb: [u32; LA_BANKS],
    iena: [u32; LA_BANKS],
    cycle: u64,
    traces: Vec<SignalTrace>,
}

impl Default for LogicAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogicAnalyzer {
    pub fn new() -> Self {
        Self {
            data: [0; LA_BANKS],
            oenb: [u32::MAX; LA_BANKS],
            iena: [0; LA_BANKS],
            cycle: 0,
            traces: vec![SignalTrace::new(); LA_LINES],
        }
    }

    /// Level the management core drives on `line`, or `None` while the
    /// output is disabled.
    pub fn level(&self, line: usize) -> Option<DigitalLevel> {
        let (bank, bit) = (line / 32, line % 32);
        if bank >= LA_BANKS || self.oenb[bank] & (1 << bit) != 0 {
            return None;
        }
        Some(DigitalLevel::from(self.data[bank] & (1 << bit) != 0))
    }

    pub fn trace(&self, line: usize) -> Option<&SignalTrace> {
        self.traces.get(line)
    }

    fn record_bank(&mut self, bank: usize) {
        for bit in 0..32 {
            let line = bank * 32 + bit;
            let level = self.level(line);
            self.traces[line].record(self.cycle, level);
        }
    }
}

impl Peripheral for LogicAnalyzer {
    fn read(&self, offset: u64) -> SimResult<u32> {
        let bank = ((offset & 0xF) / 4) as usize;
        Ok(match offset {
            0x00..=0x0F => self.data[bank],
            0x10..=0x1F => self.oenb[bank],
            0x20..=0x2F => self.iena[bank],
            _ => 0,
        })
    }

    fn write(&mut self, offset: u64, value: u32) -> SimResult<()> {
        let bank = ((offset & 0xF) / 4) as usize;
        match offset {
            0x00..=0x0F => self.data[bank] = value,
            0x10..=0x1F => self.oenb[bank] = value,
            0x20..=0x2F => {
                self.iena[bank] = value;
                return Ok(());
            }
            _ => {
                tracing::trace!("LA: ignored write {:#x} at +{:#x}", value, offset);
                return Ok(());
            }
        }
        self.record_bank(bank);
        Ok(())
    }

    fn tick(&mut self) {
        self.cycle += 1;
    }

    fn as_any(&self) -> Option<&dyn std::any::Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn std::any::Any> {
        Some(self)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "data": self.data,
            "oenb": self.oenb,
            "iena": self.iena,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_float_out_of_reset() {
        let la = LogicAnalyzer::new();
        assert_eq!(la.level(0), None);
        assert_eq!(la.level(37), None);
        assert_eq!(la.level(LA_LINES), None);
    }

    #[test]
    fn test_enable_then_drive() {
        let mut la = LogicAnalyzer::new();
        la.write(0x04, 1 << 5).unwrap();
        assert_eq!(la.level(37), None);
        la.write(0x14, 0).unwrap();
        assert_eq!(la.level(37), Some(DigitalLevel::High));
        assert_eq!(la.level(36), Some(DigitalLevel::Low));
        assert_eq!(la.read(0x04).unwrap(), 1 << 5);
    }

    #[test]
    fn test_trace_records_pulse() {
        let mut la = LogicAnalyzer::new();
        la.write(0x00, 1).unwrap();
        la.tick();
        la.write(0x10, 0).unwrap();
        la.tick();
        la.write(0x20, 0).unwrap();
        la.write(0x00, 0).unwrap();
        la.tick();
        la.write(0x00, 1).unwrap();

        let trace = la.trace(0).unwrap();
        assert_eq!(
            trace.changes(),
            &[
                (1, Some(DigitalLevel::High)),
                (2, Some(DigitalLevel::Low)),
                (3, Some(DigitalLevel::High)),
            ]
        );
    }

    #[test]
    fn test_input_enable_does_not_drive_lines() {
        let mut la = LogicAnalyzer::new();
        la.write(0x24, 1 << 5).unwrap();
        assert_eq!(la.read(0x24).unwrap(), 1 << 5);
        assert_eq!(la.level(37), None);
        assert!(la.trace(37).unwrap().changes().is_empty());
    }
}
