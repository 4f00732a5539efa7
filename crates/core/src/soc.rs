// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::bus::{SystemBus, RESET_B_LINE};
use crate::config::SimulationConfig;
use crate::peripherals::{Housekeeping, LogicAnalyzer, Z80Bridge};
use crate::signals::SignalTrace;
use crate::{SimResult, SimulationError};
use std::sync::Arc;
use zube_bridge::RegisterBus;

/// Callbacks for management-core register traffic.
pub trait BusObserver: std::fmt::Debug + Send + Sync {
    fn on_read(&self, _addr: u32, _value: u32) {}
    fn on_write(&self, _addr: u32, _value: u32) {}
    fn on_cycles(&self, _cycles: u64) {}
}

/// The management SoC as the bridge firmware sees it. Every register access
/// costs one cycle.
#[derive(Debug)]
pub struct Soc {
    pub bus: SystemBus,
    pub config: SimulationConfig,
    cycles: u64,
    observers: Vec<Arc<dyn BusObserver>>,
}

impl Default for Soc {
    fn default() -> Self {
        Self::caravel(SimulationConfig::default())
    }
}

impl Soc {
    pub fn new(bus: SystemBus, config: SimulationConfig) -> Self {
        Self {
            bus,
            config,
            cycles: 0,
            observers: Vec::new(),
        }
    }

    pub fn caravel(config: SimulationConfig) -> Self {
        Self::new(SystemBus::with_config(&config), config)
    }

    pub fn add_observer(&mut self, observer: Arc<dyn BusObserver>) {
        self.observers.push(observer);
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs the peripherals for `cycles` ticks.
    pub fn advance(&mut self, cycles: u32) -> SimResult<()> {
        for _ in 0..cycles {
            if let Some(limit) = self.config.max_cycles {
                if self.cycles >= limit {
                    return Err(SimulationError::CycleLimit(limit));
                }
            }
            self.bus.tick();
            self.cycles += 1;
        }
        for observer in &self.observers {
            observer.on_cycles(cycles as u64);
        }
        Ok(())
    }

    pub fn housekeeping(&self) -> Option<&Housekeeping> {
        self.bus.find::<Housekeeping>()
    }

    pub fn logic_analyzer(&self) -> Option<&LogicAnalyzer> {
        self.bus.find::<LogicAnalyzer>()
    }

    pub fn bridge(&self) -> Option<&Z80Bridge> {
        self.bus.find::<Z80Bridge>()
    }

    pub fn bridge_mut(&mut self) -> Option<&mut Z80Bridge> {
        self.bus.find_mut::<Z80Bridge>()
    }

    /// History of the bridge's active-low reset line.
    pub fn reset_trace(&self) -> Option<&SignalTrace> {
        self.logic_analyzer().and_then(|la| la.trace(RESET_B_LINE))
    }
}

impl RegisterBus for Soc {
    type Error = SimulationError;

    fn read(&mut self, addr: u32) -> SimResult<u32> {
        let value = self.bus.read_u32(addr as u64)?;
        for observer in &self.observers {
            observer.on_read(addr, value);
        }
        self.advance(1)?;
        Ok(value)
    }

    fn write(&mut self, addr: u32, value: u32) -> SimResult<()> {
        self.bus.write_u32(addr as u64, value)?;
        for observer in &self.observers {
            observer.on_write(addr, value);
        }
        self.advance(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zube_bridge::regs;

    #[test]
    fn test_each_access_costs_a_cycle() {
        let mut soc = Soc::default();
        soc.write(regs::la_oenb(0), 0).unwrap();
        soc.read(regs::la_oenb(0)).unwrap();
        assert_eq!(soc.cycles(), 2);
    }

    #[test]
    fn test_cycle_limit() {
        let mut soc = Soc::caravel(SimulationConfig {
            max_cycles: Some(3),
            ..Default::default()
        });
        soc.advance(3).unwrap();
        assert!(matches!(
            soc.read(regs::MPRJ_XFER),
            Err(SimulationError::CycleLimit(3))
        ));
    }

    #[test]
    fn test_commit_waits_out_transfer_latency() {
        let mut soc = Soc::caravel(SimulationConfig {
            xfer_latency: 10,
            ..Default::default()
        });
        soc.write(regs::mprj_io(24), 0x1808).unwrap();
        let polls = zube_bridge::commit(&mut soc).unwrap();
        assert!(polls > 0);
        assert_eq!(
            soc.housekeeping().unwrap().live_mode(24),
            Some(zube_bridge::PadMode::UserOutput)
        );
    }

    #[test]
    fn test_unmapped_register_is_an_error() {
        let mut soc = Soc::default();
        assert!(matches!(
            soc.write(0x1000_0000, 1),
            Err(SimulationError::MemoryViolation(0x1000_0000))
        ));
    }
}
