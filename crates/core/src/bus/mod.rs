// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::config::SimulationConfig;
use crate::peripherals::{Housekeeping, LogicAnalyzer, Z80Bridge};
use crate::{Peripheral, SimResult, SimulationError};
use zube_bridge::regs;
use zube_bridge::sequencer::{ACTIVATE_BANK, ACTIVATE_LINE, RESET_BANK, RESET_LINE};
use zube_config::{parse_size, Arch, ChipDescriptor};

/// Logic analyzer line wired to the bridge's active-low reset.
pub const RESET_B_LINE: usize = RESET_BANK * 32 + RESET_LINE as usize;
/// Logic analyzer line that enables the bridge.
pub const ACTIVATE_LA_LINE: usize = ACTIVATE_BANK * 32 + ACTIVATE_LINE as usize;

const DEFAULT_WINDOW: u64 = 0x1000;

#[derive(Debug)]
pub struct PeripheralEntry {
    pub name: String,
    pub base: u64,
    pub size: u64,
    pub dev: Box<dyn Peripheral>,
}

#[derive(Debug)]
pub struct SystemBus {
    pub peripherals: Vec<PeripheralEntry>,
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemBus {
    /// Built-in Caravel map with default timing.
    pub fn new() -> Self {
        Self::with_config(&SimulationConfig::default())
    }

    pub fn with_config(config: &SimulationConfig) -> Self {
        Self {
            peripherals: vec![
                PeripheralEntry {
                    name: "la".to_string(),
                    base: regs::LA_BASE as u64,
                    size: 0x100,
                    dev: Box::new(LogicAnalyzer::new()),
                },
                PeripheralEntry {
                    name: "housekeeping".to_string(),
                    base: regs::HOUSEKEEPING_BASE as u64,
                    size: 0x1000,
                    dev: Box::new(Housekeeping::new(config.xfer_latency)),
                },
                PeripheralEntry {
                    name: "z80_bridge".to_string(),
                    base: regs::BRIDGE_BASE as u64,
                    size: 0x10,
                    dev: Box::new(Z80Bridge::new()),
                },
            ],
        }
    }

    pub fn from_config(chip: &ChipDescriptor, config: &SimulationConfig) -> anyhow::Result<Self> {
        if chip.arch != Arch::RiscV {
            tracing::warn!(
                "Chip '{}' declares arch {:?}; the bridge firmware targets RV32",
                chip.name,
                chip.arch
            );
        }

        let mut bus = Self {
            peripherals: Vec::new(),
        };

        for p_cfg in &chip.peripherals {
            if chip
                .peripheral(&p_cfg.id)
                .is_some_and(|first| !std::ptr::eq(first, p_cfg))
            {
                anyhow::bail!("Duplicate peripheral id '{}'", p_cfg.id);
            }
            let dev: Box<dyn Peripheral> = match p_cfg.r#type.as_str() {
                "housekeeping" => {
                    let latency = match p_cfg.config_u64("xfer_latency")? {
                        Some(l) => u32::try_from(l).map_err(|_| {
                            anyhow::anyhow!(
                                "xfer_latency {} of peripheral '{}' is out of range",
                                l,
                                p_cfg.id
                            )
                        })?,
                        None => config.xfer_latency,
                    };
                    Box::new(Housekeeping::new(latency))
                }
                "logic_analyzer" => Box::new(LogicAnalyzer::new()),
                "z80_bridge" => Box::new(Z80Bridge::new()),
                other => {
                    tracing::warn!(
                        "Unsupported peripheral type '{}' for id '{}'; skipping",
                        other,
                        p_cfg.id
                    );
                    continue;
                }
            };

            let size = if let Some(size) = &p_cfg.size {
                parse_size(size)?
            } else {
                DEFAULT_WINDOW
            };

            bus.peripherals.push(PeripheralEntry {
                name: p_cfg.id.clone(),
                base: p_cfg.base_address,
                size,
                dev,
            });
        }

        Ok(bus)
    }

    fn locate(&self, addr: u64) -> SimResult<(usize, u64)> {
        if addr % 4 != 0 {
            return Err(SimulationError::MemoryViolation(addr));
        }
        self.peripherals
            .iter()
            .position(|p| addr >= p.base && addr < p.base + p.size)
            .map(|idx| (idx, addr - self.peripherals[idx].base))
            .ok_or(SimulationError::MemoryViolation(addr))
    }

    pub fn read_u32(&self, addr: u64) -> SimResult<u32> {
        let (idx, offset) = self.locate(addr)?;
        self.peripherals[idx].dev.read(offset)
    }

    pub fn write_u32(&mut self, addr: u64, value: u32) -> SimResult<()> {
        let (idx, offset) = self.locate(addr)?;
        self.peripherals[idx].dev.write(offset, value)?;
        self.propagate_lines();
        Ok(())
    }

    pub fn tick(&mut self) {
        for p in &mut self.peripherals {
            p.dev.tick();
        }
        self.propagate_lines();
    }

    /// Copies the logic analyzer lines into the bridge's reset and enable inputs.
    fn propagate_lines(&mut self) {
        let Some(la) = self.find::<LogicAnalyzer>() else {
            return;
        };
        let (reset_b, enable) = (la.level(RESET_B_LINE), la.level(ACTIVATE_LA_LINE));
        if let Some(bridge) = self.find_mut::<Z80Bridge>() {
            bridge.drive(reset_b, enable);
        }
    }

    /// First peripheral of type `T`.
    pub fn find<T: 'static>(&self) -> Option<&T> {
        self.peripherals
            .iter()
            .find_map(|p| p.dev.as_any().and_then(|a| a.downcast_ref::<T>()))
    }

    pub fn find_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.peripherals
            .iter_mut()
            .find_map(|p| p.dev.as_any_mut().and_then(|a| a.downcast_mut::<T>()))
    }

    pub fn snapshot(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .peripherals
            .iter()
            .map(|p| (p.name.clone(), p.dev.snapshot()))
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::DigitalLevel;

    #[test]
    fn test_unmapped_and_unaligned_accesses() {
        let mut bus = SystemBus::new();
        assert!(matches!(
            bus.read_u32(0x4000_0000),
            Err(SimulationError::MemoryViolation(0x4000_0000))
        ));
        assert!(matches!(
            bus.write_u32(regs::BRIDGE_DATA as u64 + 1, 0),
            Err(SimulationError::MemoryViolation(_))
        ));
    }

    #[test]
    fn test_la_lines_reach_bridge() {
        let mut bus = SystemBus::new();
        bus.write_u32(regs::la_oenb(0) as u64, 0).unwrap();
        bus.write_u32(regs::la_data(0) as u64, 1).unwrap();
        assert!(!bus.find::<Z80Bridge>().unwrap().in_reset());

        bus.write_u32(regs::la_data(0) as u64, 0).unwrap();
        assert!(bus.find::<Z80Bridge>().unwrap().in_reset());
        assert_eq!(
            bus.find::<LogicAnalyzer>().unwrap().level(RESET_B_LINE),
            Some(DigitalLevel::Low)
        );
    }

    #[test]
    fn test_from_config_reads_latency_and_skips_unknown() {
        let chip = ChipDescriptor::from_yaml(
            r#"
name: "caravel"
arch: "picorv32"
peripherals:
  - id: "hk"
    type: "housekeeping"
    base_address: 0x26000000
    config:
      xfer_latency: 0
  - id: "uart"
    type: "uart"
    base_address: 0x20000000
"#,
        )
        .unwrap();
        let mut bus = SystemBus::from_config(&chip, &SimulationConfig::default()).unwrap();
        assert_eq!(bus.peripherals.len(), 1);

        bus.write_u32(regs::mprj_io(8) as u64, 0x0402).unwrap();
        bus.write_u32(regs::MPRJ_XFER as u64, 1).unwrap();
        assert_eq!(bus.read_u32(regs::MPRJ_XFER as u64).unwrap(), 0);
        assert_eq!(
            bus.find::<Housekeeping>().unwrap().live_word(8),
            Some(0x0402)
        );
    }

    #[test]
    fn test_from_config_rejects_duplicate_ids() {
        let chip = ChipDescriptor::from_yaml(
            r#"
name: "caravel"
arch: "picorv32"
peripherals:
  - id: "hk"
    type: "housekeeping"
    base_address: 0x26000000
  - id: "hk"
    type: "logic_analyzer"
    base_address: 0x25000000
"#,
        )
        .unwrap();
        let err = SystemBus::from_config(&chip, &SimulationConfig::default()).unwrap_err();
        assert!(err.to_string().contains("'hk'"), "{}", err);
    }

    #[test]
    fn test_snapshot_names_every_peripheral() {
        let bus = SystemBus::new();
        let snap = bus.snapshot();
        for name in ["la", "housekeeping", "z80_bridge"] {
            assert!(snap.get(name).is_some(), "missing {name}");
        }
    }
}
