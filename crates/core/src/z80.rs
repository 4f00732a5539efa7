// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The external Z80 as a bus master on the user-area pads.

use crate::peripherals::Housekeeping;
use crate::soc::Soc;
use crate::{SimResult, SimulationError};
use zube_bridge::pads::Z80_PADS;

/// Checks every Z80 pin against the pad words currently live.
pub fn check_pads(hk: &Housekeeping) -> SimResult<()> {
    for p in &Z80_PADS {
        let found = hk.live_word(p.pin).unwrap_or(0);
        if found != p.mode.bits() {
            return Err(SimulationError::PadMisconfigured {
                pin: p.pin,
                expected: p.mode,
                found,
            });
        }
    }
    Ok(())
}

/// I/O cycles issued by the Z80. Each one takes `z80_io_cycles` SoC ticks and
/// fails if the pads are not wired for the Z80.
#[derive(Debug)]
pub struct Z80Bus<'a> {
    soc: &'a mut Soc,
}

impl<'a> Z80Bus<'a> {
    pub fn new(soc: &'a mut Soc) -> Self {
        Self { soc }
    }

    fn io_cycle(&mut self) -> SimResult<()> {
        match self.soc.housekeeping() {
            Some(hk) => check_pads(hk)?,
            None => tracing::warn!("No housekeeping block; pad wiring unchecked"),
        }
        let cycles = self.soc.config.z80_io_cycles;
        self.soc.advance(cycles)
    }

    pub fn write(&mut self, port: u8, value: u8) -> SimResult<()> {
        self.io_cycle()?;
        let bridge = self
            .soc
            .bridge_mut()
            .ok_or(SimulationError::BusFloating(port))?;
        bridge.external_write(port, value)?;
        tracing::trace!("Z80: OUT ({:#04x}), {:#04x}", port, value);
        Ok(())
    }

    pub fn read(&mut self, port: u8) -> SimResult<u8> {
        self.io_cycle()?;
        let bridge = self
            .soc
            .bridge_mut()
            .ok_or(SimulationError::BusFloating(port))?;
        let value = bridge.external_read(port)?;
        tracing::trace!("Z80: IN ({:#04x}) -> {:#04x}", port, value);
        Ok(value)
    }
}

impl Soc {
    pub fn z80(&mut self) -> Z80Bus<'_> {
        Z80Bus::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zube_bridge::{regs, PadMode, RegisterBus};

    #[test]
    fn test_power_on_pads_are_rejected() {
        let hk = Housekeeping::new(0);
        match check_pads(&hk) {
            Err(SimulationError::PadMisconfigured {
                pin,
                expected,
                found,
            }) => {
                assert_eq!(pin, 8);
                assert_eq!(expected, PadMode::UserInputNoPull);
                assert_eq!(found, 0x0403);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_z80_cycle_advances_soc() {
        let mut soc = Soc::default();
        zube_bridge::pads::configure(&mut soc).unwrap();
        let before = soc.cycles();
        let err = soc.z80().read(0x83).unwrap_err();
        assert!(matches!(err, SimulationError::BridgeInactive));
        assert_eq!(soc.cycles() - before, soc.config.z80_io_cycles as u64);
    }

    #[test]
    fn test_output_pad_configured_as_input_is_caught() {
        let mut soc = Soc::default();
        zube_bridge::pads::configure(&mut soc).unwrap();
        soc.write(regs::mprj_io(24), PadMode::UserInputNoPull.bits())
            .unwrap();
        zube_bridge::commit(&mut soc).unwrap();
        assert!(matches!(
            soc.z80().write(0x81, 0),
            Err(SimulationError::PadMisconfigured { pin: 24, .. })
        ));
    }
}
