// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Project activation and reset over the logic analyzer lines.

use crate::regs;
use crate::wait;
use crate::RegisterBus;

/// Bank 1 line 5 enables the Zube user project.
pub const ACTIVATE_BANK: usize = 1;
pub const ACTIVATE_LINE: u32 = 5;

/// Bank 0 line 0 is the wrapper's active-low reset.
pub const RESET_BANK: usize = 0;
pub const RESET_LINE: u32 = 0;

pub fn activate<B: RegisterBus + ?Sized>(bus: &mut B) -> Result<(), B::Error> {
    bus.write(regs::la_iena(ACTIVATE_BANK), 0)?;
    bus.write(regs::la_oenb(ACTIVATE_BANK), 0)?;
    bus.write(regs::la_data(ACTIVATE_BANK), 1 << ACTIVATE_LINE)?;
    wait::commit(bus)?;
    debug!("user project activated");
    Ok(())
}

/// Drives the reset line high, takes ownership of the bank, then pulls it low
/// and releases it. The line goes high, low, high whatever its prior state.
pub fn pulse_reset<B: RegisterBus + ?Sized>(bus: &mut B) -> Result<(), B::Error> {
    let line = 1 << RESET_LINE;
    bus.write(regs::la_data(RESET_BANK), line)?;
    bus.write(regs::la_oenb(RESET_BANK), 0)?;
    bus.write(regs::la_iena(RESET_BANK), 0)?;
    bus.write(regs::la_data(RESET_BANK), 0)?;
    bus.write(regs::la_data(RESET_BANK), line)?;
    debug!("user project reset released");
    Ok(())
}

pub fn set_base_address<B: RegisterBus + ?Sized>(bus: &mut B) -> Result<(), B::Error> {
    bus.write(regs::BRIDGE_BASE_ADDRESS, regs::Z80_BASE_ADDRESS as u32)?;
    debug!(base = regs::Z80_BASE_ADDRESS, "bridge answering on Z80 port");
    Ok(())
}

/// Activation, reset and bridge addressing, in that order. The bridge ignores
/// register writes until its reset has been released.
pub fn run<B: RegisterBus + ?Sized>(bus: &mut B) -> Result<(), B::Error> {
    activate(bus)?;
    pulse_reset(bus)?;
    set_base_address(bus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBus;

    #[test]
    fn test_sequence_order() {
        let mut bus = RecordingBus::with_xfer_script(&[1, 1, 0]);
        run(&mut bus).unwrap();

        assert_eq!(
            bus.writes(),
            vec![
                (regs::la_iena(1), 0),
                (regs::la_oenb(1), 0),
                (regs::la_data(1), 0x20),
                (regs::MPRJ_XFER, 1),
                (regs::la_data(0), 1),
                (regs::la_oenb(0), 0),
                (regs::la_iena(0), 0),
                (regs::la_data(0), 0),
                (regs::la_data(0), 1),
                (regs::BRIDGE_BASE_ADDRESS, 0x81),
            ]
        );
    }

    #[test]
    fn test_reset_waits_for_activation_commit() {
        let mut bus = RecordingBus::with_xfer_script(&[1, 1, 1, 0]);
        run(&mut bus).unwrap();

        let first_reset_write = bus
            .log
            .iter()
            .position(|a| *a == crate::testing::Access::Write(regs::la_data(0), 1))
            .unwrap();
        let last_xfer_read = bus
            .log
            .iter()
            .rposition(|a| *a == crate::testing::Access::Read(regs::MPRJ_XFER, 0))
            .unwrap();
        assert!(last_xfer_read < first_reset_write);
        assert_eq!(bus.reads_of(regs::MPRJ_XFER), 4);
    }

    #[test]
    fn test_reset_line_levels() {
        let mut bus = RecordingBus::new();
        pulse_reset(&mut bus).unwrap();

        let levels: Vec<u32> = bus
            .writes()
            .into_iter()
            .filter(|&(addr, _)| addr == regs::la_data(RESET_BANK))
            .map(|(_, v)| v & 1)
            .collect();
        assert_eq!(levels, vec![1, 0, 1]);
    }
}
