// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Management SoC memory map used by the bring-up code.

/// Housekeeping block holding the user-area pad control words.
pub const HOUSEKEEPING_BASE: u32 = 0x2600_0000;
/// Write 1 to latch all pending pad words; reads back 1 until the latch completes.
pub const MPRJ_XFER: u32 = HOUSEKEEPING_BASE;
pub const MPRJ_XFER_BUSY: u32 = 1 << 0;
pub const MPRJ_IO_BASE: u32 = HOUSEKEEPING_BASE + 0x24;
pub const MPRJ_IO_COUNT: usize = 38;

pub const LA_BASE: u32 = 0x2500_0000;
pub const LA_BANKS: usize = 4;

pub const BRIDGE_BASE: u32 = 0x3000_0000;
pub const BRIDGE_BASE_ADDRESS: u32 = BRIDGE_BASE;
pub const BRIDGE_DATA: u32 = BRIDGE_BASE + 0x4;
pub const BRIDGE_CONTROL: u32 = BRIDGE_BASE + 0x8;
pub const BRIDGE_STATUS: u32 = BRIDGE_BASE + 0xC;

/// Z80 I/O port the bridge answers on: data at +0, control at +1, status at +2.
pub const Z80_BASE_ADDRESS: u8 = 0x81;

/// Pad control word register for user-area pin `pin`.
pub const fn mprj_io(pin: usize) -> u32 {
    MPRJ_IO_BASE + (pin as u32) * 4
}

/// Logic analyzer output data for lines `32*bank .. 32*bank+31`.
pub const fn la_data(bank: usize) -> u32 {
    LA_BASE + (bank as u32) * 4
}

/// Logic analyzer output enable, active low.
pub const fn la_oenb(bank: usize) -> u32 {
    LA_BASE + 0x10 + (bank as u32) * 4
}

/// Logic analyzer input enable.
pub const fn la_iena(bank: usize) -> u32 {
    LA_BASE + 0x20 + (bank as u32) * 4
}
