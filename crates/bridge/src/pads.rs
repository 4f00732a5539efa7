// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! User-area pad configuration for the Z80 bus.
//!
//! Pad control word layout:
//!
//! ```text
//! | DM     | VTRIP | SLOW | AN_POL | AN_SEL | AN_EN | MOD_SEL | INP_DIS | HOLDH | OEB | MGMT_EN |
//! | 12..10 | 9     | 8    | 7      | 6      | 5     | 4       | 3       | 2     | 1   | 0       |
//! ```

use crate::regs;
use crate::wait;
use crate::RegisterBus;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PadConfig: u32 {
        const MGMT_EN = 1 << 0;
        /// Output enable, active low.
        const OEB = 1 << 1;
        const HOLDH = 1 << 2;
        const INP_DIS = 1 << 3;
        const MOD_SEL = 1 << 4;
        const AN_EN = 1 << 5;
        const AN_SEL = 1 << 6;
        const AN_POL = 1 << 7;
        const SLOW = 1 << 8;
        const VTRIP = 1 << 9;

        /// Drive mode field.
        const DM = 0b111 << 10;
        const DM_INPUT = 0b001 << 10;
        const DM_PULLUP = 0b010 << 10;
        const DM_PULLDOWN = 0b011 << 10;
        const DM_STRONG = 0b110 << 10;
    }
}

/// Pad modes used by this design. Pins without one stay at the power-on default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadMode {
    UserInputNoPull,
    UserBidirectional,
    UserOutput,
}

impl PadMode {
    pub const fn config(self) -> PadConfig {
        match self {
            PadMode::UserInputNoPull => PadConfig::DM_INPUT.union(PadConfig::OEB),
            PadMode::UserBidirectional => PadConfig::DM_STRONG,
            PadMode::UserOutput => PadConfig::DM_STRONG.union(PadConfig::INP_DIS),
        }
    }

    pub const fn bits(self) -> u32 {
        self.config().bits()
    }

    /// Recognises a pad control word written by [`configure`].
    pub fn decode(word: u32) -> Option<Self> {
        [
            PadMode::UserInputNoPull,
            PadMode::UserBidirectional,
            PadMode::UserOutput,
        ]
        .into_iter()
        .find(|mode| mode.bits() == word)
    }
}

/// Z80 signal carried by a user-area pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Z80Signal {
    Address(u8),
    Data(u8),
    BusDir,
    ReadStrobeB,
    WriteStrobeB,
    M1,
    IoReqB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadAssignment {
    pub pin: usize,
    pub signal: Z80Signal,
    pub mode: PadMode,
}

const fn pad(pin: usize, signal: Z80Signal, mode: PadMode) -> PadAssignment {
    PadAssignment { pin, signal, mode }
}

use PadMode::{UserBidirectional as BIDIR, UserInputNoPull as INPUT, UserOutput as OUTPUT};
use Z80Signal::{Address as A, Data as D};

/// Pin layout expected by the Zube wrapper. The wrapper numbers its I/O from
/// 0, so wrapper bit `n` sits on pin `n + 8`.
pub const Z80_PADS: [PadAssignment; 21] = [
    pad(8, A(0), INPUT),
    pad(9, A(1), INPUT),
    pad(10, A(2), INPUT),
    pad(11, A(3), INPUT),
    pad(12, A(4), INPUT),
    pad(13, A(5), INPUT),
    pad(14, A(6), INPUT),
    pad(15, A(7), INPUT),
    pad(16, D(0), BIDIR),
    pad(17, D(1), BIDIR),
    pad(18, D(2), BIDIR),
    pad(19, D(3), BIDIR),
    pad(20, D(4), BIDIR),
    pad(21, D(5), BIDIR),
    pad(22, D(6), BIDIR),
    pad(23, D(7), BIDIR),
    pad(24, Z80Signal::BusDir, OUTPUT),
    pad(25, Z80Signal::ReadStrobeB, INPUT),
    pad(26, Z80Signal::WriteStrobeB, INPUT),
    pad(27, Z80Signal::M1, INPUT),
    pad(28, Z80Signal::IoReqB, INPUT),
];

pub fn mode_for(pin: usize) -> Option<PadMode> {
    Z80_PADS.iter().find(|p| p.pin == pin).map(|p| p.mode)
}

/// Writes every pad word in [`Z80_PADS`] and commits them.
pub fn configure<B: RegisterBus + ?Sized>(bus: &mut B) -> Result<(), B::Error> {
    for p in &Z80_PADS {
        bus.write(regs::mprj_io(p.pin), p.mode.bits())?;
    }
    debug!(pads = Z80_PADS.len(), "pad words written, committing");
    wait::commit(bus)?;
    Ok(())
}
