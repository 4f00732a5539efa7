// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{Peripheral, SimResult};
use zube_bridge::regs::{MPRJ_IO_COUNT, MPRJ_XFER_BUSY};
use zube_bridge::PadMode;

/// Pad control word every user-area pin holds out of reset.
pub const PAD_POWER_ON: u32 = 0x0403;
const PAD_WORD_MASK: u32 = 0x1FFF;

const XFER: u64 = 0x00;
const IO_BASE: u64 = 0x24;

/// Housekeeping pad block. Writes land in a pending copy; a transfer request
/// copies pending to live after `xfer_latency` ticks.
#[derive(Debug, serde::Serialize)]
pub struct Housekeeping {
    pending: Vec<u32>,
    live: Vec<u32>,
    xfer_latency: u32,
    countdown: Option<u32>,
    transfers: u32,
}

impl Default for Housekeeping {
    fn default() -> Self {
        Self::new(38)
    }
}

impl Housekeeping {
    pub fn new(xfer_latency: u32) -> Self {
        Self {
            pending: vec![PAD_POWER_ON; MPRJ_IO_COUNT],
            live: vec![PAD_POWER_ON; MPRJ_IO_COUNT],
            xfer_latency,
            countdown: None,
            transfers: 0,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.countdown.is_some()
    }

    /// Completed transfers since power-on.
    pub fn transfers(&self) -> u32 {
        self.transfers
    }

    pub fn live_word(&self, pin: usize) -> Option<u32> {
        self.live.get(pin).copied()
    }

    pub fn live_mode(&self, pin: usize) -> Option<PadMode> {
        self.live_word(pin).and_then(PadMode::decode)
    }

    fn latch(&mut self) {
        self.live.copy_from_slice(&self.pending);
        self.countdown = None;
        self.transfers += 1;
        tracing::debug!(transfers = self.transfers, "pad words latched");
    }

    fn pin_for(offset: u64) -> Option<usize> {
        if offset < IO_BASE {
            return None;
        }
        let pin = ((offset - IO_BASE) / 4) as usize;
        (pin < MPRJ_IO_COUNT).then_some(pin)
    }
}

impl Peripheral for Housekeeping {
    fn read(&self, offset: u64) -> SimResult<u32> {
        if offset == XFER {
            return Ok(if self.is_busy() { MPRJ_XFER_BUSY } else { 0 });
        }
        Ok(Self::pin_for(offset)
            .map(|pin| self.pending[pin])
            .unwrap_or(0))
    }

    fn write(&mut self, offset: u64, value: u32) -> SimResult<()> {
        if offset == XFER {
            if value & MPRJ_XFER_BUSY != 0 && !self.is_busy() {
                if self.xfer_latency == 0 {
                    self.latch();
                } else {
                    self.countdown = Some(self.xfer_latency);
                }
            }
            return Ok(());
        }
        match Self::pin_for(offset) {
            Some(pin) => self.pending[pin] = value & PAD_WORD_MASK,
            None => tracing::trace!("Housekeeping: ignored write {:#x} at +{:#x}", value, offset),
        }
        Ok(())
    }

    fn tick(&mut self) {
        match self.countdown {
            Some(n) if n <= 1 => self.latch(),
            Some(n) => self.countdown = Some(n - 1),
            None => {}
        }
    }

    fn as_any(&self) -> Option<&dyn std::any::Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn std::any::Any> {
        Some(self)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
