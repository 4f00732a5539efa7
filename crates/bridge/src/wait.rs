// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::regs;
use crate::RegisterBus;

/// Something that can be asked whether a flag is still set.
pub trait FlagSource {
    type Error;

    fn is_set(&mut self) -> Result<bool, Self::Error>;
}

impl<F, E> FlagSource for F
where
    F: FnMut() -> Result<bool, E>,
{
    type Error = E;

    fn is_set(&mut self) -> Result<bool, E> {
        self()
    }
}

/// Spins until `source` reports the flag clear.
///
/// There is no timeout: a flag that never clears hangs the caller. Returns the
/// number of polls that still saw the flag set.
pub fn await_clear<S: FlagSource + ?Sized>(source: &mut S) -> Result<u32, S::Error> {
    let mut busy_polls = 0u32;
    while source.is_set()? {
        busy_polls = busy_polls.wrapping_add(1);
        core::hint::spin_loop();
    }
    Ok(busy_polls)
}

/// The housekeeping transfer flag. Only bit 0 is the busy flag; the other
/// bits of the register are not part of the wait condition.
struct TransferFlag<'a, B: ?Sized> {
    bus: &'a mut B,
}

impl<B: RegisterBus + ?Sized> FlagSource for TransferFlag<'_, B> {
    type Error = B::Error;

    fn is_set(&mut self) -> Result<bool, B::Error> {
        Ok(self.bus.read(regs::MPRJ_XFER)? & regs::MPRJ_XFER_BUSY != 0)
    }
}

/// Latches every pending pad write and blocks until the hardware reports the
/// new configuration live.
pub fn commit<B: RegisterBus + ?Sized>(bus: &mut B) -> Result<u32, B::Error> {
    bus.write(regs::MPRJ_XFER, regs::MPRJ_XFER_BUSY)?;
    let busy_polls = await_clear(&mut TransferFlag { bus })?;
    debug!(busy_polls, "pad configuration transfer complete");
    Ok(busy_polls)
}
