// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use core::convert::Infallible;

/// 32-bit register access to the management SoC address space.
///
/// On target the error type is [`Infallible`]; host models may report
/// accesses that hit nothing.
pub trait RegisterBus {
    type Error;

    fn read(&mut self, addr: u32) -> Result<u32, Self::Error>;
    fn write(&mut self, addr: u32, value: u32) -> Result<(), Self::Error>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    type Error = B::Error;

    fn read(&mut self, addr: u32) -> Result<u32, Self::Error> {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u32, value: u32) -> Result<(), Self::Error> {
        (**self).write(addr, value)
    }
}

/// Volatile, uncached access to the physical address space.
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// # Safety
    ///
    /// Must only be created once, on the management core, where every address
    /// in [`crate::regs`] is a mapped, word-aligned register.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for Mmio {
    type Error = Infallible;

    #[inline(always)]
    fn read(&mut self, addr: u32) -> Result<u32, Infallible> {
        // SAFETY: `Mmio::new` contract guarantees addr is a mapped register.
        Ok(unsafe { core::ptr::read_volatile(addr as usize as *const u32) })
    }

    #[inline(always)]
    fn write(&mut self, addr: u32, value: u32) -> Result<(), Infallible> {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(addr as usize as *mut u32, value) };
        Ok(())
    }
}
