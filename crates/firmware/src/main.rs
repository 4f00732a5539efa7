// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.
#![no_std]
#![no_main]

use panic_halt as _;
use riscv_rt::entry;
use zube_bridge::{Bridge, Mmio};

#[entry]
fn main() -> ! {
    // The bridge is serviced by polling; nothing here installs a trap handler.
    unsafe { riscv::interrupt::disable() };

    // SAFETY: sole owner of the management SoC registers from here on.
    let mut bridge = Bridge::new(unsafe { Mmio::new() });

    let outcome = bridge.bring_up().and_then(|()| bridge.run());
    match outcome {
        Ok(never) => match never {},
        Err(never) => match never {},
    }
}
