// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Management-core side of the Zube Z80 bridge.
//!
//! Bring-up is three fixed steps run in order: [`pads::configure`] assigns the
//! Z80 pin layout, [`sequencer::run`] activates the user project and pulses its
//! reset, and [`Bridge::run`] services the bridge registers forever.
//!
//! Everything is written against [`RegisterBus`], so the same code drives the
//! real volatile MMIO ([`Mmio`]) on the RV32 core and the host-side SoC model
//! used by the test bench.
#![cfg_attr(not(test), no_std)]

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
    }};
}

macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
    }};
}

pub mod bridge;
pub mod bus;
pub mod pads;
pub mod regs;
pub mod sequencer;
pub mod wait;

#[cfg(test)]
mod testing;

pub use bridge::{complement, poll_once, Bridge, BridgeStatus, Channel, Reply};
pub use bus::{Mmio, RegisterBus};
pub use pads::{PadConfig, PadMode, Z80Signal};
pub use wait::{await_clear, commit, FlagSource};
