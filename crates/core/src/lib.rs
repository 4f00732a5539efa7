// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Host model of the Caravel management SoC around the Zube user project.
//!
//! The bring-up code from `zube-bridge` runs unchanged against [`soc::Soc`],
//! which routes its register accesses to the modelled housekeeping pads, logic
//! analyzer and Z80 bridge. [`bench::Testbench`] plays the external Z80.

pub mod bench;
pub mod bus;
pub mod config;
pub mod metrics;
pub mod peripherals;
pub mod signals;
pub mod soc;
pub mod z80;

use std::any::Any;
use zube_bridge::PadMode;

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Memory access violation at {0:#x}")]
    MemoryViolation(u64),
    #[error("No device answered Z80 I/O port {0:#04x}")]
    BusFloating(u8),
    #[error("Pad {pin} holds {found:#06x} but the Z80 wiring needs {expected:?}")]
    PadMisconfigured {
        pin: usize,
        expected: PadMode,
        found: u32,
    },
    #[error("Z80 bridge is held in reset or not activated")]
    BridgeInactive,
    #[error("Cycle limit of {0} reached")]
    CycleLimit(u64),
}

pub type SimResult<T> = Result<T, SimulationError>;

/// A memory-mapped peripheral with 32-bit registers at word-aligned offsets.
pub trait Peripheral: std::fmt::Debug + Send {
    fn read(&self, offset: u64) -> SimResult<u32>;
    fn write(&mut self, offset: u64, value: u32) -> SimResult<()>;
    fn tick(&mut self) {}
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}
