// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::regs;
use crate::{pads, sequencer, RegisterBus};
use core::convert::Infallible;

bitflags::bitflags! {
    /// Bridge status as seen from the management core.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BridgeStatus: u32 {
        /// The Z80 wrote the data register.
        const DATA_WRITTEN = 1 << 0;
        /// The Z80 wrote the control register.
        const CONTROL_WRITTEN = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Data,
    Control,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Data, Channel::Control];

    pub const fn register(self) -> u32 {
        match self {
            Channel::Data => regs::BRIDGE_DATA,
            Channel::Control => regs::BRIDGE_CONTROL,
        }
    }

    pub const fn status(self) -> BridgeStatus {
        match self {
            Channel::Data => BridgeStatus::DATA_WRITTEN,
            Channel::Control => BridgeStatus::CONTROL_WRITTEN,
        }
    }
}

/// The reply for a received byte: its complement, truncated to 8 bits.
pub const fn complement(word: u32) -> u8 {
    ((word ^ 0xFF) & 0xFF) as u8
}

/// Bytes to write back after one status poll. `None` means the register is
/// left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reply {
    pub data: Option<u8>,
    pub control: Option<u8>,
}

impl Reply {
    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.control.is_none()
    }

    pub fn get(&self, channel: Channel) -> Option<u8> {
        match channel {
            Channel::Data => self.data,
            Channel::Control => self.control,
        }
    }
}

/// One service step. The inputs for channels whose status bit is clear are
/// ignored.
pub fn poll_once(status: BridgeStatus, data_in: u32, control_in: u32) -> Reply {
    Reply {
        data: status
            .contains(BridgeStatus::DATA_WRITTEN)
            .then(|| complement(data_in)),
        control: status
            .contains(BridgeStatus::CONTROL_WRITTEN)
            .then(|| complement(control_in)),
    }
}

/// Owns the register bus for the lifetime of the firmware.
#[derive(Debug)]
pub struct Bridge<B> {
    bus: B,
}

impl<B: RegisterBus> Bridge<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Pads, then activation and reset. Must complete before [`Bridge::service`].
    pub fn bring_up(&mut self) -> Result<(), B::Error> {
        pads::configure(&mut self.bus)?;
        sequencer::run(&mut self.bus)
    }

    pub fn status(&mut self) -> Result<BridgeStatus, B::Error> {
        Ok(BridgeStatus::from_bits_truncate(
            self.bus.read(regs::BRIDGE_STATUS)?,
        ))
    }

    /// Reads the status once, then runs one read-complement-write cycle per
    /// flagged channel, data before control. Registers of unflagged channels
    /// are not touched.
    pub fn service(&mut self) -> Result<Reply, B::Error> {
        let status = self.status()?;
        let mut reply = Reply::default();
        for channel in Channel::ALL {
            if !status.contains(channel.status()) {
                continue;
            }
            let byte = complement(self.bus.read(channel.register())?);
            self.bus.write(channel.register(), byte as u32)?;
            trace!(?channel, reply = byte, "echoed");
            match channel {
                Channel::Data => reply.data = Some(byte),
                Channel::Control => reply.control = Some(byte),
            }
        }
        Ok(reply)
    }

    /// Services the bridge forever. Only returns if the bus reports an error.
    pub fn run(&mut self) -> Result<Infallible, B::Error> {
        loop {
            self.service()?;
        }
    }
}
