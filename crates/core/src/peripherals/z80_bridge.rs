// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::signals::DigitalLevel;
use crate::{Peripheral, SimResult, SimulationError};
use zube_bridge::BridgeStatus;

bitflags::bitflags! {
    /// Status port as the Z80 reads it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Z80Status: u8 {
        /// Data written by the Z80, not yet answered.
        const DATA_OUT = 1 << 0;
        const CONTROL_OUT = 1 << 1;
        /// Reply waiting in the data register.
        const DATA_IN = 1 << 2;
        const CONTROL_IN = 1 << 3;
    }
}

impl Z80Status {
    pub const REPLIES: Z80Status = Z80Status::DATA_IN.union(Z80Status::CONTROL_IN);
}

const BASE_ADDRESS: u64 = 0x0;
const DATA: u64 = 0x4;
const CONTROL: u64 = 0x8;
const STATUS: u64 = 0xC;

/// Register of the bridge selected by a Z80 I/O port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Z80Port {
    Data,
    Control,
    Status,
}

#[derive(Debug, Clone, Copy, Default)]
struct Channel {
    /// Last byte the Z80 wrote.
    outbound: u8,
    /// Reply written by the management core.
    inbound: u8,
}

/// The user-project bridge. The management core sees it as four words; the
/// Z80 sees three I/O ports starting at the programmed base address.
#[derive(Debug)]
pub struct Z80Bridge {
    base: u8,
    data: Channel,
    control: Channel,
    status: Z80Status,
    in_reset: bool,
    enabled: bool,
    cycle: u64,
    status_changes: Vec<(u64, u8)>,
}

impl Default for Z80Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80Bridge {
    pub fn new() -> Self {
        Self {
            base: 0,
            data: Channel::default(),
            control: Channel::default(),
            status: Z80Status::empty(),
            in_reset: true,
            enabled: false,
            cycle: 0,
            status_changes: vec![(0, 0)],
        }
    }

    pub fn base_address(&self) -> u8 {
        self.base
    }

    pub fn status(&self) -> Z80Status {
        self.status
    }

    pub fn in_reset(&self) -> bool {
        self.in_reset
    }

    /// Out of reset and enabled by the management core.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.in_reset
    }

    /// `(cycle, status)` every time the status port changed.
    pub fn status_changes(&self) -> &[(u64, u8)] {
        &self.status_changes
    }

    /// Applies the logic analyzer lines wired to the bridge. The active-low
    /// reset counts as asserted unless it is driven high.
    pub fn drive(&mut self, reset_b: Option<DigitalLevel>, enable: Option<DigitalLevel>) {
        let in_reset = reset_b != Some(DigitalLevel::High);
        if in_reset && !self.in_reset {
            tracing::debug!("Z80 bridge entering reset");
            self.base = 0;
            self.data = Channel::default();
            self.control = Channel::default();
            self.set_status(Z80Status::empty());
        } else if !in_reset && self.in_reset {
            tracing::debug!("Z80 bridge released from reset");
        }
        self.in_reset = in_reset;
        self.enabled = enable == Some(DigitalLevel::High);
    }

    pub fn decode(&self, port: u8) -> Option<Z80Port> {
        match port.wrapping_sub(self.base) {
            0 => Some(Z80Port::Data),
            1 => Some(Z80Port::Control),
            2 => Some(Z80Port::Status),
            _ => None,
        }
    }

    fn select(&self, port: u8) -> SimResult<Z80Port> {
        if !self.is_active() {
            return Err(SimulationError::BridgeInactive);
        }
        self.decode(port).ok_or(SimulationError::BusFloating(port))
    }

    pub fn external_write(&mut self, port: u8, value: u8) -> SimResult<()> {
        let status = match self.select(port)? {
            Z80Port::Data => {
                self.data.outbound = value;
                (self.status | Z80Status::DATA_OUT) - Z80Status::DATA_IN
            }
            Z80Port::Control => {
                self.control.outbound = value;
                (self.status | Z80Status::CONTROL_OUT) - Z80Status::CONTROL_IN
            }
            Z80Port::Status => return Ok(()),
        };
        self.set_status(status);
        Ok(())
    }

    pub fn external_read(&mut self, port: u8) -> SimResult<u8> {
        Ok(match self.select(port)? {
            Z80Port::Data => {
                self.set_status(self.status - Z80Status::DATA_IN);
                self.data.inbound
            }
            Z80Port::Control => {
                self.set_status(self.status - Z80Status::CONTROL_IN);
                self.control.inbound
            }
            Z80Port::Status => self.status.bits(),
        })
    }

    fn set_status(&mut self, status: Z80Status) {
        if status != self.status {
            self.status = status;
            self.status_changes.push((self.cycle, status.bits()));
        }
    }

    fn software_status(&self) -> BridgeStatus {
        let mut status = BridgeStatus::empty();
        status.set(
            BridgeStatus::DATA_WRITTEN,
            self.status.contains(Z80Status::DATA_OUT),
        );
        status.set(
            BridgeStatus::CONTROL_WRITTEN,
            self.status.contains(Z80Status::CONTROL_OUT),
        );
        status
    }
}

impl Peripheral for Z80Bridge {
    fn read(&self, offset: u64) -> SimResult<u32> {
        if self.in_reset {
            return Ok(0);
        }
        Ok(match offset {
            BASE_ADDRESS => self.base as u32,
            DATA => self.data.outbound as u32,
            CONTROL => self.control.outbound as u32,
            STATUS => self.software_status().bits(),
            _ => 0,
        })
    }

    fn write(&mut self, offset: u64, value: u32) -> SimResult<()> {
        if self.in_reset {
            tracing::warn!(
                "Z80 bridge: write {:#x} at +{:#x} ignored while in reset",
                value,
                offset
            );
            return Ok(());
        }
        let byte = (value & 0xFF) as u8;
        match offset {
            BASE_ADDRESS => self.base = byte,
            DATA => {
                self.data.inbound = byte;
                self.set_status((self.status - Z80Status::DATA_OUT) | Z80Status::DATA_IN);
            }
            CONTROL => {
                self.control.inbound = byte;
                self.set_status(
                    (self.status - Z80Status::CONTROL_OUT) | Z80Status::CONTROL_IN,
                );
            }
            _ => tracing::trace!("Z80 bridge: ignored write at +{:#x}", offset),
        }
        Ok(())
    }

    fn tick(&mut self) {
        self.cycle += 1;
    }

    fn as_any(&self) -> Option<&dyn std::any::Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn std::any::Any> {
        Some(self)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "base_address": self.base,
            "status": self.status.bits(),
            "in_reset": self.in_reset,
            "enabled": self.enabled,
        })
    }
}
