// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Firmware plus an external Z80 on one simulated board.

use crate::bus::SystemBus;
use crate::config::SimulationConfig;
use crate::peripherals::Z80Status;
use crate::signals::SignalTrace;
use crate::soc::Soc;
use crate::SimResult;
use serde::Serialize;
use std::path::Path;
use zube_bridge::regs::Z80_BASE_ADDRESS;
use zube_bridge::{complement, Bridge};
use zube_config::{BenchScript, ChipDescriptor, Exchange};

pub const DEFAULT_MAX_POLLS: u32 = 20;

/// `count` exchanges sending `i` to data and `i + 1` to control.
pub fn ping_sequence(count: u32) -> Vec<Exchange> {
    (0..count)
        .map(|i| Exchange {
            data: i as u8,
            control: i.wrapping_add(1) as u8,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ExchangeOutcome {
    pub sent: Exchange,
    pub data_reply: Option<u8>,
    pub control_reply: Option<u8>,
    /// Firmware poll iterations until both replies were ready.
    pub polls: u32,
}

impl ExchangeOutcome {
    pub fn answered(&self) -> bool {
        self.data_reply.is_some() && self.control_reply.is_some()
    }

    pub fn is_complement(&self) -> bool {
        self.data_reply == Some(complement(self.sent.data as u32))
            && self.control_reply == Some(complement(self.sent.control as u32))
    }
}

/// Runs the bridge firmware against the SoC model and plays the Z80 against
/// it. Firmware poll iterations and Z80 status reads are interleaved on one
/// thread.
#[derive(Debug)]
pub struct Testbench {
    bridge: Bridge<Soc>,
    port: u8,
    max_polls: u32,
}

impl Testbench {
    pub fn new(soc: Soc) -> Self {
        Self {
            bridge: Bridge::new(soc),
            port: Z80_BASE_ADDRESS,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// Port the Z80 addresses; data at `port`, control at `port + 1`, status
    /// at `port + 2`.
    pub fn with_port(mut self, port: u8) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn from_script(script: &BenchScript, script_path: &Path) -> anyhow::Result<Self> {
        let config = SimulationConfig {
            max_cycles: script.limits.max_cycles,
            ..Default::default()
        };
        let soc = match script.chip_path(script_path) {
            Some(path) => {
                let chip = ChipDescriptor::from_file(&path)?;
                Soc::new(SystemBus::from_config(&chip, &config)?, config)
            }
            None => Soc::caravel(config),
        };
        Ok(Self::new(soc)
            .with_port(script.port.unwrap_or(Z80_BASE_ADDRESS))
            .with_max_polls(script.limits.max_polls))
    }

    pub fn soc(&self) -> &Soc {
        self.bridge.bus()
    }

    pub fn soc_mut(&mut self) -> &mut Soc {
        self.bridge.bus_mut()
    }

    pub fn bring_up(&mut self) -> SimResult<()> {
        self.bridge.bring_up()?;
        tracing::info!(
            cycles = self.soc().cycles(),
            base = ?self.base_address(),
            "firmware bring-up complete"
        );
        Ok(())
    }

    /// One round trip: the Z80 writes both registers, then polls status
    /// between firmware iterations until both replies are ready.
    pub fn exchange(&mut self, exchange: Exchange) -> SimResult<ExchangeOutcome> {
        let port = self.port;
        {
            let mut z80 = self.soc_mut().z80();
            z80.write(port, exchange.data)?;
            z80.write(port.wrapping_add(1), exchange.control)?;
        }

        for poll in 1..=self.max_polls {
            self.bridge.service()?;
            let status = self.soc_mut().z80().read(port.wrapping_add(2))?;
            if Z80Status::from_bits_truncate(status).contains(Z80Status::REPLIES) {
                let mut z80 = self.soc_mut().z80();
                let data_reply = z80.read(port)?;
                let control_reply = z80.read(port.wrapping_add(1))?;
                tracing::debug!(
                    "Exchange {:#04x}/{:#04x} answered {:#04x}/{:#04x} after {} polls",
                    exchange.data,
                    exchange.control,
                    data_reply,
                    control_reply,
                    poll
                );
                return Ok(ExchangeOutcome {
                    sent: exchange,
                    data_reply: Some(data_reply),
                    control_reply: Some(control_reply),
                    polls: poll,
                });
            }
        }

        tracing::warn!(
            "No reply to {:#04x}/{:#04x} within {} polls",
            exchange.data,
            exchange.control,
            self.max_polls
        );
        Ok(ExchangeOutcome {
            sent: exchange,
            data_reply: None,
            control_reply: None,
            polls: self.max_polls,
        })
    }

    pub fn base_address(&self) -> Option<u8> {
        self.soc().bridge().map(|b| b.base_address())
    }

    pub fn reset_trace(&self) -> Option<&SignalTrace> {
        self.soc().reset_trace()
    }
}
