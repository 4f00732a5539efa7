// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::regs;
use crate::RegisterBus;
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(u32, u32),
    Write(u32, u32),
}

/// Register file that records every access. Reads of the transfer register
/// come from `xfer_script` and return 0 once it runs dry.
#[derive(Debug, Default)]
pub struct RecordingBus {
    pub regs: HashMap<u32, u32>,
    pub log: Vec<Access>,
    pub xfer_script: VecDeque<u32>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_xfer_script(values: &[u32]) -> Self {
        Self {
            xfer_script: values.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.log
            .iter()
            .filter_map(|a| match *a {
                Access::Write(addr, value) => Some((addr, value)),
                Access::Read(..) => None,
            })
            .collect()
    }

    pub fn reads_of(&self, addr: u32) -> usize {
        self.log
            .iter()
            .filter(|a| matches!(a, Access::Read(a, _) if *a == addr))
            .count()
    }
}

impl RegisterBus for RecordingBus {
    type Error = Infallible;

    fn read(&mut self, addr: u32) -> Result<u32, Infallible> {
        let value = if addr == regs::MPRJ_XFER {
            self.xfer_script.pop_front().unwrap_or(0)
        } else {
            self.regs.get(&addr).copied().unwrap_or(0)
        };
        self.log.push(Access::Read(addr, value));
        Ok(value)
    }

    fn write(&mut self, addr: u32, value: u32) -> Result<(), Infallible> {
        self.regs.insert(addr, value);
        self.log.push(Access::Write(addr, value));
        Ok(())
    }
}
