// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Ticks between a transfer request and the pad words going live.
    pub xfer_latency: u32,
    /// SoC ticks consumed by one external Z80 I/O cycle.
    pub z80_io_cycles: u32,
    /// Stop with `CycleLimit` once the SoC has run this many ticks.
    pub max_cycles: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            xfer_latency: 38,
            // 4 T-states at 1/8 of the SoC clock.
            z80_io_cycles: 32,
            max_cycles: None,
        }
    }
}
