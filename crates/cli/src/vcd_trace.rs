// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use vcd::{IdCode, TimescaleUnit, Value, Writer};
use zube_core::bus::{ACTIVATE_LA_LINE, RESET_B_LINE};
use zube_core::signals::DigitalLevel;
use zube_core::soc::Soc;

const STATUS_WIDTH: u32 = 4;

enum Change {
    Line(IdCode, Option<DigitalLevel>),
    Status(u8),
}

/// Dumps the bridge reset and enable lines and the Z80 status port, one
/// timestep per SoC cycle.
pub fn write_vcd(path: &Path, soc: &Soc) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create VCD {:?}", path))?;
    let mut writer = Writer::new(BufWriter::new(file));

    writer.timescale(1, TimescaleUnit::NS)?;
    writer.add_module("caravel")?;

    writer.add_module("la")?;
    let reset_b = writer.add_wire(1, "reset_b")?;
    let activate = writer.add_wire(1, "activate")?;
    writer.upscope()?; // la

    writer.add_module("z80_bridge")?;
    let status = writer.add_wire(STATUS_WIDTH, "status")?;
    writer.upscope()?; // z80_bridge

    writer.upscope()?; // caravel
    writer.enddefinitions()?;

    writer.timestamp(0)?;
    writer.change_scalar(reset_b, Value::Z)?;
    writer.change_scalar(activate, Value::Z)?;
    writer.change_vector(status, u64_to_vec(0, STATUS_WIDTH))?;

    let mut changes: Vec<(u64, Change)> = Vec::new();
    if let Some(la) = soc.logic_analyzer() {
        for (id, line) in [(reset_b, RESET_B_LINE), (activate, ACTIVATE_LA_LINE)] {
            if let Some(trace) = la.trace(line) {
                changes.extend(
                    trace
                        .changes()
                        .iter()
                        .map(|&(cycle, level)| (cycle, Change::Line(id, level))),
                );
            }
        }
    }
    if let Some(bridge) = soc.bridge() {
        changes.extend(
            bridge
                .status_changes()
                .iter()
                .map(|&(cycle, bits)| (cycle, Change::Status(bits))),
        );
    }
    changes.sort_by_key(|(cycle, _)| *cycle);

    let mut now = 0;
    for (cycle, change) in changes {
        if cycle != now {
            writer.timestamp(cycle)?;
            now = cycle;
        }
        match change {
            Change::Line(id, level) => writer.change_scalar(id, level_to_value(level))?,
            Change::Status(bits) => {
                writer.change_vector(status, u64_to_vec(bits as u64, STATUS_WIDTH))?
            }
        }
    }
    if soc.cycles() > now {
        writer.timestamp(soc.cycles())?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush VCD {:?}", path))?;
    Ok(())
}

fn level_to_value(level: Option<DigitalLevel>) -> Value {
    match level {
        Some(DigitalLevel::High) => Value::V1,
        Some(DigitalLevel::Low) => Value::V0,
        None => Value::Z,
    }
}

// MSB first
fn u64_to_vec(val: u64, width: u32) -> Vec<Value> {
    (0..width)
        .rev()
        .map(|i| if (val >> i) & 1 == 1 { Value::V1 } else { Value::V0 })
        .collect()
}
