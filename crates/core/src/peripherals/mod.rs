// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod housekeeping;
pub mod logic_analyzer;
pub mod z80_bridge;

pub use housekeeping::Housekeeping;
pub use logic_analyzer::LogicAnalyzer;
pub use z80_bridge::{Z80Bridge, Z80Port, Z80Status};
