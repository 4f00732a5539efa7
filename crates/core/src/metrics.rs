// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::soc::BusObserver;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Counts management-core register traffic.
#[derive(Debug, Default)]
pub struct BusMetrics {
    reads: AtomicU64,
    writes: AtomicU64,
    cycles: AtomicU64,
    writes_by_addr: Mutex<HashMap<u32, u64>>,
}

impl BusMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.reads.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
        self.cycles.store(0, Ordering::SeqCst);
        if let Ok(mut m) = self.writes_by_addr.lock() {
            m.clear();
        }
    }

    pub fn get_reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn get_writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn get_cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    pub fn get_writes_to(&self, addr: u32) -> u64 {
        self.writes_by_addr
            .lock()
            .ok()
            .and_then(|m| m.get(&addr).copied())
            .unwrap_or(0)
    }
}

impl BusObserver for BusMetrics {
    fn on_read(&self, _addr: u32, _value: u32) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn on_write(&self, addr: u32, _value: u32) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut m) = self.writes_by_addr.lock() {
            *m.entry(addr).or_insert(0) += 1;
        }
    }

    fn on_cycles(&self, cycles: u64) {
        self.cycles.fetch_add(cycles, Ordering::SeqCst);
    }
}
