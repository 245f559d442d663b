//! # Finding Merge
//!
//! Folds the findings of every prober into one [`HostRecord`] per address.
//! Only the consumer loop writes to the map, so no locking is involved.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use assetr_common::network::host::{HostRecord, ProbeFinding};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

/// Called with the running number of live hosts.
pub type ProgressCallback = Box<dyn Fn(usize) + Send + Sync>;

#[derive(Debug, Default)]
pub struct MergeMap {
    records: HashMap<Ipv4Addr, HostRecord>,
}

impl MergeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a finding in. Returns `true` when the address was not known yet.
    pub fn absorb(&mut self, finding: &ProbeFinding) -> bool {
        let mut is_new = false;
        let record = self.records.entry(finding.addr).or_insert_with(|| {
            is_new = true;
            HostRecord::from(finding.addr)
        });
        record.apply(finding);
        is_new
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, addr: &Ipv4Addr) -> Option<&HostRecord> {
        self.records.get(addr)
    }

    /// Live records ordered by numeric address.
    pub fn into_sorted(self) -> Vec<HostRecord> {
        let mut hosts: Vec<HostRecord> = self
            .records
            .into_values()
            .filter(HostRecord::is_live)
            .collect();
        sort_by_address(&mut hosts);
        hosts
    }
}

pub fn sort_by_address(hosts: &mut [HostRecord]) {
    hosts.sort_by_key(|h| u32::from(h.addr));
}

/// Drains `rx` until every sender is gone.
pub async fn consume(
    mut rx: UnboundedReceiver<ProbeFinding>,
    progress: Option<&ProgressCallback>,
) -> MergeMap {
    let mut map = MergeMap::new();
    let mut findings: usize = 0;

    while let Some(finding) = rx.recv().await {
        findings += 1;
        if map.absorb(&finding) {
            debug!("{} is up ({})", finding.addr, finding.method());
            if let Some(cb) = progress {
                cb(map.len());
            }
        }
    }

    debug!("merged {findings} finding(s) into {} record(s)", map.len());
    map
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
