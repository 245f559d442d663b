//! # Connection Prober
//!
//! Marks an address live when any of a list of common ports completes a TCP
//! handshake. Ports are tried in order and the first success ends the probe.
//! Refused and timed-out attempts simply move on to the next port.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use assetr_common::config::ConnectConfig;
use assetr_common::error::DiscoveryError;
use assetr_common::network::host::ProbeFinding;
use async_trait::async_trait;
use tracing::trace;

use crate::network::tcp::{self, ConnectOutcome};
use crate::runner::{Sink, Worker, WorkerPool};

#[derive(Debug, Clone)]
pub struct ConnectProber {
    timeout: Duration,
    ports: Vec<u16>,
    workers: usize,
}

impl ConnectProber {
    pub fn new(config: &ConnectConfig) -> Self {
        Self {
            timeout: config.timeout,
            ports: config.ports.clone(),
            workers: config.workers,
        }
    }

    /// Whether any port accepted a connection.
    pub async fn probe(&self, addr: Ipv4Addr) -> bool {
        self.accepting_port(addr).await.is_some()
    }

    /// First port, in configured order, that accepted a connection.
    pub async fn accepting_port(&self, addr: Ipv4Addr) -> Option<u16> {
        for &port in &self.ports {
            match tcp::connect(SocketAddr::new(IpAddr::V4(addr), port), self.timeout).await {
                ConnectOutcome::Open { .. } => return Some(port),
                ConnectOutcome::Failed(e) => trace!("connect: {addr}:{port}: {e}"),
                ConnectOutcome::Refused | ConnectOutcome::TimedOut => {}
            }
        }
        None
    }

    pub async fn probe_many(
        &self,
        addrs: Vec<Ipv4Addr>,
        sink: Sink<ProbeFinding>,
    ) -> Result<(), DiscoveryError> {
        WorkerPool::new("connect", self.workers)
            .run(addrs, |_| Ok(self.clone()), sink)
            .await
    }
}

#[async_trait]
impl Worker<Ipv4Addr, ProbeFinding> for ConnectProber {
    async fn process(&mut self, addr: Ipv4Addr) -> Option<ProbeFinding> {
        let port = self.accepting_port(addr).await?;
        trace!("connect: {addr} accepted on {port}");
        Some(ProbeFinding::connect(addr))
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    const LOOPBACK: Ipv4Addr = Ipv4Addr::LOCALHOST;

    fn prober(ports: Vec<u16>) -> ConnectProber {
        ConnectProber::new(&ConnectConfig {
            timeout: Duration::from_millis(500),
            workers: 4,
            ports,
        })
    }

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind((LOOPBACK, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn first_accepting_port_wins() {
        let (_a, first) = listener().await;
        let (_b, second) = listener().await;
        assert_eq!(
            prober(vec![first, second]).accepting_port(LOOPBACK).await,
            Some(first)
        );
    }

    #[tokio::test]
    async fn refused_ports_are_skipped() {
        let (closed_listener, closed) = listener().await;
        drop(closed_listener);
        let (_open_listener, open) = listener().await;

        assert_eq!(
            prober(vec![closed, open]).accepting_port(LOOPBACK).await,
            Some(open)
        );
        assert!(!prober(vec![closed]).probe(LOOPBACK).await);
    }

    #[tokio::test]
    async fn probe_many_emits_connect_findings() {
        let (_listener, port) = listener().await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        prober(vec![port])
            .probe_many(vec![LOOPBACK], tx)
            .await
            .unwrap();

        assert_eq!(rx.try_recv().unwrap(), ProbeFinding::connect(LOOPBACK));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_port_list_finds_nothing() {
        assert!(!prober(vec![]).probe(LOOPBACK).await);
    }
}
