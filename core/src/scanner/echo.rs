//! # Echo Prober
//!
//! Measures whether an address answers and how fast.
//!
//! With raw socket privileges this is an ICMP echo request. Without them the
//! prober falls back to timing a TCP handshake on a few common ports. Which
//! of the two is used is decided once, when the prober is built, and never
//! re-checked per address.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use assetr_common::config::EchoConfig;
use assetr_common::error::DiscoveryError;
use assetr_common::network::host::ProbeFinding;
use assetr_protocols::icmp::EchoToken;
use async_trait::async_trait;
use tracing::{debug, trace, warn};

use crate::network::tcp::{self, ConnectOutcome};
use crate::network::transport::{self, IcmpChannel};
use crate::runner::{Sink, Worker, WorkerPool};

/// One way of asking "are you there" and timing the answer.
#[async_trait]
pub trait EchoStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Round-trip time, or `None` when the address stayed silent.
    async fn echo(&self, addr: Ipv4Addr) -> Option<Duration>;
}

/// ICMP echo over a raw socket. Needs elevated privileges.
pub struct IcmpEcho {
    timeout: Duration,
    identifier: u16,
    sequence: AtomicU16,
}

impl IcmpEcho {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            identifier: rand::random(),
            sequence: AtomicU16::new(0),
        }
    }
}

#[async_trait]
impl EchoStrategy for IcmpEcho {
    fn name(&self) -> &'static str {
        "icmp"
    }

    async fn echo(&self, addr: Ipv4Addr) -> Option<Duration> {
        let token = EchoToken {
            identifier: self.identifier,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };
        let timeout = self.timeout;

        let result = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<Duration>> {
            let mut channel = IcmpChannel::open()?;
            channel.echo(addr, token, timeout)
        })
        .await
        .ok()?;

        match result {
            Ok(rtt) => rtt,
            Err(e) => {
                trace!("echo: icmp to {addr} failed: {e:#}");
                None
            }
        }
    }
}

/// Times a full TCP handshake on the first port that accepts one.
pub struct HandshakeEcho {
    timeout: Duration,
    ports: Vec<u16>,
}

impl HandshakeEcho {
    pub fn new(timeout: Duration, ports: Vec<u16>) -> Self {
        Self { timeout, ports }
    }
}

#[async_trait]
impl EchoStrategy for HandshakeEcho {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn echo(&self, addr: Ipv4Addr) -> Option<Duration> {
        for &port in &self.ports {
            let target = SocketAddr::new(IpAddr::V4(addr), port);
            if let ConnectOutcome::Open { rtt, .. } = tcp::connect(target, self.timeout).await {
                return Some(rtt);
            }
        }
        None
    }
}

#[derive(Clone)]
pub struct EchoProber {
    strategy: Arc<dyn EchoStrategy>,
    workers: usize,
}

impl EchoProber {
    /// Picks ICMP when raw sockets can be opened, the TCP fallback otherwise.
    pub fn select_strategy(config: &EchoConfig) -> Arc<dyn EchoStrategy> {
        let strategy: Arc<dyn EchoStrategy> = if transport::icmp_available() {
            Arc::new(IcmpEcho::new(config.timeout))
        } else {
            warn!("raw ICMP unavailable, echo falls back to TCP handshakes");
            Arc::new(HandshakeEcho::new(
                config.timeout,
                config.fallback_ports.clone(),
            ))
        };
        debug!("echo strategy: {}", strategy.name());
        strategy
    }

    pub fn with_strategy(strategy: Arc<dyn EchoStrategy>, workers: usize) -> Self {
        Self { strategy, workers }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub async fn probe(&self, addr: Ipv4Addr) -> Option<Duration> {
        self.strategy.echo(addr).await
    }

    pub async fn probe_many(
        &self,
        addrs: Vec<Ipv4Addr>,
        sink: Sink<ProbeFinding>,
    ) -> Result<(), DiscoveryError> {
        WorkerPool::new("echo", self.workers)
            .run(addrs, |_| Ok(self.clone()), sink)
            .await
    }
}

#[async_trait]
impl Worker<Ipv4Addr, ProbeFinding> for EchoProber {
    async fn process(&mut self, addr: Ipv4Addr) -> Option<ProbeFinding> {
        let rtt = self.probe(addr).await?;
        Some(ProbeFinding::echo(addr, rtt))
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
