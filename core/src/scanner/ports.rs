//! # Port and Service Prober
//!
//! Checks a fixed list of TCP and UDP ports on one live host and names the
//! service behind each.
//!
//! TCP: an accepted connection is open, a refusal is closed, anything else
//! is filtered. Open ports get a short banner read.
//!
//! UDP: the port receives a protocol-specific probe. Any reply means open,
//! silence or an ICMP error means filtered.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use assetr_common::config::PortScanConfig;
use assetr_common::error::DiscoveryError;
use assetr_common::network::host::{MAX_BANNER_LEN, PortRecord, PortState, Transport};
use assetr_protocols::{payloads, services};
use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::network::tcp::{self, ConnectOutcome};
use crate::runner::{Worker, WorkerPool};

#[derive(Debug, Clone)]
pub struct PortProber {
    config: PortScanConfig,
}

impl PortProber {
    pub fn new(config: PortScanConfig) -> Self {
        Self { config }
    }

    /// Probes every configured port on `addr`, TCP first.
    ///
    /// Records come back ordered by transport, then port.
    pub async fn scan_host(&self, addr: Ipv4Addr) -> Result<Vec<PortRecord>, DiscoveryError> {
        let jobs: Vec<(Transport, u16)> = self
            .config
            .tcp_ports
            .iter()
            .map(|&port| (Transport::Tcp, port))
            .chain(self.config.udp_ports.iter().map(|&port| (Transport::Udp, port)))
            .collect();

        let mut records: Vec<PortRecord> = WorkerPool::new("ports", self.config.workers)
            .collect(jobs, |_| {
                Ok(HostPorts {
                    addr,
                    prober: self.clone(),
                })
            })
            .await?;
        records.sort_by_key(|r| (r.transport, r.port));

        debug!(
            "{addr}: {} of {} port(s) open",
            records.iter().filter(|r| r.is_open()).count(),
            records.len()
        );
        Ok(records)
    }

    /// Only the open ports of [`PortProber::scan_host`].
    pub async fn open_ports(&self, addr: Ipv4Addr) -> Result<Vec<PortRecord>, DiscoveryError> {
        let mut records = self.scan_host(addr).await?;
        records.retain(PortRecord::is_open);
        Ok(records)
    }

    pub async fn probe_tcp(&self, addr: Ipv4Addr, port: u16) -> PortRecord {
        let service = services::service_name(port, Transport::Tcp);
        let target = SocketAddr::new(IpAddr::V4(addr), port);

        match tcp::connect(target, self.config.timeout).await {
            ConnectOutcome::Open { mut stream, .. } => {
                let banner =
                    tcp::read_banner(&mut stream, self.config.banner_timeout, MAX_BANNER_LEN)
                        .await;
                PortRecord::new(addr, port, Transport::Tcp, PortState::Open, service)
                    .with_banner(&banner)
            }
            ConnectOutcome::Refused => {
                PortRecord::new(addr, port, Transport::Tcp, PortState::Closed, service)
            }
            ConnectOutcome::TimedOut | ConnectOutcome::Failed(_) => {
                PortRecord::new(addr, port, Transport::Tcp, PortState::Filtered, service)
            }
        }
    }

    pub async fn probe_udp(&self, addr: Ipv4Addr, port: u16) -> PortRecord {
        let service = services::service_name(port, Transport::Udp);
        let filtered = PortRecord::new(addr, port, Transport::Udp, PortState::Filtered, service);

        match self.udp_exchange(addr, port).await {
            Ok(Some(reply)) => {
                PortRecord::new(addr, port, Transport::Udp, PortState::Open, service)
                    .with_banner(&reply)
            }
            Ok(None) => filtered,
            Err(e) => {
                trace!("udp {addr}:{port}: {e}");
                filtered
            }
        }
    }

    async fn udp_exchange(&self, addr: Ipv4Addr, port: u16) -> std::io::Result<Option<Vec<u8>>> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.connect((addr, port)).await?;
        socket.send(payloads::udp_probe(port)).await?;

        let mut buf = vec![0u8; 1500];
        match timeout(self.config.timeout, socket.recv(&mut buf)).await {
            Ok(Ok(n)) => {
                buf.truncate(n.min(MAX_BANNER_LEN));
                Ok(Some(buf))
            }
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(None),
        }
    }
}

/// Port worker bound to a single host.
struct HostPorts {
    addr: Ipv4Addr,
    prober: PortProber,
}

#[async_trait]
impl Worker<(Transport, u16), PortRecord> for HostPorts {
    async fn process(&mut self, (transport, port): (Transport, u16)) -> Option<PortRecord> {
        let record = match transport {
            Transport::Tcp => self.prober.probe_tcp(self.addr, port).await,
            Transport::Udp => self.prober.probe_udp(self.addr, port).await,
        };
        Some(record)
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
