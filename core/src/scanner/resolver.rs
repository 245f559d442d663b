//! # Reverse DNS
//!
//! Asks a nameserver for the PTR record of a live host. The server is the one
//! configured explicitly, or the first IPv4 `nameserver` line of
//! `/etc/resolv.conf`. Lookups that fail leave the hostname empty.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, bail};
use assetr_protocols::dns;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, trace};

const DNS_PORT: u16 = 53;
const RESOLV_CONF: &str = "/etc/resolv.conf";

#[derive(Debug, Clone)]
pub struct HostnameResolver {
    server: SocketAddr,
    timeout: Duration,
}

impl HostnameResolver {
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        Self { server, timeout }
    }

    /// Resolver for `server`, or for the system nameserver when `None`.
    /// Returns `None` when no nameserver is known at all.
    pub fn from_config(server: Option<SocketAddr>, timeout: Duration) -> Option<Self> {
        let server = server.or_else(system_nameserver)?;
        debug!("reverse lookups via {server}");
        Some(Self::new(server, timeout))
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Hostname of `addr`, without the trailing dot.
    pub async fn lookup(&self, addr: Ipv4Addr) -> Option<String> {
        match self.query(addr).await {
            Ok(name) => name,
            Err(e) => {
                trace!("reverse lookup of {addr} failed: {e:#}");
                None
            }
        }
    }

    async fn query(&self, addr: Ipv4Addr) -> anyhow::Result<Option<String>> {
        let id: u16 = rand::random();
        let query = dns::create_ptr_packet(addr, id)?;

        let bind: SocketAddr = match self.server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => bail!("IPv6 nameservers are not supported"),
        };
        let socket = UdpSocket::bind(bind).await.context("binding DNS socket")?;
        socket
            .connect(self.server)
            .await
            .with_context(|| format!("connecting to {}", self.server))?;
        socket.send(&query).await.context("sending PTR query")?;

        let mut buf = vec![0u8; 512];
        let n = timeout(self.timeout, socket.recv(&mut buf))
            .await
            .context("nameserver did not answer in time")?
            .context("reading DNS reply")?;

        let name = dns::parse_ptr_reply(&buf[..n], id)?;
        Ok(name
            .map(|n| n.trim_end_matches('.').to_string())
            .filter(|n| !n.is_empty()))
    }
}

/// First IPv4 nameserver configured for this machine.
pub fn system_nameserver() -> Option<SocketAddr> {
    let content = std::fs::read_to_string(RESOLV_CONF).ok()?;
    parse_resolv_conf(&content)
}

fn parse_resolv_conf(content: &str) -> Option<SocketAddr> {
    content.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        if fields.next()? != "nameserver" {
            return None;
        }
        match fields.next()?.parse::<IpAddr>().ok()? {
            IpAddr::V4(ip) => Some(SocketAddr::new(IpAddr::V4(ip), DNS_PORT)),
            IpAddr::V6(_) => None,
        }
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
