//! # Host Records
//!
//! Per-address discovery results. Probers emit [`ProbeFinding`]s, which are
//! folded into one [`HostRecord`] per address. Folding never clears a field
//! and never overwrites one that is already set.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use pnet::util::MacAddr;

/// Longest banner kept on a [`PortRecord`], in bytes.
pub const MAX_BANNER_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    LinkLayer,
    Echo,
    Connect,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::LinkLayer => "arp",
            Method::Echo => "echo",
            Method::Connect => "connect",
        };
        f.write_str(name)
    }
}

/// What a single method observed about a single address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    LinkLayer { mac: MacAddr, vendor: String },
    Echo { rtt: Duration },
    Connect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFinding {
    pub addr: Ipv4Addr,
    pub evidence: Evidence,
}

impl ProbeFinding {
    pub fn link_layer(addr: Ipv4Addr, mac: MacAddr, vendor: impl Into<String>) -> Self {
        Self {
            addr,
            evidence: Evidence::LinkLayer {
                mac,
                vendor: vendor.into(),
            },
        }
    }

    pub fn echo(addr: Ipv4Addr, rtt: Duration) -> Self {
        Self {
            addr,
            evidence: Evidence::Echo { rtt },
        }
    }

    pub fn connect(addr: Ipv4Addr) -> Self {
        Self {
            addr,
            evidence: Evidence::Connect,
        }
    }

    pub fn method(&self) -> Method {
        match self.evidence {
            Evidence::LinkLayer { .. } => Method::LinkLayer,
            Evidence::Echo { .. } => Method::Echo,
            Evidence::Connect => Method::Connect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transport {
    Tcp,
    Udp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Tcp => f.write_str("tcp"),
            Transport::Udp => f.write_str("udp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortState {
    Open,
    Closed,
    Filtered,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortState::Open => f.write_str("open"),
            PortState::Closed => f.write_str("closed"),
            PortState::Filtered => f.write_str("filtered"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRecord {
    pub addr: Ipv4Addr,
    pub port: u16,
    pub transport: Transport,
    pub state: PortState,
    pub service: String,
    pub banner: Option<String>,
}

impl PortRecord {
    pub fn new(
        addr: Ipv4Addr,
        port: u16,
        transport: Transport,
        state: PortState,
        service: impl Into<String>,
    ) -> Self {
        Self {
            addr,
            port,
            transport,
            state,
            service: service.into(),
            banner: None,
        }
    }

    /// Attaches a banner, dropping it when nothing printable survives.
    pub fn with_banner(mut self, raw: &[u8]) -> Self {
        let banner = sanitize_banner(raw);
        self.banner = (!banner.is_empty()).then_some(banner);
        self
    }

    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }
}

/// Turns raw service output into a single printable line.
///
/// Control characters become spaces, runs of whitespace collapse, and the
/// result is cut to [`MAX_BANNER_LEN`] bytes on a character boundary.
pub fn sanitize_banner(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_control() || c == '\u{FFFD}' { ' ' } else { c })
        .collect();

    let mut line = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.len() > MAX_BANNER_LEN {
        let mut cut = MAX_BANNER_LEN;
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        line.truncate(cut);
    }
    line
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub addr: Ipv4Addr,
    pub link_layer: bool,
    pub echo: bool,
    pub connect: bool,
    pub mac: Option<MacAddr>,
    pub vendor: Option<String>,
    pub hostname: Option<String>,
    pub rtt: Option<Duration>,
    pub ports: Vec<PortRecord>,
}

impl From<Ipv4Addr> for HostRecord {
    fn from(addr: Ipv4Addr) -> Self {
        Self {
            addr,
            link_layer: false,
            echo: false,
            connect: false,
            mac: None,
            vendor: None,
            hostname: None,
            rtt: None,
            ports: Vec::new(),
        }
    }
}

impl HostRecord {
    /// Live means at least one method saw the address.
    pub fn is_live(&self) -> bool {
        self.link_layer || self.echo || self.connect
    }

    pub fn methods(&self) -> Vec<Method> {
        [
            (self.link_layer, Method::LinkLayer),
            (self.echo, Method::Echo),
            (self.connect, Method::Connect),
        ]
        .into_iter()
        .filter_map(|(set, method)| set.then_some(method))
        .collect()
    }

    /// Folds one finding into the record. Applying the same finding twice
    /// leaves the record unchanged.
    pub fn apply(&mut self, finding: &ProbeFinding) {
        debug_assert_eq!(self.addr, finding.addr);

        match &finding.evidence {
            Evidence::LinkLayer { mac, vendor } => {
                self.link_layer = true;
                if self.mac.is_none() && *mac != MacAddr::zero() {
                    self.mac = Some(*mac);
                }
                set_if_empty(&mut self.vendor, vendor);
            }
            Evidence::Echo { rtt } => {
                self.echo = true;
                if self.rtt.is_none() && !rtt.is_zero() {
                    self.rtt = Some(*rtt);
                }
            }
            Evidence::Connect => self.connect = true,
        }
    }

    pub fn set_hostname(&mut self, name: &str) {
        set_if_empty(&mut self.hostname, name);
    }

    pub fn open_ports(&self) -> impl Iterator<Item = &PortRecord> {
        self.ports.iter().filter(|p| p.is_open())
    }
}

fn set_if_empty(slot: &mut Option<String>, value: &str) {
    if slot.is_none() && !value.is_empty() {
        *slot = Some(value.to_string());
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
