//! Tunables for a discovery run.
//!
//! Every knob has a default; callers usually start from
//! [`DiscoveryConfig::default`] and override what they need.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::DiscoveryError;

/// Ports tried, in order, by the connection prober.
pub const CONNECT_PORTS: &[u16] = &[22, 23, 25, 53, 80, 135, 139, 443, 445, 993, 995, 3389, 5900];

/// Ports tried by the echo prober when raw ICMP sockets are unavailable.
pub const ECHO_FALLBACK_PORTS: &[u16] = &[22, 80, 443, 445, 3389];

pub const SERVICE_TCP_PORTS: &[u16] = &[
    20, 21, 22, 23, 25, 53, 80, 110, 111, 135, 139, 143, 443, 445, 993, 995, 1723, 3306, 3389,
    5900, 8080,
];

pub const SERVICE_UDP_PORTS: &[u16] = &[
    53, 67, 68, 69, 123, 135, 137, 138, 161, 162, 445, 514, 631, 1900,
];

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Interface used for ARP and for deciding which targets are local.
    ///
    /// `None` disables link-layer resolution entirely, every target is then
    /// treated as remote.
    pub interface: Option<String>,
    pub methods: Methods,
    pub link_layer: LinkLayerConfig,
    pub echo: EchoConfig,
    pub connect: ConnectConfig,
    pub port_scan: PortScanConfig,
    /// Look up a hostname for every live host.
    pub resolve_hostnames: bool,
    /// Reverse lookups go to this server. `None` reads `/etc/resolv.conf`.
    pub dns_server: Option<SocketAddr>,
    pub dns_timeout: Duration,
    /// Abort the whole discovery when a link-layer socket cannot be opened
    /// instead of continuing with echo and connect probing.
    pub strict_link_layer: bool,
}

/// Switches for the individual discovery methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Methods {
    pub link_layer: bool,
    pub echo: bool,
    pub connect: bool,
}

#[derive(Debug, Clone)]
pub struct LinkLayerConfig {
    pub timeout: Duration,
    pub retries: u32,
    pub workers: usize,
    /// Delay a worker waits before each request.
    pub rate_limit: Duration,
}

#[derive(Debug, Clone)]
pub struct EchoConfig {
    pub timeout: Duration,
    pub workers: usize,
    pub fallback_ports: Vec<u16>,
}

#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub timeout: Duration,
    pub workers: usize,
    pub ports: Vec<u16>,
}

#[derive(Debug, Clone)]
pub struct PortScanConfig {
    pub timeout: Duration,
    pub banner_timeout: Duration,
    /// Ports probed in parallel for a single host.
    pub workers: usize,
    /// Hosts enriched in parallel.
    pub host_workers: usize,
    pub tcp_ports: Vec<u16>,
    pub udp_ports: Vec<u16>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interface: None,
            methods: Methods::default(),
            link_layer: LinkLayerConfig::default(),
            echo: EchoConfig::default(),
            connect: ConnectConfig::default(),
            port_scan: PortScanConfig::default(),
            resolve_hostnames: true,
            dns_server: None,
            dns_timeout: Duration::from_secs(2),
            strict_link_layer: false,
        }
    }
}

impl Default for Methods {
    fn default() -> Self {
        Self {
            link_layer: true,
            echo: true,
            connect: true,
        }
    }
}

impl Default for LinkLayerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            retries: 2,
            workers: 10,
            rate_limit: Duration::from_millis(50),
        }
    }
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            workers: 20,
            fallback_ports: ECHO_FALLBACK_PORTS.to_vec(),
        }
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            workers: 100,
            ports: CONNECT_PORTS.to_vec(),
        }
    }
}

impl Default for PortScanConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            banner_timeout: Duration::from_secs(1),
            workers: 50,
            host_workers: 8,
            tcp_ports: SERVICE_TCP_PORTS.to_vec(),
            udp_ports: SERVICE_UDP_PORTS.to_vec(),
        }
    }
}

impl DiscoveryConfig {
    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interface = Some(name.into());
        self
    }

    /// Rejects configurations that can never produce a scan.
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if let Some(name) = &self.interface {
            if name.trim().is_empty() {
                return Err(DiscoveryError::EmptyInterface);
            }
        }
        Ok(())
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

    #[test]
    fn defaults_match_documented_values() {
        let cfg = DiscoveryConfig::default();
        assert_eq!(cfg.link_layer.timeout, Duration::from_secs(2));
        assert_eq!(cfg.link_layer.retries, 2);
        assert_eq!(cfg.echo.timeout, Duration::from_secs(3));
        assert_eq!(cfg.connect.timeout, Duration::from_secs(2));
        assert_eq!(cfg.connect.workers, 100);
        assert_eq!(cfg.connect.ports.first(), Some(&22));
        assert_eq!(cfg.connect.ports.last(), Some(&5900));
    }

    #[test]
    fn validate_rejects_blank_interface() {
        let cfg = DiscoveryConfig::default().with_interface("  ");
        assert!(matches!(cfg.validate(), Err(DiscoveryError::EmptyInterface)));
    }

    #[test]
    fn validate_accepts_missing_interface() {
        assert!(DiscoveryConfig::default().validate().is_ok());
    }
}
