//! # Scanning Interfaces
//!
//! Looks up the interface a discovery runs on and picks one automatically
//! when the user did not name it.

use std::net::Ipv4Addr;

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use pnet::util::MacAddr;

use thiserror::Error;

use crate::error::DiscoveryError;

use platform::{is_physical, is_wireless};

/// Why an interface cannot carry a link-layer sweep of its network.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    #[error("down")]
    IsDown,
    #[error("virtual or loopback")]
    NotPhysical,
    #[error("no hardware address")]
    NoMacAddress,
    /// ARP requests are broadcast.
    #[error("no broadcast")]
    NotBroadcast,
    #[error("point-to-point")]
    IsPointToPoint,
    #[error("no private IPv4 address")]
    NoValidLanIp,
}

/// The facts about an interface every prober needs.
#[derive(Debug, Clone)]
pub struct InterfaceContext {
    pub interface: NetworkInterface,
    pub mac: MacAddr,
    pub ipv4: Ipv4Network,
}

impl InterfaceContext {
    /// Resolves a named interface, failing when it lacks a hardware or an
    /// IPv4 address.
    pub fn resolve(name: &str) -> Result<Self, DiscoveryError> {
        let interface = find_by_name(name)?;
        Self::try_from(interface)
    }

    pub fn name(&self) -> &str {
        &self.interface.name
    }

    pub fn source_ip(&self) -> Ipv4Addr {
        self.ipv4.ip()
    }

    /// Network part of the interface address, e.g. `192.168.1.0/24`.
    pub fn network(&self) -> Ipv4Network {
        // prefix already validated by the interface itself
        Ipv4Network::new(self.ipv4.network(), self.ipv4.prefix()).unwrap_or(self.ipv4)
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.ipv4.contains(addr)
    }
}

impl TryFrom<NetworkInterface> for InterfaceContext {
    type Error = DiscoveryError;

    fn try_from(interface: NetworkInterface) -> Result<Self, Self::Error> {
        let mac = interface
            .mac
            .filter(|mac| *mac != MacAddr::zero())
            .ok_or_else(|| DiscoveryError::NoMacAddress(interface.name.clone()))?;

        let ipv4 = ipv4_network(&interface)
            .ok_or_else(|| DiscoveryError::NoIpv4Address(interface.name.clone()))?;

        Ok(Self {
            interface,
            mac,
            ipv4,
        })
    }
}

pub fn find_by_name(name: &str) -> Result<NetworkInterface, DiscoveryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DiscoveryError::EmptyInterface);
    }

    datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| DiscoveryError::InterfaceNotFound(name.to_string()))
}

/// First non-loopback IPv4 network configured on the interface.
pub fn ipv4_network(interface: &NetworkInterface) -> Option<Ipv4Network> {
    interface.ips.iter().find_map(|net| match net {
        IpNetwork::V4(v4) if !v4.ip().is_loopback() => Some(*v4),
        _ => None,
    })
}

/// Picks the interface to scan from when none was named: the first wired
/// candidate, otherwise the first candidate at all.
pub fn detect_lan_interface() -> Option<NetworkInterface> {
    prefer_wired(viable_interfaces(), |iface| {
        is_physical(iface) && !is_wireless(iface)
    })
}

/// Every interface that could carry a link-layer sweep.
pub fn viable_interfaces() -> Vec<NetworkInterface> {
    survey_interfaces()
        .into_iter()
        .filter_map(|(iface, verdict)| verdict.is_ok().then_some(iface))
        .collect()
}

/// Every interface with the reason it would be skipped, if any.
pub fn survey_interfaces() -> Vec<(NetworkInterface, Result<(), ViabilityError>)> {
    datalink::interfaces()
        .into_iter()
        .map(|iface| {
            let verdict = check_lan_viability(&iface, is_physical);
            (iface, verdict)
        })
        .collect()
}

/// Runs the checks in order and reports the first one that fails.
fn check_lan_viability(
    iface: &NetworkInterface,
    physical: impl Fn(&NetworkInterface) -> bool,
) -> Result<(), ViabilityError> {
    let has_private_v4 = || {
        iface
            .ips
            .iter()
            .any(|net| matches!(net, IpNetwork::V4(v4) if v4.ip().is_private()))
    };

    let checks: [(bool, ViabilityError); 6] = [
        (iface.is_up(), ViabilityError::IsDown),
        (!iface.is_loopback() && physical(iface), ViabilityError::NotPhysical),
        (iface.mac.is_some(), ViabilityError::NoMacAddress),
        (iface.is_broadcast(), ViabilityError::NotBroadcast),
        (!iface.is_point_to_point(), ViabilityError::IsPointToPoint),
        (has_private_v4(), ViabilityError::NoValidLanIp),
    ];

    match checks.into_iter().find(|(passed, _)| !passed) {
        Some((_, reason)) => Err(reason),
        None => Ok(()),
    }
}

fn prefer_wired(
    candidates: Vec<NetworkInterface>,
    wired: impl Fn(&NetworkInterface) -> bool,
) -> Option<NetworkInterface> {
    let idx = candidates.iter().position(&wired).unwrap_or(0);
    candidates.into_iter().nth(idx)
}

#[cfg(target_os = "linux")]
mod platform {
    use std::path::Path;

    use pnet::datalink::NetworkInterface;

    fn sysfs_has(iface: &NetworkInterface, entry: &str) -> bool {
        Path::new("/sys/class/net").join(&iface.name).join(entry).exists()
    }

    pub fn is_physical(iface: &NetworkInterface) -> bool {
        sysfs_has(iface, "device")
    }

    pub fn is_wireless(iface: &NetworkInterface) -> bool {
        sysfs_has(iface, "wireless")
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use std::collections::HashMap;
    use std::process::Command;
    use std::sync::OnceLock;

    use pnet::datalink::NetworkInterface;

    /// Device name to "is Wi-Fi", as listed by `networksetup`.
    fn hardware_ports() -> &'static HashMap<String, bool> {
        static PORTS: OnceLock<HashMap<String, bool>> = OnceLock::new();

        PORTS.get_or_init(|| {
            let Ok(output) = Command::new("networksetup")
                .arg("-listallhardwareports")
                .output()
            else {
                return HashMap::new();
            };

            let mut ports = HashMap::new();
            let mut wifi = false;
            for line in String::from_utf8_lossy(&output.stdout).lines() {
                if let Some(kind) = line.strip_prefix("Hardware Port: ") {
                    wifi = kind.contains("Wi-Fi") || kind.contains("AirPort");
                } else if let Some(device) = line.strip_prefix("Device: ") {
                    ports.insert(device.trim().to_string(), wifi);
                }
            }
            ports
        })
    }

    pub fn is_physical(iface: &NetworkInterface) -> bool {
        hardware_ports().contains_key(&iface.name)
    }

    pub fn is_wireless(iface: &NetworkInterface) -> bool {
        hardware_ports().get(&iface.name).copied().unwrap_or(false)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod platform {
    use pnet::datalink::NetworkInterface;

    pub fn is_physical(iface: &NetworkInterface) -> bool {
        !iface.is_loopback()
    }

    pub fn is_wireless(_iface: &NetworkInterface) -> bool {
        false
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

    const UP: u32 = 1;
    const BROADCAST: u32 = 1 << 1;
    const LOOPBACK: u32 = 1 << 3;
    const P2P: u32 = 1 << 4;

    fn iface(name: &str, mac: Option<MacAddr>, ips: Vec<IpNetwork>, flags: u32) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: String::new(),
            index: 0,
            mac,
            ips,
            flags,
        }
    }

    fn nic_mac() -> Option<MacAddr> {
        Some(MacAddr(0x1, 0x2, 0x3, 0x4, 0x5, 0x6))
    }

    fn lan_ips() -> Vec<IpNetwork> {
        vec![IpNetwork::V4("192.168.1.100/24".parse().unwrap())]
    }

    fn physical(_: &NetworkInterface) -> bool {
        true
    }

    #[test]
    fn viable_interface_passes() {
        let interface = iface("eth0", nic_mac(), lan_ips(), UP | BROADCAST);
        assert_eq!(check_lan_viability(&interface, physical), Ok(()));
    }

    #[test]
    fn ipv6_only_interface_is_rejected() {
        let ips = vec![IpNetwork::V6("fe80::1234:5678:abcd:ef01".parse().unwrap())];
        let interface = iface("eth0", nic_mac(), ips, UP | BROADCAST);
        assert_eq!(
            check_lan_viability(&interface, physical),
            Err(ViabilityError::NoValidLanIp)
        );
    }

    #[test]
    fn viability_failures() {
        let cases = [
            (
                iface("wlan0", nic_mac(), lan_ips(), BROADCAST),
                ViabilityError::IsDown,
            ),
            (
                iface("lo", nic_mac(), lan_ips(), LOOPBACK | UP | BROADCAST),
                ViabilityError::NotPhysical,
            ),
            (
                iface("eth0", None, lan_ips(), UP | BROADCAST),
                ViabilityError::NoMacAddress,
            ),
            (
                iface("eth0", nic_mac(), lan_ips(), UP),
                ViabilityError::NotBroadcast,
            ),
            (
                iface("tun0", nic_mac(), lan_ips(), BROADCAST | P2P | UP),
                ViabilityError::IsPointToPoint,
            ),
            (
                iface("eth8", nic_mac(), vec![], UP | BROADCAST),
                ViabilityError::NoValidLanIp,
            ),
        ];

        for (interface, expected) in cases {
            assert_eq!(
                check_lan_viability(&interface, physical),
                Err(expected),
                "{}",
                interface.name
            );
        }
    }

    #[test]
    fn non_physical_interface_is_rejected() {
        let interface = iface("veth1", nic_mac(), lan_ips(), UP | BROADCAST);
        assert_eq!(
            check_lan_viability(&interface, |_| false),
            Err(ViabilityError::NotPhysical)
        );
    }

    #[test]
    fn wired_interface_is_preferred() {
        let wired = iface("eth0", nic_mac(), lan_ips(), UP);
        let wireless = iface("wlan0", nic_mac(), lan_ips(), UP);
        let is_wired = |i: &NetworkInterface| i.name == "eth0";

        let picked = prefer_wired(vec![wireless.clone(), wired], is_wired);
        assert_eq!(picked.map(|i| i.name), Some("eth0".to_string()));

        let picked = prefer_wired(vec![wireless], is_wired);
        assert_eq!(picked.map(|i| i.name), Some("wlan0".to_string()));

        assert!(prefer_wired(vec![], is_wired).is_none());
    }

    #[test]
    fn context_requires_mac_and_ipv4() {
        let no_mac = iface("eth0", None, lan_ips(), UP);
        assert!(matches!(
            InterfaceContext::try_from(no_mac),
            Err(DiscoveryError::NoMacAddress(_))
        ));

        let no_v4 = iface("eth0", nic_mac(), vec![], UP);
        assert!(matches!(
            InterfaceContext::try_from(no_v4),
            Err(DiscoveryError::NoIpv4Address(_))
        ));
    }

    #[test]
    fn context_reports_network_and_membership() {
        let eth0 = iface("eth0", nic_mac(), lan_ips(), UP);
        let ctx = InterfaceContext::try_from(eth0).unwrap();
        assert_eq!(ctx.source_ip(), Ipv4Addr::new(192, 168, 1, 100));
        assert_eq!(ctx.network(), "192.168.1.0/24".parse::<Ipv4Network>().unwrap());
        assert!(ctx.contains(Ipv4Addr::new(192, 168, 1, 7)));
        assert!(!ctx.contains(Ipv4Addr::new(192, 168, 2, 7)));
    }

    #[test]
    fn empty_interface_name_is_rejected() {
        assert!(matches!(find_by_name("  "), Err(DiscoveryError::EmptyInterface)));
        assert!(matches!(
            find_by_name("definitely-not-an-interface0"),
            Err(DiscoveryError::InterfaceNotFound(_))
        ));
    }
}
