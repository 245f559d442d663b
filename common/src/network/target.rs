//! # Scan Target Model
//!
//! Defines the possible inputs for a discovery.
//!
//! A target is one of:
//! * A single IPv4 address (`192.168.1.5`).
//! * An IPv4 range (`192.168.1.1-100` or `10.0.0.1-10.0.1.20`).
//! * A CIDR prefix (`192.168.1.0/24`).
//! * The `lan` keyword, the network of the scanning interface.
//!
//! A [`TargetSpec`] is an ordered list of targets, parsed either from a
//! comma-separated string or from file content with one target per line.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use pnet::ipnetwork::Ipv4Network;

use crate::error::DiscoveryError;
use crate::network::range::{self, Ipv4Range};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// The network the scanning interface sits on.
    Lan,
    Address(Ipv4Addr),
    Range(Ipv4Range),
    Prefix(Ipv4Network),
}

impl FromStr for Target {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DiscoveryError::invalid_target(s, "empty target"));
        }

        if s.eq_ignore_ascii_case("lan") {
            return Ok(Target::Lan);
        }

        if s.contains('/') {
            return range::parse_prefix(s).map(Target::Prefix);
        }

        if let Some(target) = parse_ip_range(s)? {
            return Ok(target);
        }

        parse_host(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Lan => f.write_str("lan"),
            Target::Address(addr) => write!(f, "{addr}"),
            Target::Range(r) => write!(f, "{}-{}", r.start_addr, r.end_addr),
            Target::Prefix(net) => write!(f, "{net}"),
        }
    }
}

impl Target {
    /// Addresses this target stands for, or `None` for [`Target::Lan`],
    /// which needs an interface to resolve.
    pub fn addresses(&self) -> Option<Vec<Ipv4Addr>> {
        match self {
            Target::Lan => None,
            Target::Address(addr) => Some(vec![*addr]),
            Target::Range(r) => Some(r.iter().collect()),
            Target::Prefix(net) => Some(Ipv4Range::from_network(*net).iter().collect()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetSpec {
    pub targets: Vec<Target>,
}

impl TargetSpec {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    /// Parses a comma-separated list such as `"10.0.0.5, 10.0.1.0/24, lan"`.
    pub fn parse_list(s: &str) -> Result<Self, DiscoveryError> {
        let targets = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Target::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { targets })
    }

    /// Parses target-file content: one target per line, blank lines and
    /// `#` comments ignored. A line may itself hold a comma-separated list.
    pub fn parse_file(content: &str) -> Result<Self, DiscoveryError> {
        let mut targets = Vec::new();
        for line in content.lines() {
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            };
            if line.trim().is_empty() {
                continue;
            }
            targets.extend(Self::parse_list(line)?.targets);
        }
        Ok(Self { targets })
    }

    pub fn extend(&mut self, other: TargetSpec) {
        self.targets.extend(other.targets);
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn has_lan(&self) -> bool {
        self.targets.iter().any(|t| matches!(t, Target::Lan))
    }
}

impl FromStr for TargetSpec {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_list(s)
    }
}

fn parse_host(s: &str) -> Result<Target, DiscoveryError> {
    match s.parse::<IpAddr>() {
        Ok(IpAddr::V4(addr)) => Ok(Target::Address(addr)),
        Ok(IpAddr::V6(_)) => Err(DiscoveryError::invalid_target(s, "IPv6 is not supported")),
        Err(e) => Err(DiscoveryError::invalid_target(s, e)),
    }
}

/// Parses a range string like "1.1.1.1-2.2.2.2" or "1.1.1.1-50".
fn parse_ip_range(s: &str) -> Result<Option<Target>, DiscoveryError> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };

    let start_addr = start_str
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|e| DiscoveryError::invalid_target(s, format!("bad range start: {e}")))?;

    let end_addr = parse_range_end_addr(end_str.trim(), &start_addr)
        .map_err(|reason| DiscoveryError::invalid_target(s, reason))?;

    if end_addr < start_addr {
        return Err(DiscoveryError::invalid_target(s, "range end precedes start"));
    }

    Ok(Some(Target::Range(Ipv4Range::new(start_addr, end_addr))))
}

/// Helper to parse the end address of a range.
///
/// Handles abbreviated forms like "192.168.1.1-50" (implies 192.168.1.50)
/// and full forms like "192.168.1.1-192.168.1.255".
fn parse_range_end_addr(end_str: &str, start_addr: &Ipv4Addr) -> Result<Ipv4Addr, String> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    if end_str.is_empty() {
        return Err("range end cannot be empty".to_string());
    }

    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet_str| octet_str.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("bad range end '{end_str}': {e}"))?;

    if partial_octets.len() > 4 {
        return Err(format!("range end has too many octets: {end_str}"));
    }

    let mut end_octets = start_addr.octets();
    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
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
    fn range_end_shorthand() {
        let start = Ipv4Addr::new(192, 168, 1, 10);

        assert_eq!(
            parse_range_end_addr("192.168.1.50", &start),
            Ok(Ipv4Addr::new(192, 168, 1, 50))
        );
        assert_eq!(
            parse_range_end_addr("50", &start),
            Ok(Ipv4Addr::new(192, 168, 1, 50))
        );
        assert_eq!(
            parse_range_end_addr("2.66", &start),
            Ok(Ipv4Addr::new(192, 168, 2, 66))
        );

        assert!(parse_range_end_addr("2.256", &start).is_err());
        assert!(parse_range_end_addr("1.2.3.4.5", &start).is_err());
        assert!(parse_range_end_addr("", &start).is_err());
    }

    #[test]
    fn parses_every_target_kind() {
        assert_eq!(Target::from_str("LAN").unwrap(), Target::Lan);
        assert_eq!(
            Target::from_str("1.1.1.1").unwrap(),
            Target::Address(Ipv4Addr::new(1, 1, 1, 1))
        );
        assert!(matches!(
            Target::from_str("192.168.1.1-255"),
            Ok(Target::Range(_))
        ));
        assert!(matches!(
            Target::from_str("10.0.0.0/24"),
            Ok(Target::Prefix(_))
        ));
    }

    #[test]
    fn rejects_bad_targets() {
        for bad in ["not-an-ip", "10.0.0.1/33", "10.0.0.256-1.1.1.1", "::1", "10.0.0.9-3"] {
            assert!(
                matches!(Target::from_str(bad), Err(DiscoveryError::InvalidTarget { .. })),
                "{bad} should fail"
            );
        }
    }

    #[test]
    fn comma_list_skips_empty_parts() {
        let spec = TargetSpec::parse_list("10.0.0.1, ,10.0.1.0/30,lan,").unwrap();
        assert_eq!(spec.targets.len(), 3);
        assert!(spec.has_lan());
    }

    #[test]
    fn file_content_ignores_comments_and_blanks() {
        let content = "# office\n10.0.0.1\n\n  10.0.0.2 # printer\n10.0.2.0/30, 10.0.3.1\n";
        let spec = TargetSpec::parse_file(content).unwrap();
        assert_eq!(
            spec.targets,
            vec![
                Target::Address(Ipv4Addr::new(10, 0, 0, 1)),
                Target::Address(Ipv4Addr::new(10, 0, 0, 2)),
                Target::Prefix("10.0.2.0/30".parse().unwrap()),
                Target::Address(Ipv4Addr::new(10, 0, 3, 1)),
            ]
        );
    }

    #[test]
    fn prefix_addresses_exclude_network_and_broadcast() {
        let target = Target::from_str("10.0.0.0/30").unwrap();
        assert_eq!(
            target.addresses().unwrap(),
            vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)]
        );
        assert_eq!(Target::Lan.addresses(), None);
    }
}
