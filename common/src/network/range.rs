//! # Address Ranges
//!
//! Contiguous IPv4 runs derived from CIDR prefixes, plus [`expand`], which
//! turns a prefix string into the list of usable host addresses.

use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;

use crate::error::DiscoveryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Usable hosts of a network.
    ///
    /// Network and broadcast addresses are dropped when the prefix holds more
    /// than two addresses. `/31` and `/32` keep everything the mask yields.
    pub fn from_network(network: Ipv4Network) -> Self {
        let start: u32 = network.network().into();
        let end: u32 = network.broadcast().into();

        if end - start >= 2 {
            Self::new(Ipv4Addr::from(start + 1), Ipv4Addr::from(end - 1))
        } else {
            Self::new(Ipv4Addr::from(start), Ipv4Addr::from(end))
        }
    }

    pub fn len(&self) -> usize {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        if end < start {
            0
        } else {
            (end - start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        (self.start_addr..=self.end_addr).contains(&addr)
    }

    /// Lazily walks the range in ascending order.
    pub fn iter(&self) -> <Self as IntoIterator>::IntoIter {
        (*self).into_iter()
    }
}

impl IntoIterator for Ipv4Range {
    type Item = Ipv4Addr;
    type IntoIter = std::iter::Map<std::ops::RangeInclusive<u32>, fn(u32) -> Ipv4Addr>;

    fn into_iter(self) -> Self::IntoIter {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        (start..=end).map(Ipv4Addr::from as fn(u32) -> Ipv4Addr)
    }
}

/// Parses `a.b.c.d/len` into a network.
///
/// Host bits are allowed and ignored, `10.0.0.7/24` is the same network as
/// `10.0.0.0/24`.
pub fn parse_prefix(prefix: &str) -> Result<Ipv4Network, DiscoveryError> {
    let trimmed = prefix.trim();
    let Some((addr_str, len_str)) = trimmed.split_once('/') else {
        return Err(DiscoveryError::invalid_target(prefix, "missing '/<prefix>'"));
    };

    let addr: Ipv4Addr = addr_str
        .parse()
        .map_err(|e| DiscoveryError::invalid_target(prefix, format!("bad address: {e}")))?;

    let len: u8 = len_str
        .parse()
        .map_err(|e| DiscoveryError::invalid_target(prefix, format!("bad prefix length: {e}")))?;

    if len > 32 {
        return Err(DiscoveryError::invalid_target(prefix, "prefix exceeds 32"));
    }

    let network = Ipv4Network::new(addr, len)
        .map_err(|e| DiscoveryError::invalid_target(prefix, e))?;

    Ipv4Network::new(network.network(), len).map_err(|e| DiscoveryError::invalid_target(prefix, e))
}

pub fn cidr_range(prefix: &str) -> Result<Ipv4Range, DiscoveryError> {
    parse_prefix(prefix).map(Ipv4Range::from_network)
}

/// Expands a CIDR prefix into its usable host addresses, in ascending order.
pub fn expand(prefix: &str) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
    Ok(cidr_range(prefix)?.iter().collect())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
