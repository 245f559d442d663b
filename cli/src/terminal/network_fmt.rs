use assetr_common::network::interface::ViabilityError;
use colored::*;
use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::IpNetwork;

use crate::terminal::{colors, print};

pub fn to_key_value_pair_net(ip_net: &[IpNetwork]) -> Vec<(String, ColoredString)> {
    ip_net
        .iter()
        .map(|ip_network| match ip_network {
            IpNetwork::V4(ipv4_network) => {
                let address: ColoredString = ipv4_network.ip().to_string().color(colors::IPV4_ADDR);
                let prefix: ColoredString =
                    ipv4_network.prefix().to_string().color(colors::IPV4_PREFIX);
                let result: ColoredString = format!("{address}/{prefix}").color(colors::SEPARATOR);
                ("IPv4".to_string(), result)
            }
            IpNetwork::V6(ipv6_network) => {
                let value: ColoredString = ipv6_network.to_string().color(colors::IPV6_ADDR);
                ("IPv6".to_string(), value)
            }
        })
        .collect()
}

pub fn verdict_str(verdict: &Result<(), ViabilityError>) -> ColoredString {
    match verdict {
        Ok(()) => "usable".green(),
        Err(reason) => reason.to_string().dimmed(),
    }
}

pub fn print_interface(
    interface: &NetworkInterface,
    idx: usize,
    verdict: &Result<(), ViabilityError>,
    selected: bool,
) {
    let name = if selected {
        format!("{} (default)", interface.name)
    } else {
        interface.name.clone()
    };
    print::tree_head(idx, &name);

    let mut key_value_pair: Vec<(String, ColoredString)> = to_key_value_pair_net(&interface.ips);
    if let Some(mac_addr) = interface.mac {
        key_value_pair.push((
            "MAC".to_string(),
            mac_addr.to_string().color(colors::MAC_ADDR),
        ));
    }
    key_value_pair.push(("Status".to_string(), verdict_str(verdict)));
    print::as_tree_one_level(key_value_pair);
}
