use std::time::Duration;

use assetr_common::network::host::{HostRecord, PortRecord};
use colored::*;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn host_details(host: &HostRecord) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![(
        "IPv4".to_string(),
        host.addr.to_string().color(colors::IPV4_ADDR),
    )];

    if let Some(mac) = host.mac {
        details.push(("MAC".to_string(), mac.to_string().color(colors::MAC_ADDR)));
    }

    if let Some(vendor) = &host.vendor {
        details.push(("Vendor".to_string(), vendor.normal()));
    }

    if let Some(rtt) = host.rtt {
        details.push(("RTT".to_string(), rtt_str(rtt).normal()));
    }

    let methods: Vec<String> = host.methods().iter().map(ToString::to_string).collect();
    details.push(("Seen".to_string(), methods.join(", ").dimmed()));

    details.extend(host.open_ports().map(port_detail));
    details
}

fn port_detail(port: &PortRecord) -> Detail {
    let mut value = format!(
        "{}/{} {}",
        port.port.to_string().color(colors::PORT_OPEN),
        port.transport,
        port.service
    );
    if let Some(banner) = &port.banner {
        value.push_str(&format!(" {}", banner.dimmed()));
    }
    ("Port".to_string(), value.normal())
}

fn rtt_str(rtt: Duration) -> String {
    let micros = rtt.as_micros();
    if micros < 1_000 {
        format!("{micros}µs")
    } else {
        format!("{:.1}ms", rtt.as_secs_f64() * 1_000.0)
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
