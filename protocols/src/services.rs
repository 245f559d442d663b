//! Well-known service names by port and transport.

use assetr_common::network::host::Transport;

pub const UNKNOWN_SERVICE: &str = "unknown";

const TCP_SERVICES: &[(u16, &str)] = &[
    (20, "FTP-data"),
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (111, "RPC"),
    (135, "RPC"),
    (139, "NetBIOS"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (445, "SMB"),
    (993, "IMAP-SSL"),
    (995, "POP3-SSL"),
    (1723, "PPTP"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5900, "VNC"),
    (8080, "HTTP-Proxy"),
];

const UDP_SERVICES: &[(u16, &str)] = &[
    (53, "DNS"),
    (67, "DHCP-Server"),
    (68, "DHCP-Client"),
    (69, "TFTP"),
    (123, "NTP"),
    (135, "RPC"),
    (137, "NetBIOS-NS"),
    (138, "NetBIOS-DGM"),
    (161, "SNMP"),
    (162, "SNMP-Trap"),
    (445, "SMB"),
    (514, "Syslog"),
    (631, "IPP"),
    (1900, "SSDP"),
];

pub fn service_name(port: u16, transport: Transport) -> &'static str {
    let table = match transport {
        Transport::Tcp => TCP_SERVICES,
        Transport::Udp => UDP_SERVICES,
    };

    table
        .iter()
        .find(|(p, _)| *p == port)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_SERVICE)
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
    use assetr_common::config::{SERVICE_TCP_PORTS, SERVICE_UDP_PORTS};

    #[test]
    fn lookup_depends_on_transport() {
        assert_eq!(service_name(22, Transport::Tcp), "SSH");
        assert_eq!(service_name(22, Transport::Udp), UNKNOWN_SERVICE);
        assert_eq!(service_name(161, Transport::Udp), "SNMP");
        assert_eq!(service_name(9999, Transport::Tcp), UNKNOWN_SERVICE);
    }

    #[test]
    fn every_candidate_port_has_a_name() {
        for port in SERVICE_TCP_PORTS {
            assert_ne!(service_name(*port, Transport::Tcp), UNKNOWN_SERVICE, "tcp/{port}");
        }
        for port in SERVICE_UDP_PORTS {
            assert_ne!(service_name(*port, Transport::Udp), UNKNOWN_SERVICE, "udp/{port}");
        }
    }
}
