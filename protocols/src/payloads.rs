//! Datagram probes for UDP service detection.
//!
//! Well-known services only answer protocol-correct requests, so DNS, NTP
//! and SNMP get a literal request. Everything else gets an empty datagram.

/// Standard query for `google.com A`, id 1, recursion desired.
pub const DNS_PROBE: &[u8] = &[
    0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x67, 0x6f,
    0x6f, 0x67, 0x6c, 0x65, 0x03, 0x63, 0x6f, 0x6d, 0x00, 0x00, 0x01, 0x00, 0x01,
];

/// NTPv3 client request (LI 0, VN 3, mode 3), all other fields zero.
pub const NTP_PROBE: &[u8] = &[
    0x1b, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00,
];

/// SNMPv1 GetRequest with community `public`.
pub const SNMP_PROBE: &[u8] = &[
    0x30, 0x29, 0x02, 0x01, 0x00, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6c, 0x69, 0x63, 0xa0, 0x1c,
    0x02, 0x01, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x11, 0x30, 0x0f, 0x06, 0x0b,
    0x2b, 0x06, 0x01, 0x04, 0x01, 0x94, 0x78, 0x01, 0x02, 0x07, 0x03, 0x05, 0x00,
];

pub const GENERIC_PROBE: &[u8] = &[];

pub fn udp_probe(port: u16) -> &'static [u8] {
    match port {
        53 => DNS_PROBE,
        123 => NTP_PROBE,
        161 => SNMP_PROBE,
        _ => GENERIC_PROBE,
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
    use dns_parser::Packet;

    #[test]
    fn dns_probe_is_a_valid_query() {
        let packet = Packet::parse(udp_probe(53)).unwrap();
        assert_eq!(packet.questions.len(), 1);
        assert_eq!(packet.questions[0].qname.to_string(), "google.com");
    }

    #[test]
    fn ntp_probe_is_a_client_request() {
        let probe = udp_probe(123);
        assert_eq!(probe.len(), 48);
        assert_eq!(probe[0] & 0x07, 3);
    }

    #[test]
    fn snmp_probe_length_matches_sequence_header() {
        let probe = udp_probe(161);
        assert_eq!(probe[0], 0x30);
        assert_eq!(probe[1] as usize, probe.len() - 2);
    }

    #[test]
    fn other_ports_get_generic_probe() {
        assert!(udp_probe(1900).is_empty());
    }
}
