//! Reverse (PTR) lookups over plain UDP DNS.

use std::net::Ipv4Addr;

use anyhow::{Context, bail};
use dns_parser::{Packet as DnsMessage, RData};
use pnet::packet::dns::{DnsClass, DnsQuery, DnsTypes, MutableDnsPacket, Opcode, Retcode};

pub const DNS_HDR_LEN: usize = 12;

/// `4.3.2.1.in-addr.arpa` for `1.2.3.4`.
pub fn reverse_ptr_name(addr: Ipv4Addr) -> String {
    let [a, b, c, d] = addr.octets();
    format!("{d}.{c}.{b}.{a}.in-addr.arpa")
}

pub fn create_ptr_packet(addr: Ipv4Addr, id: u16) -> anyhow::Result<Vec<u8>> {
    let query: DnsQuery = create_ptr_query(addr);
    let q_fixed_len: usize = 4;
    let total: usize = DNS_HDR_LEN + query.qname.len() + q_fixed_len;
    let mut buffer: Vec<u8> = vec![0u8; total];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).context("creating dns header")?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_authoriative(0);
        dns.set_is_truncated(0);
        dns.set_is_recursion_desirable(1);
        dns.set_is_recursion_available(0);
        dns.set_zero_reserved(0);
        dns.set_is_non_authenticated_data(0);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
        dns.set_response_count(0);
        dns.set_authority_rr_count(0);
        dns.set_additional_rr_count(0);
    }

    // question section follows the fixed header
    let mut cursor: usize = DNS_HDR_LEN;

    buffer[cursor..cursor + query.qname.len()].copy_from_slice(&query.qname);
    cursor += query.qname.len();

    buffer[cursor..cursor + 2].copy_from_slice(&query.qtype.0.to_be_bytes());
    cursor += 2;

    buffer[cursor..cursor + 2].copy_from_slice(&query.qclass.0.to_be_bytes());

    Ok(buffer)
}

/// Hostname carried by the PTR answer of a reply to query `id`.
///
/// `Ok(None)` means the server answered without a PTR record.
pub fn parse_ptr_reply(payload: &[u8], id: u16) -> anyhow::Result<Option<String>> {
    let message = DnsMessage::parse(payload).context("failed to parse DNS reply")?;
    if message.header.id != id {
        bail!("DNS reply id {} does not match query {id}", message.header.id);
    }

    let hostname = message.answers.iter().find_map(|record| match &record.data {
        RData::PTR(ptr) => {
            let name = ptr.0.to_string();
            let name = name.trim_end_matches('.');
            (!name.is_empty()).then(|| name.to_string())
        }
        _ => None,
    });

    Ok(hostname)
}

/// Turns a PTR query into a reply carrying a single answer for `hostname`.
///
/// The answer name points back at the question, the way resolvers compress it.
pub fn answer_ptr(query: &[u8], hostname: &str) -> anyhow::Result<Vec<u8>> {
    if query.len() <= DNS_HDR_LEN {
        bail!("DNS query too short ({} bytes)", query.len());
    }

    let mut reply = query.to_vec();
    reply[2] |= 0x80; // QR
    reply[6..8].copy_from_slice(&1u16.to_be_bytes());

    let rdata = encode_dns_name(hostname);
    reply.extend_from_slice(&[0xc0, DNS_HDR_LEN as u8]);
    reply.extend_from_slice(&DnsTypes::PTR.0.to_be_bytes());
    reply.extend_from_slice(&1u16.to_be_bytes());
    reply.extend_from_slice(&300u32.to_be_bytes());
    reply.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    reply.extend_from_slice(&rdata);

    Ok(reply)
}

fn create_ptr_query(addr: Ipv4Addr) -> DnsQuery {
    DnsQuery {
        qname: encode_dns_name(&reverse_ptr_name(addr)),
        qtype: DnsTypes::PTR,
        qclass: DnsClass(1),
        payload: Vec::new(),
    }
}

fn encode_dns_name(name: &str) -> Vec<u8> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
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
    use dns_parser::QueryType;

    #[test]
    fn reverse_name_is_octet_reversed() {
        assert_eq!(
            reverse_ptr_name(Ipv4Addr::new(192, 168, 1, 20)),
            "20.1.168.192.in-addr.arpa"
        );
    }

    #[test]
    fn query_carries_single_ptr_question() {
        let bytes = create_ptr_packet(Ipv4Addr::new(10, 0, 0, 1), 0x1234).unwrap();
        let message = DnsMessage::parse(&bytes).unwrap();
        assert_eq!(message.header.id, 0x1234);
        assert!(message.header.query);
        assert_eq!(message.questions.len(), 1);
        assert_eq!(message.questions[0].qtype, QueryType::PTR);
        assert_eq!(message.questions[0].qname.to_string(), "1.0.0.10.in-addr.arpa");
    }

    #[test]
    fn ptr_answer_is_extracted() {
        let query = create_ptr_packet(Ipv4Addr::new(10, 0, 0, 1), 7).unwrap();
        let reply = answer_ptr(&query, "router.lan").unwrap();
        assert_eq!(
            parse_ptr_reply(&reply, 7).unwrap().as_deref(),
            Some("router.lan")
        );
    }

    #[test]
    fn empty_answer_section_yields_none() {
        let query = create_ptr_packet(Ipv4Addr::new(10, 0, 0, 1), 9).unwrap();
        let mut reply = query.clone();
        reply[2] |= 0x80;
        assert_eq!(parse_ptr_reply(&reply, 9).unwrap(), None);
    }

    #[test]
    fn answering_a_truncated_query_fails() {
        assert!(answer_ptr(&[0u8; DNS_HDR_LEN], "x.lan").is_err());
    }

    #[test]
    fn mismatched_id_and_garbage_are_errors() {
        let query = create_ptr_packet(Ipv4Addr::new(10, 0, 0, 1), 1).unwrap();
        let reply = answer_ptr(&query, "host.lan").unwrap();
        assert!(parse_ptr_reply(&reply, 2).is_err());
        assert!(parse_ptr_reply(&[0u8; 3], 1).is_err());
    }
}
