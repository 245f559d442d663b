//! ARP requests and replies over Ethernet.

use std::net::Ipv4Addr;

use anyhow::Context;
use pnet::packet::{MutablePacket, Packet};
use pnet::packet::arp::{ArpHardwareTypes, ArpOperation, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::util::MacAddr;

pub const ETH_HDR_LEN: usize = 14;
pub const ARP_LEN: usize = 28;
/// Shortest legal Ethernet frame, without the checksum the NIC appends.
pub const MIN_ETH_FRAME_NO_FCS: usize = 60;

/// One side of an ARP exchange.
struct Endpoint {
    mac: MacAddr,
    addr: Ipv4Addr,
}

/// Builds a broadcast "who-has `dst_addr`" frame.
pub fn create_request(
    src_mac: MacAddr,
    src_addr: Ipv4Addr,
    dst_addr: Ipv4Addr,
) -> anyhow::Result<Vec<u8>> {
    build_frame(
        ArpOperations::Request,
        MacAddr::broadcast(),
        Endpoint { mac: src_mac, addr: src_addr },
        Endpoint { mac: MacAddr::zero(), addr: dst_addr },
    )
}

/// Builds the "`sender_addr` is at `sender_mac`" answer to a request.
pub fn create_reply(
    sender_mac: MacAddr,
    sender_addr: Ipv4Addr,
    target_mac: MacAddr,
    target_addr: Ipv4Addr,
) -> anyhow::Result<Vec<u8>> {
    build_frame(
        ArpOperations::Reply,
        target_mac,
        Endpoint { mac: sender_mac, addr: sender_addr },
        Endpoint { mac: target_mac, addr: target_addr },
    )
}

fn build_frame(
    operation: ArpOperation,
    eth_dst: MacAddr,
    sender: Endpoint,
    target: Endpoint,
) -> anyhow::Result<Vec<u8>> {
    let mut frame = vec![0u8; MIN_ETH_FRAME_NO_FCS];

    let mut eth = MutableEthernetPacket::new(&mut frame[..ETH_HDR_LEN + ARP_LEN])
        .context("failed to create mutable Ethernet packet")?;
    eth.set_source(sender.mac);
    eth.set_destination(eth_dst);
    eth.set_ethertype(EtherTypes::Arp);

    let mut arp = MutableArpPacket::new(eth.payload_mut())
        .context("failed to create mutable ARP packet")?;
    arp.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp.set_protocol_type(EtherTypes::Ipv4);
    arp.set_hw_addr_len(6);
    arp.set_proto_addr_len(4);
    arp.set_operation(operation);
    arp.set_sender_hw_addr(sender.mac);
    arp.set_sender_proto_addr(sender.addr);
    arp.set_target_hw_addr(target.mac);
    arp.set_target_proto_addr(target.addr);

    Ok(frame)
}

/// Hardware address announced by `expected` in an ARP reply frame.
///
/// Returns `None` for anything else: other ethertypes, requests, replies
/// from other addresses, or frames too short to hold an ARP payload.
pub fn parse_reply(frame: &[u8], expected: Ipv4Addr) -> Option<MacAddr> {
    let eth = EthernetPacket::new(frame)?;
    if eth.get_ethertype() != EtherTypes::Arp {
        return None;
    }

    let arp = ArpPacket::new(eth.payload())?;
    if arp.get_operation() != ArpOperations::Reply || arp.get_sender_proto_addr() != expected {
        return None;
    }

    Some(arp.get_sender_hw_addr())
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

    const HOST_MAC: MacAddr = MacAddr(0x01, 0x02, 0x03, 0x04, 0x05, 0x06);

    #[test]
    fn request_fields() {
        let src_mac = MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff);
        let src_ip = Ipv4Addr::new(10, 0, 0, 42);
        let dst_ip = Ipv4Addr::new(10, 0, 0, 1);

        let frame = create_request(src_mac, src_ip, dst_ip).unwrap();
        assert_eq!(frame.len(), MIN_ETH_FRAME_NO_FCS);

        let eth = EthernetPacket::new(&frame).unwrap();
        assert_eq!(eth.get_destination(), MacAddr::broadcast());
        assert_eq!(eth.get_source(), src_mac);
        assert_eq!(eth.get_ethertype(), EtherTypes::Arp);

        let arp = ArpPacket::new(&frame[ETH_HDR_LEN..ETH_HDR_LEN + ARP_LEN]).unwrap();
        assert_eq!(arp.get_operation(), ArpOperations::Request);
        assert_eq!(arp.get_hardware_type(), ArpHardwareTypes::Ethernet);
        assert_eq!(arp.get_sender_hw_addr(), src_mac);
        assert_eq!(arp.get_sender_proto_addr(), src_ip);
        assert_eq!(arp.get_target_proto_addr(), dst_ip);
        assert_eq!(arp.get_target_hw_addr(), MacAddr::zero());
    }

    #[test]
    fn reply_from_expected_sender_is_accepted() {
        let ip = Ipv4Addr::new(10, 0, 0, 7);
        let frame = create_reply(HOST_MAC, ip, MacAddr::zero(), Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        assert_eq!(parse_reply(&frame, ip), Some(HOST_MAC));
    }

    #[test]
    fn reply_from_other_sender_is_ignored() {
        let frame = create_reply(
            HOST_MAC,
            Ipv4Addr::new(10, 0, 0, 8),
            MacAddr::zero(),
            Ipv4Addr::new(10, 0, 0, 1),
        )
        .unwrap();
        assert_eq!(parse_reply(&frame, Ipv4Addr::new(10, 0, 0, 7)), None);
    }

    #[test]
    fn requests_and_truncated_frames_are_ignored() {
        let src = Ipv4Addr::new(10, 0, 0, 7);
        let request = create_request(HOST_MAC, src, Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        assert_eq!(parse_reply(&request, src), None);

        let frame = create_reply(HOST_MAC, src, MacAddr::zero(), Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        assert_eq!(parse_reply(&frame[..ETH_HDR_LEN + 10], src), None);
    }
}
