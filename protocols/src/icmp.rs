//! ICMP echo request/reply handling for IPv4.

use anyhow::Context;
use pnet::packet::Packet;
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{self, IcmpCode, IcmpPacket, IcmpTypes};

pub const ICMP_ECHO_HDR_LEN: usize = 8;

/// Identifies one echo exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoToken {
    pub identifier: u16,
    pub sequence: u16,
}

pub fn create_echo_request(token: EchoToken, payload: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut buffer = vec![0u8; ICMP_ECHO_HDR_LEN + payload.len()];
    {
        let mut echo = MutableEchoRequestPacket::new(&mut buffer)
            .context("failed to create mutable ICMP echo request")?;
        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(IcmpCode::new(0));
        echo.set_identifier(token.identifier);
        echo.set_sequence_number(token.sequence);
        echo.set_payload(payload);
    }

    let checksum = {
        let view = IcmpPacket::new(&buffer).context("failed to view ICMP packet")?;
        icmp::checksum(&view)
    };
    let mut echo = MutableEchoRequestPacket::new(&mut buffer)
        .context("failed to create mutable ICMP echo request")?;
    echo.set_checksum(checksum);

    Ok(buffer)
}

/// Whether an ICMP message is the echo reply belonging to `token`.
pub fn is_echo_reply(packet: &IcmpPacket, token: EchoToken) -> bool {
    if packet.get_icmp_type() != IcmpTypes::EchoReply {
        return false;
    }

    EchoReplyPacket::new(packet.packet()).is_some_and(|reply| {
        reply.get_identifier() == token.identifier && reply.get_sequence_number() == token.sequence
    })
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
    use pnet::packet::icmp::echo_reply::MutableEchoReplyPacket;
    use pnet::packet::icmp::echo_request::EchoRequestPacket;

    const TOKEN: EchoToken = EchoToken {
        identifier: 0xbeef,
        sequence: 7,
    };

    fn reply(identifier: u16, sequence: u16) -> Vec<u8> {
        let mut buffer = vec![0u8; ICMP_ECHO_HDR_LEN + 4];
        let mut echo = MutableEchoReplyPacket::new(&mut buffer).unwrap();
        echo.set_icmp_type(IcmpTypes::EchoReply);
        echo.set_identifier(identifier);
        echo.set_sequence_number(sequence);
        buffer
    }

    #[test]
    fn request_has_valid_checksum() {
        let bytes = create_echo_request(TOKEN, b"assetr").unwrap();
        let request = EchoRequestPacket::new(&bytes).unwrap();
        assert_eq!(request.get_icmp_type(), IcmpTypes::EchoRequest);
        assert_eq!(request.get_identifier(), TOKEN.identifier);
        assert_eq!(request.get_sequence_number(), TOKEN.sequence);
        assert_eq!(request.payload(), b"assetr");

        let view = IcmpPacket::new(&bytes).unwrap();
        assert_eq!(icmp::checksum(&view), view.get_checksum());
    }

    #[test]
    fn matching_reply_is_recognised() {
        let bytes = reply(TOKEN.identifier, TOKEN.sequence);
        assert!(is_echo_reply(&IcmpPacket::new(&bytes).unwrap(), TOKEN));
    }

    #[test]
    fn foreign_replies_and_requests_are_ignored() {
        let other = reply(TOKEN.identifier, TOKEN.sequence + 1);
        assert!(!is_echo_reply(&IcmpPacket::new(&other).unwrap(), TOKEN));

        let request = create_echo_request(TOKEN, &[]).unwrap();
        assert!(!is_echo_reply(&IcmpPacket::new(&request).unwrap(), TOKEN));
    }
}
