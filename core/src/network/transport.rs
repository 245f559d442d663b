use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use anyhow::Context;
use assetr_protocols::icmp::{self, EchoToken};
use pnet::packet::icmp::IcmpPacket;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::transport::{
    self, TransportChannelType, TransportProtocol, TransportReceiver, TransportSender,
};

const TRANSPORT_BUFFER_SIZE: usize = 4096;
const CHANNEL_TYPE_ICMP: TransportChannelType =
    TransportChannelType::Layer4(TransportProtocol::Ipv4(IpNextHeaderProtocols::Icmp));
const ECHO_PAYLOAD: &[u8] = b"assetr-echo";

pub struct IcmpChannel {
    tx: TransportSender,
    rx: TransportReceiver,
}

impl IcmpChannel {
    pub fn open() -> std::io::Result<Self> {
        let (tx, rx) = transport::transport_channel(TRANSPORT_BUFFER_SIZE, CHANNEL_TYPE_ICMP)?;
        Ok(Self { tx, rx })
    }

    /// Sends one echo request and waits for the matching reply.
    ///
    /// Blocking; returns the round-trip time or `None` once `timeout` passes.
    pub fn echo(
        &mut self,
        target: Ipv4Addr,
        token: EchoToken,
        timeout: Duration,
    ) -> anyhow::Result<Option<Duration>> {
        let bytes = icmp::create_echo_request(token, ECHO_PAYLOAD)?;
        let packet = IcmpPacket::new(&bytes).context("failed to view ICMP echo request")?;

        let started = Instant::now();
        self.tx
            .send_to(packet, IpAddr::V4(target))
            .with_context(|| format!("sending echo request to {target}"))?;

        let deadline = started + timeout;
        let mut iter = transport::icmp_packet_iter(&mut self.rx);

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            match iter.next_with_timeout(deadline - now) {
                Ok(Some((reply, IpAddr::V4(source))))
                    if source == target && icmp::is_echo_reply(&reply, token) =>
                {
                    return Ok(Some(started.elapsed()));
                }
                Ok(Some(_)) => continue,
                Ok(None) => return Ok(None),
                Err(e) => return Err(e).context("reading ICMP socket"),
            }
        }
    }
}

/// Whether this process may open raw ICMP sockets.
pub fn icmp_available() -> bool {
    IcmpChannel::open().is_ok()
}
