//! The probers a discovery is built from.
//!
//! Each prober answers one question about one address and reports positive
//! answers as [`ProbeFinding`](assetr_common::network::host::ProbeFinding)s
//! into a shared sink:
//!
//! * [`arp`] resolves hardware addresses on the local segment.
//! * [`echo`] measures round-trip time with ICMP echo, or with a TCP
//!   handshake when raw sockets are unavailable.
//! * [`handshake`] completes a TCP connection on a list of common ports.
//!
//! [`ports`] and [`resolver`] enrich hosts that are already known to be live.
//!
//! All of them run their batches through the shared
//! [`WorkerPool`](crate::runner::WorkerPool).

pub mod arp;
pub mod echo;
pub mod handshake;
pub mod ports;
pub mod resolver;
