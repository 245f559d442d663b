//! Wire formats used by the discovery probers.
//!
//! Everything in here is synchronous and side-effect free: builders return
//! byte buffers and parsers take byte slices.

pub mod arp;
pub mod dns;
pub mod icmp;
pub mod payloads;
pub mod services;
