//! # assetr core
//!
//! Multi-method host discovery: link-layer resolution, echo probing and TCP
//! connection probing, merged into one record per address and optionally
//! enriched with reverse DNS names and open services.

pub mod discovery;
pub mod merge;
pub mod network;
pub mod runner;
pub mod scanner;
pub mod vendors;

pub use assetr_common::network::range::expand;
pub use discovery::{Discovery, DiscoveryStrategy};
