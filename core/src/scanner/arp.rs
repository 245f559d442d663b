//! # Link-Layer Resolver
//!
//! Asks "who has this address" on the scanning interface and waits for the
//! matching reply. Only meaningful for targets on the interface's own
//! segment.
//!
//! Every worker owns its own datalink channel. Reads on the channel are
//! blocking, so each attempt runs on the blocking thread pool and the channel
//! travels there and back with it.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use assetr_common::config::LinkLayerConfig;
use assetr_common::error::DiscoveryError;
use assetr_common::network::host::{Evidence, ProbeFinding};
use assetr_common::network::interface::InterfaceContext;
use assetr_common::vendors::{VendorLookup, vendor_or_empty};
use assetr_protocols::arp;
use async_trait::async_trait;
use pnet::datalink::{DataLinkReceiver, DataLinkSender};
use pnet::util::MacAddr;
use tracing::{debug, trace};

use crate::network::channel::{self, ChannelOpener, SystemOpener};
use crate::runner::{Sink, Worker, WorkerPool};

/// Answer to a single-address resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLayerReply {
    pub mac: MacAddr,
    /// Empty when the vendor is unknown.
    pub vendor: String,
}

#[derive(Clone)]
pub struct ArpResolver {
    ctx: InterfaceContext,
    config: LinkLayerConfig,
    vendors: Arc<dyn VendorLookup>,
    opener: Arc<dyn ChannelOpener>,
}

impl ArpResolver {
    /// Resolver for a named interface.
    ///
    /// Fails when the name is empty, unknown, or the interface lacks a
    /// hardware or IPv4 address, and when no link-layer socket can be opened.
    pub fn for_interface(
        name: &str,
        config: LinkLayerConfig,
        vendors: Arc<dyn VendorLookup>,
    ) -> Result<Self, DiscoveryError> {
        let ctx = InterfaceContext::resolve(name)?;
        Self::new(ctx, config, vendors)
    }

    pub fn new(
        ctx: InterfaceContext,
        config: LinkLayerConfig,
        vendors: Arc<dyn VendorLookup>,
    ) -> Result<Self, DiscoveryError> {
        Self::with_opener(ctx, config, vendors, Arc::new(SystemOpener))
    }

    /// Like [`ArpResolver::new`], with a custom way of opening channels.
    pub fn with_opener(
        ctx: InterfaceContext,
        config: LinkLayerConfig,
        vendors: Arc<dyn VendorLookup>,
        opener: Arc<dyn ChannelOpener>,
    ) -> Result<Self, DiscoveryError> {
        // fail early: a socket that cannot be opened now won't open per worker
        channel::open_eth_channel(&ctx.interface, opener.as_ref())?;

        Ok(Self {
            ctx,
            config,
            vendors,
            opener,
        })
    }

    /// Resolves a single address.
    pub async fn resolve(&self, addr: Ipv4Addr) -> Result<LinkLayerReply, DiscoveryError> {
        let found = WorkerPool::new("arp", 1)
            .collect(vec![addr], |_| self.worker())
            .await?;

        match found.into_iter().next() {
            Some(ProbeFinding {
                evidence: Evidence::LinkLayer { mac, vendor },
                ..
            }) => Ok(LinkLayerReply { mac, vendor }),
            _ => Err(DiscoveryError::Unreachable(addr)),
        }
    }

    /// Resolves every address, reporting each answer into `sink`.
    ///
    /// Errors only when a worker's channel cannot be opened, in which case
    /// nothing is probed.
    pub async fn resolve_many(
        &self,
        addrs: Vec<Ipv4Addr>,
        sink: Sink<ProbeFinding>,
    ) -> Result<(), DiscoveryError> {
        WorkerPool::new("arp", self.config.workers)
            .run(addrs, |_| self.worker(), sink)
            .await
    }

    fn worker(&self) -> Result<ArpWorker, DiscoveryError> {
        let (tx, rx) = channel::open_eth_channel(&self.ctx.interface, self.opener.as_ref())?;

        Ok(ArpWorker {
            link: Some(ArpLink {
                tx,
                rx,
                src_mac: self.ctx.mac,
                src_addr: self.ctx.source_ip(),
                timeout: self.config.timeout,
                retries: self.config.retries,
            }),
            rate_limit: self.config.rate_limit,
            vendors: Arc::clone(&self.vendors),
        })
    }
}

struct ArpLink {
    tx: Box<dyn DataLinkSender>,
    rx: Box<dyn DataLinkReceiver>,
    src_mac: MacAddr,
    src_addr: Ipv4Addr,
    timeout: Duration,
    retries: u32,
}

impl ArpLink {
    /// Up to `retries + 1` attempts, each with its own deadline.
    fn resolve(&mut self, target: Ipv4Addr) -> Option<MacAddr> {
        for attempt in 0..=self.retries {
            if let Some(mac) = self.attempt(target) {
                return Some(mac);
            }
            trace!("arp: no answer from {target} (attempt {})", attempt + 1);
        }
        None
    }

    fn attempt(&mut self, target: Ipv4Addr) -> Option<MacAddr> {
        let frame = match arp::create_request(self.src_mac, self.src_addr, target) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("arp: cannot build request for {target}: {e}");
                return None;
            }
        };

        if let Some(Err(e)) = self.tx.send_to(&frame, None) {
            debug!("arp: send to {target} failed: {e}");
            return None;
        }

        let deadline = Instant::now() + self.timeout;
        while Instant::now() < deadline {
            // read errors are the socket's read timeout expiring
            if let Ok(frame) = self.rx.next() {
                if let Some(mac) = arp::parse_reply(frame, target) {
                    return Some(mac);
                }
            }
        }
        None
    }
}

struct ArpWorker {
    link: Option<ArpLink>,
    rate_limit: Duration,
    vendors: Arc<dyn VendorLookup>,
}

#[async_trait]
impl Worker<Ipv4Addr, ProbeFinding> for ArpWorker {
    async fn process(&mut self, addr: Ipv4Addr) -> Option<ProbeFinding> {
        if !self.rate_limit.is_zero() {
            tokio::time::sleep(self.rate_limit).await;
        }

        let mut link = self.link.take()?;
        let joined = tokio::task::spawn_blocking(move || {
            let mac = link.resolve(addr);
            (link, mac)
        })
        .await;

        // the channel is lost with a failed task, so this worker cannot go on
        let (link, mac) = match joined {
            Ok(done) => done,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                debug!("arp: resolution of {addr} cancelled, worker stops: {e}");
                return None;
            }
        };
        self.link = Some(link);

        let mac = mac?;
        let vendor = vendor_or_empty(self.vendors.as_ref(), mac);
        Some(ProbeFinding::link_layer(addr, mac, vendor))
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
