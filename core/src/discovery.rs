//! # Discovery Orchestrator
//!
//! Turns a [`TargetSpec`] into sorted [`HostRecord`]s.
//!
//! A run goes through these steps once:
//!
//! 1. Every target is expanded and grouped. Prefixes and ranges form their own
//!    group, loose addresses are split into one local and one remote group,
//!    and `lan` stands for the scanning interface's network.
//! 2. Each group is classified once. Groups entirely inside the interface's
//!    network are [`DiscoveryStrategy::Local`] and also get link-layer
//!    resolution.
//! 3. All applicable methods run concurrently and push their findings into a
//!    single channel, drained by one consumer that owns the merge map.
//! 4. Records nobody saw are dropped and the rest is sorted by address.
//! 5. With a port scan requested, every live host is enriched with open
//!    services and, when `resolve_hostnames` is set, its reverse DNS name.
//!
//! The echo strategy and the link-layer resolver are set up on first use and
//! reused by later runs of the same [`Discovery`].

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use assetr_common::config::DiscoveryConfig;
use assetr_common::error::DiscoveryError;
use assetr_common::network::host::{HostRecord, Method, ProbeFinding};
use assetr_common::network::interface::InterfaceContext;
use assetr_common::network::range::Ipv4Range;
use assetr_common::network::target::{Target, TargetSpec};
use assetr_common::vendors::{NoVendorLookup, VendorLookup};
use async_trait::async_trait;
use pnet::ipnetwork::Ipv4Network;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::merge::{self, ProgressCallback};
use crate::network::channel::{ChannelOpener, SystemOpener};
use crate::runner::{Sink, Worker, WorkerPool};
use crate::scanner::arp::ArpResolver;
use crate::scanner::echo::{EchoProber, EchoStrategy};
use crate::scanner::handshake::ConnectProber;
use crate::scanner::ports::PortProber;
use crate::scanner::resolver::HostnameResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// Inside the scanning interface's network: link-layer, echo and connect.
    Local,
    /// Everything else: echo and connect only.
    Remote,
}

impl fmt::Display for DiscoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryStrategy::Local => f.write_str("local"),
            DiscoveryStrategy::Remote => f.write_str("remote"),
        }
    }
}

/// Addresses probed with the same set of methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroup {
    pub label: String,
    pub addrs: Vec<Ipv4Addr>,
    pub strategy: DiscoveryStrategy,
}

impl TargetGroup {
    fn classify(label: impl Into<String>, addrs: Vec<Ipv4Addr>, local: Option<Ipv4Network>) -> Self {
        let strategy = match local {
            Some(net) if !addrs.is_empty() && addrs.iter().all(|a| net.contains(*a)) => {
                DiscoveryStrategy::Local
            }
            _ => DiscoveryStrategy::Remote,
        };

        Self {
            label: label.into(),
            addrs,
            strategy,
        }
    }
}

/// Expands and groups every target.
///
/// `local` is the scanning interface's network, if there is one.
pub fn plan(
    spec: &TargetSpec,
    local: Option<Ipv4Network>,
) -> Result<Vec<TargetGroup>, DiscoveryError> {
    let mut groups = Vec::new();
    let mut singles = Vec::new();

    for target in &spec.targets {
        match target {
            Target::Lan => {
                let net = local.ok_or(DiscoveryError::NoLocalNetwork)?;
                let addrs = Ipv4Range::from_network(net).iter().collect();
                groups.push(TargetGroup::classify(format!("lan ({net})"), addrs, local));
            }
            Target::Address(addr) => singles.push(*addr),
            Target::Range(_) | Target::Prefix(_) => {
                let addrs = target.addresses().unwrap_or_default();
                groups.push(TargetGroup::classify(target.to_string(), addrs, local));
            }
        }
    }

    let (near, far): (Vec<Ipv4Addr>, Vec<Ipv4Addr>) = singles
        .into_iter()
        .partition(|addr| local.is_some_and(|net| net.contains(*addr)));
    groups.push(TargetGroup::classify("local addresses", near, local));
    groups.push(TargetGroup::classify("remote addresses", far, local));

    groups.retain(|g| !g.addrs.is_empty());
    Ok(groups)
}

pub struct Discovery {
    config: DiscoveryConfig,
    vendors: Arc<dyn VendorLookup>,
    progress: Option<ProgressCallback>,
    echo_strategy: OnceLock<Arc<dyn EchoStrategy>>,
    arp: OnceLock<ArpResolver>,
    interface: Option<InterfaceContext>,
    opener: Arc<dyn ChannelOpener>,
}

impl Discovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            vendors: Arc::new(NoVendorLookup),
            progress: None,
            echo_strategy: OnceLock::new(),
            arp: OnceLock::new(),
            interface: None,
            opener: Arc::new(SystemOpener),
        }
    }

    pub fn with_vendor_lookup(mut self, lookup: impl VendorLookup + 'static) -> Self {
        self.vendors = Arc::new(lookup);
        self
    }

    /// Called with the running number of live hosts as they are found.
    pub fn with_progress(mut self, callback: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Skips privilege detection and echoes with `strategy`.
    pub fn with_echo_strategy(mut self, strategy: Arc<dyn EchoStrategy>) -> Self {
        self.echo_strategy = OnceLock::from(strategy);
        self
    }

    /// Uses an already resolved interface instead of looking up
    /// `config.interface` by name.
    pub fn with_interface_context(mut self, ctx: InterfaceContext) -> Self {
        self.interface = Some(ctx);
        self
    }

    pub fn with_channel_opener(mut self, opener: Arc<dyn ChannelOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Runs one full discovery.
    ///
    /// `Ok` with an empty list means nothing answered. Errors are reserved
    /// for bad targets, bad configuration, panicking workers and, with
    /// `strict_link_layer`, link-layer socket failures.
    pub async fn discover(
        &self,
        spec: &TargetSpec,
        enable_port_scan: bool,
    ) -> Result<Vec<HostRecord>, DiscoveryError> {
        let started = Instant::now();

        debug!("discovery: expanding targets");
        self.config.validate()?;
        let ctx = self.interface_context()?;
        let groups = plan(spec, ctx.as_ref().map(InterfaceContext::network))?;

        let total: usize = groups.iter().map(|g| g.addrs.len()).sum();
        info!("probing {total} address(es) in {} group(s)", groups.len());
        for group in &groups {
            debug!(
                "group {}: {} address(es), {}",
                group.label,
                group.addrs.len(),
                group.strategy
            );
        }

        debug!("discovery: probing and merging findings");
        let (tx, rx) = mpsc::unbounded_channel();
        let mut producers = self.launch(&groups, ctx, tx)?;
        let map = merge::consume(rx, self.progress.as_ref()).await;
        self.join_producers(&mut producers).await?;

        if map.is_empty() {
            debug!("discovery: no method reported a finding");
        }
        let mut hosts = map.into_sorted();
        info!(
            "{} live host(s) after {:.2}s",
            hosts.len(),
            started.elapsed().as_secs_f64()
        );

        if enable_port_scan && !hosts.is_empty() {
            debug!("discovery: enriching {} host(s)", hosts.len());
            hosts = self.enrich(hosts).await?;
        }

        debug!("discovery: done");
        Ok(hosts)
    }

    fn interface_context(&self) -> Result<Option<InterfaceContext>, DiscoveryError> {
        if let Some(ctx) = &self.interface {
            return Ok(Some(ctx.clone()));
        }
        match &self.config.interface {
            Some(name) => InterfaceContext::resolve(name).map(Some),
            None => Ok(None),
        }
    }

    fn link_layer(
        &self,
        ctx: Option<InterfaceContext>,
    ) -> Result<Option<ArpResolver>, DiscoveryError> {
        if let Some(resolver) = self.arp.get() {
            return Ok(Some(resolver.clone()));
        }
        let Some(ctx) = ctx else {
            return Ok(None);
        };

        match ArpResolver::with_opener(
            ctx,
            self.config.link_layer.clone(),
            Arc::clone(&self.vendors),
            Arc::clone(&self.opener),
        ) {
            Ok(resolver) => Ok(Some(self.arp.get_or_init(|| resolver).clone())),
            Err(e) if self.config.strict_link_layer => Err(e),
            Err(e) => {
                warn!("link-layer resolution disabled: {e}");
                Ok(None)
            }
        }
    }

    fn echo_strategy(&self) -> &Arc<dyn EchoStrategy> {
        self.echo_strategy
            .get_or_init(|| EchoProber::select_strategy(&self.config.echo))
    }

    fn echo_prober(&self) -> EchoProber {
        EchoProber::with_strategy(Arc::clone(self.echo_strategy()), self.config.echo.workers)
    }

    fn launch(
        &self,
        groups: &[TargetGroup],
        ctx: Option<InterfaceContext>,
        tx: Sink<ProbeFinding>,
    ) -> Result<JoinSet<(Method, Result<(), DiscoveryError>)>, DiscoveryError> {
        let methods = self.config.methods;
        let needs_link_layer =
            methods.link_layer && groups.iter().any(|g| g.strategy == DiscoveryStrategy::Local);

        let arp = if needs_link_layer {
            self.link_layer(ctx)?
        } else {
            None
        };
        let echo = methods.echo.then(|| self.echo_prober());
        let connect = methods
            .connect
            .then(|| ConnectProber::new(&self.config.connect));

        let mut set = JoinSet::new();
        for group in groups {
            if let (DiscoveryStrategy::Local, Some(arp)) = (group.strategy, &arp) {
                let (arp, addrs, tx) = (arp.clone(), group.addrs.clone(), tx.clone());
                set.spawn(async move { (Method::LinkLayer, arp.resolve_many(addrs, tx).await) });
            }
            if let Some(echo) = &echo {
                let (echo, addrs, tx) = (echo.clone(), group.addrs.clone(), tx.clone());
                set.spawn(async move { (Method::Echo, echo.probe_many(addrs, tx).await) });
            }
            if let Some(connect) = &connect {
                let (connect, addrs, tx) = (connect.clone(), group.addrs.clone(), tx.clone());
                set.spawn(async move { (Method::Connect, connect.probe_many(addrs, tx).await) });
            }
        }

        debug!("{} method batch(es) running", set.len());
        Ok(set)
    }

    async fn join_producers(
        &self,
        set: &mut JoinSet<(Method, Result<(), DiscoveryError>)>,
    ) -> Result<(), DiscoveryError> {
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((Method::LinkLayer, Err(e))) if !self.config.strict_link_layer => {
                    warn!("link-layer batch failed, continuing without it: {e}");
                }
                Ok((method, Err(e))) => {
                    debug!("{method} batch failed: {e}");
                    return Err(e);
                }
                Err(e) => {
                    return Err(DiscoveryError::WorkerPanicked {
                        label: "discovery",
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    async fn enrich(&self, hosts: Vec<HostRecord>) -> Result<Vec<HostRecord>, DiscoveryError> {
        let resolver = if self.config.resolve_hostnames {
            let resolver =
                HostnameResolver::from_config(self.config.dns_server, self.config.dns_timeout);
            if resolver.is_none() {
                warn!("no nameserver configured, hostnames stay empty");
            }
            resolver
        } else {
            None
        };
        let ports = PortProber::new(self.config.port_scan.clone());

        let enricher = Enricher { resolver, ports };
        let mut hosts = WorkerPool::new("enrich", self.config.port_scan.host_workers)
            .collect(hosts, |_| Ok(enricher.clone()))
            .await?;
        merge::sort_by_address(&mut hosts);
        Ok(hosts)
    }
}

#[derive(Clone)]
struct Enricher {
    resolver: Option<HostnameResolver>,
    ports: PortProber,
}

#[async_trait]
impl Worker<HostRecord, HostRecord> for Enricher {
    async fn process(&mut self, mut host: HostRecord) -> Option<HostRecord> {
        if let Some(resolver) = &self.resolver {
            if let Some(name) = resolver.lookup(host.addr).await {
                host.set_hostname(&name);
            }
        }

        match self.ports.open_ports(host.addr).await {
            Ok(open) => host.ports = open,
            Err(e) => warn!("port scan of {} failed: {e}", host.addr),
        }

        Some(host)
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
