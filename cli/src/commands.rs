pub mod discover;
pub mod expand;
pub mod interfaces;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "assetr")]
#[command(about = "Finds live hosts with ARP, ICMP echo and TCP probes.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log detail (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Skip the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover live hosts
    #[command(alias = "d")]
    Discover(DiscoverArgs),
    /// Print every host address of a CIDR prefix
    #[command(alias = "e")]
    Expand { prefix: String },
    /// List interfaces and whether they can be scanned from
    #[command(alias = "i")]
    Interfaces,
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Addresses, ranges, prefixes or `lan`, comma or space separated
    pub targets: Vec<String>,

    /// Read targets from a file, one per line
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Interface to scan from (auto-detected when omitted)
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Probe common TCP and UDP ports on every live host
    #[arg(short, long)]
    pub ports: bool,

    #[arg(long)]
    pub no_arp: bool,

    #[arg(long)]
    pub no_echo: bool,

    #[arg(long)]
    pub no_connect: bool,

    /// Skip reverse DNS lookups during the port scan
    #[arg(long)]
    pub no_dns: bool,

    /// Nameserver for reverse lookups, e.g. 192.168.1.1:53
    #[arg(long)]
    pub dns_server: Option<SocketAddr>,

    /// Look up hardware vendors in the bundled OUI database
    #[arg(long)]
    pub oui: bool,

    /// Fail when the link-layer socket cannot be opened
    #[arg(long)]
    pub strict: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
