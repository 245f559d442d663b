use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use colored::*;
use indicatif::ProgressStyle;
use tracing::{Instrument, info_span, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use assetr_common::config::DiscoveryConfig;
use assetr_common::network::host::HostRecord;
use assetr_common::network::interface;
use assetr_common::network::target::TargetSpec;
use assetr_core::Discovery;
use assetr_core::vendors::OuiVendorLookup;

use crate::commands::DiscoverArgs;
use crate::terminal::{colors, format, print};

pub async fn discover(args: &DiscoverArgs) -> anyhow::Result<()> {
    let spec = target_spec(args)?;
    let cfg = discovery_config(args);

    print::aligned_line("Targets", spec.targets.len().to_string());
    print::aligned_line(
        "Iface",
        cfg.interface.clone().unwrap_or_else(|| "none".to_string()),
    );
    print::aligned_line("Ports", if args.ports { "yes" } else { "no" });

    let span = info_span!("discovery", indicatif.pb_show = true);
    span.pb_set_style(&spinner_style());
    span.pb_set_message("Probing...");

    let progress_span = span.clone();
    let mut discovery = Discovery::new(cfg).with_progress(move |count| {
        progress_span.pb_set_message(&format!(
            "Identified {} hosts so far...",
            count.to_string().green().bold()
        ));
    });
    if args.oui {
        discovery = discovery.with_vendor_lookup(OuiVendorLookup);
    }

    let started: Instant = Instant::now();
    let hosts: Vec<HostRecord> = discovery
        .discover(&spec, args.ports)
        .instrument(span.clone())
        .await?;

    // the spinner closes with its last span handle
    drop(discovery);
    drop(span);

    discovery_ends(&hosts, started.elapsed());
    Ok(())
}

fn target_spec(args: &DiscoverArgs) -> anyhow::Result<TargetSpec> {
    let mut spec = TargetSpec::parse_list(&args.targets.join(","))?;

    if let Some(path) = &args.file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading targets from {}", path.display()))?;
        spec.extend(TargetSpec::parse_file(&content)?);
    }

    if spec.is_empty() {
        bail!("no targets given, pass addresses, prefixes, `lan` or --file");
    }
    Ok(spec)
}

fn discovery_config(args: &DiscoverArgs) -> DiscoveryConfig {
    let mut cfg = DiscoveryConfig::default();

    cfg.interface = match &args.interface {
        Some(name) => Some(name.clone()),
        None => {
            let detected = interface::detect_lan_interface().map(|i| i.name);
            if detected.is_none() {
                warn!("no LAN interface detected, every target is treated as remote");
            }
            detected
        }
    };

    cfg.methods.link_layer = !args.no_arp;
    cfg.methods.echo = !args.no_echo;
    cfg.methods.connect = !args.no_connect;
    cfg.resolve_hostnames = !args.no_dns;
    cfg.dns_server = args.dns_server;
    cfg.strict_link_layer = args.strict;
    cfg
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ])
}

fn discovery_ends(hosts: &[HostRecord], total_time: Duration) {
    if hosts.is_empty() {
        print::header("zero hosts detected");
        print::no_results();
        return;
    }

    print::header("network discovery");
    print_hosts(hosts);
    print_summary(hosts, total_time);
}

fn print_hosts(hosts: &[HostRecord]) {
    for (idx, host) in hosts.iter().enumerate() {
        let name = host.hostname.as_deref().unwrap_or("No hostname");
        print::tree_head(idx, name);
        print::as_tree_one_level(format::host_details(host));
        if idx + 1 != hosts.len() {
            print::blank();
        }
    }
}

fn print_summary(hosts: &[HostRecord], total_time: Duration) {
    let open_ports: usize = hosts.iter().map(|h| h.open_ports().count()).sum();
    let hosts_text = format!("{} active hosts", hosts.len());
    let ports_text = format!("{open_ports} open ports");
    let time_text = format!("{:.2}s", total_time.as_secs_f64());

    let plain = format!("Discovery Complete: {hosts_text}, {ports_text} in {time_text}");
    let output = format!(
        "{} {}, {} in {}",
        "Discovery Complete:".color(colors::TEXT_DEFAULT),
        hosts_text.bold().green(),
        ports_text.bold().green(),
        time_text.bold().yellow()
    );

    print::fat_separator();
    print::centerln(&output, plain.chars().count());
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
