#![cfg(test)]
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assetr_common::config::DiscoveryConfig;
use assetr_common::network::host::{HostRecord, Method, PortState, Transport};
use assetr_common::network::target::TargetSpec;
use assetr_core::Discovery;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, UdpSocket};
use tokio::time::timeout;

/// Binds a loopback listener that greets every client with `banner`.
async fn serve(banner: &'static [u8]) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let _ = stream.write_all(banner).await;
        }
    });
    port
}

/// Connect probing only, so the run needs no raw sockets.
fn connect_only(port: u16) -> DiscoveryConfig {
    let mut cfg = DiscoveryConfig::default();
    cfg.interface = None;
    cfg.methods.link_layer = false;
    cfg.methods.echo = false;
    cfg.resolve_hostnames = false;
    cfg.connect.ports = vec![port];
    cfg.connect.timeout = Duration::from_millis(500);
    cfg.port_scan.tcp_ports = vec![port];
    cfg.port_scan.udp_ports = Vec::new();
    cfg.port_scan.timeout = Duration::from_millis(500);
    cfg.port_scan.banner_timeout = Duration::from_millis(500);
    cfg
}

#[tokio::test]
async fn loopback_listener_is_found_by_connect() {
    let port = serve(b"").await;
    let spec = TargetSpec::parse_list("127.0.0.1").unwrap();

    let hosts: Vec<HostRecord> = Discovery::new(connect_only(port))
        .discover(&spec, false)
        .await
        .expect("discovery failed");

    assert_eq!(hosts.len(), 1, "expected exactly one host: {hosts:?}");
    let host = &hosts[0];
    assert_eq!(host.addr, Ipv4Addr::LOCALHOST);
    assert_eq!(host.methods(), vec![Method::Connect]);
    assert!(host.mac.is_none());
    assert!(host.ports.is_empty());
}

#[tokio::test]
async fn silent_range_yields_only_listening_host() {
    let port = serve(b"").await;
    let spec = TargetSpec::parse_list("127.0.0.1-127.0.0.3").unwrap();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();

    let hosts = Discovery::new(connect_only(port))
        .with_progress(move |n| counter.store(n, Ordering::SeqCst))
        .discover(&spec, false)
        .await
        .unwrap();

    // the listener is bound to 127.0.0.1 only, its neighbours refuse
    let addrs: Vec<Ipv4Addr> = hosts.iter().map(|h| h.addr).collect();
    assert_eq!(addrs, vec![Ipv4Addr::LOCALHOST]);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn port_scan_reports_open_service_with_banner() {
    let port = serve(b"SSH-2.0-Test\r\n").await;
    let spec = TargetSpec::parse_list("127.0.0.1").unwrap();

    let hosts = Discovery::new(connect_only(port))
        .discover(&spec, true)
        .await
        .unwrap();

    assert_eq!(hosts.len(), 1);
    let ports: Vec<_> = hosts[0].open_ports().collect();
    assert_eq!(ports.len(), 1);
    assert_eq!(ports[0].port, port);
    assert_eq!(ports[0].transport, Transport::Tcp);
    assert_eq!(ports[0].state, PortState::Open);
    assert_eq!(ports[0].banner.as_deref(), Some("SSH-2.0-Test"));
}

#[tokio::test]
async fn unreachable_nameserver_leaves_hostname_empty() {
    let port = serve(b"").await;
    let mut cfg = connect_only(port);
    cfg.resolve_hostnames = true;
    // nothing answers on the discard port
    cfg.dns_server = Some(SocketAddr::from((Ipv4Addr::LOCALHOST, 9)));
    cfg.dns_timeout = Duration::from_millis(200);
    let spec = TargetSpec::parse_list("127.0.0.1").unwrap();

    let hosts = Discovery::new(cfg).discover(&spec, true).await.unwrap();

    assert_eq!(hosts.len(), 1);
    assert!(hosts[0].hostname.is_none());
}

#[tokio::test]
async fn hostnames_are_resolved_only_with_port_scan() {
    let port = serve(b"").await;
    // a nameserver that records queries and never answers
    let nameserver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut cfg = connect_only(port);
    cfg.resolve_hostnames = true;
    cfg.dns_server = Some(nameserver.local_addr().unwrap());
    cfg.dns_timeout = Duration::from_millis(200);
    let spec = TargetSpec::parse_list("127.0.0.1").unwrap();
    let discovery = Discovery::new(cfg);
    let mut buf = [0u8; 512];

    let hosts = discovery.discover(&spec, false).await.unwrap();
    assert_eq!(hosts.len(), 1);
    assert!(hosts[0].ports.is_empty());
    let received = timeout(Duration::from_millis(300), nameserver.recv_from(&mut buf)).await;
    assert!(received.is_err(), "no query expected without a port scan");

    let hosts = discovery.discover(&spec, true).await.unwrap();
    assert_eq!(hosts.len(), 1);
    let received = timeout(Duration::from_millis(300), nameserver.recv_from(&mut buf)).await;
    assert!(received.is_ok(), "port scan should send one PTR query");
}

#[tokio::test]
async fn lan_target_without_interface_is_rejected() {
    let spec = TargetSpec::parse_list("lan").unwrap();
    let result = Discovery::new(connect_only(1)).discover(&spec, false).await;
    assert!(result.is_err());
}

#[test]
fn expand_lists_usable_hosts() {
    let addrs = assetr_core::expand("10.1.2.0/30").unwrap();
    assert_eq!(
        addrs,
        vec![Ipv4Addr::new(10, 1, 2, 1), Ipv4Addr::new(10, 1, 2, 2)]
    );
    assert!(assetr_core::expand("10.1.2.0/33").is_err());
}
