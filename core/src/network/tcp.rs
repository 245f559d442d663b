use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// How a single timed connection attempt ended.
#[derive(Debug)]
pub enum ConnectOutcome {
    Open { stream: TcpStream, rtt: Duration },
    Refused,
    TimedOut,
    Failed(std::io::Error),
}

impl ConnectOutcome {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectOutcome::Open { .. })
    }
}

pub async fn connect(addr: SocketAddr, probe_timeout: Duration) -> ConnectOutcome {
    let started = Instant::now();
    match timeout(probe_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => ConnectOutcome::Open {
            stream,
            rtt: started.elapsed(),
        },
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => ConnectOutcome::Refused,
        Ok(Err(e)) => ConnectOutcome::Failed(e),
        Err(_elapsed) => ConnectOutcome::TimedOut,
    }
}

/// Reads whatever the peer volunteers within `wait`, up to `limit` bytes.
pub async fn read_banner(stream: &mut TcpStream, wait: Duration, limit: usize) -> Vec<u8> {
    let mut buf = vec![0u8; limit];
    match timeout(wait, stream.read(&mut buf)).await {
        Ok(Ok(n)) => {
            buf.truncate(n);
            buf
        }
        _ => Vec::new(),
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
