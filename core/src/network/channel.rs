use std::time::Duration;

use assetr_common::error::DiscoveryError;
use pnet::datalink::{self, Channel, Config, DataLinkReceiver, DataLinkSender, NetworkInterface};

/// How long a blocking read on the link-layer socket may wait before the
/// caller gets a chance to check its own deadline.
pub const READ_TIMEOUT: Duration = Duration::from_millis(50);

pub type EthernetChannel = (Box<dyn DataLinkSender>, Box<dyn DataLinkReceiver>);

/// Opens a channel on a link-layer interface.
///
/// The opener is injectable so tests can hand in pnet's dummy backend.
pub trait ChannelOpener: Send + Sync {
    fn open(&self, interface: &NetworkInterface, config: Config) -> std::io::Result<Channel>;
}

/// Opens real sockets through the platform datalink backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl ChannelOpener for SystemOpener {
    fn open(&self, interface: &NetworkInterface, config: Config) -> std::io::Result<Channel> {
        datalink::channel(interface, config)
    }
}

impl<F> ChannelOpener for F
where
    F: Fn(&NetworkInterface, Config) -> std::io::Result<Channel> + Send + Sync,
{
    fn open(&self, interface: &NetworkInterface, config: Config) -> std::io::Result<Channel> {
        self(interface, config)
    }
}

pub fn open_eth_channel(
    intf: &NetworkInterface,
    opener: &dyn ChannelOpener,
) -> Result<EthernetChannel, DiscoveryError> {
    let ch: Channel = opener
        .open(intf, config())
        .map_err(|source| DiscoveryError::LinkLayerSocket {
            interface: intf.name.clone(),
            source,
        })?;

    match ch {
        Channel::Ethernet(tx, rx) => Ok((tx, rx)),
        _ => Err(DiscoveryError::UnsupportedChannel(intf.name.clone())),
    }
}

fn config() -> Config {
    Config {
        read_timeout: Some(READ_TIMEOUT),
        ..Default::default()
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

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::datalink::dummy;

    #[test]
    fn open_eth_channel_should_succeed_on_ethernet_channel() {
        let dummy_intf: NetworkInterface = dummy::dummy_interface(0);
        let opener = |i: &NetworkInterface, _cfg: Config| -> std::io::Result<Channel> {
            dummy::channel(i, dummy::Config::default())
        };
        assert!(open_eth_channel(&dummy_intf, &opener).is_ok());
    }

    #[test]
    fn open_eth_channel_should_fail_on_io_error() {
        let dummy_intf: NetworkInterface = dummy::dummy_interface(0);
        let opener = |_: &NetworkInterface, _: Config| -> std::io::Result<Channel> {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "Mock I/O Error",
            ))
        };

        match open_eth_channel(&dummy_intf, &opener) {
            Err(DiscoveryError::LinkLayerSocket { interface, source }) => {
                assert_eq!(interface, "eth0");
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
                assert_eq!(source.to_string(), "Mock I/O Error");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected Err, got Ok"),
        }
    }
}
