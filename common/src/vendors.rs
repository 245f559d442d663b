//! Hardware vendor resolution.

use pnet::util::MacAddr;

/// Maps a hardware address to the name of the organisation it was issued to.
///
/// Implementations must be cheap to call and safe to share between workers.
pub trait VendorLookup: Send + Sync {
    fn vendor(&self, mac: MacAddr) -> Option<String>;
}

/// Never knows a vendor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVendorLookup;

impl VendorLookup for NoVendorLookup {
    fn vendor(&self, _mac: MacAddr) -> Option<String> {
        None
    }
}

impl<F> VendorLookup for F
where
    F: Fn(MacAddr) -> Option<String> + Send + Sync,
{
    fn vendor(&self, mac: MacAddr) -> Option<String> {
        self(mac)
    }
}

/// Vendor string as stored on a finding, empty when unknown.
pub fn vendor_or_empty(lookup: &dyn VendorLookup, mac: MacAddr) -> String {
    lookup.vendor(mac).unwrap_or_default()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
