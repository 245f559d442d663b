use std::sync::OnceLock;

use assetr_common::vendors::VendorLookup;
use mac_oui::Oui;
use pnet::util::MacAddr;
use tracing::warn;

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

fn oui_db() -> Option<&'static Oui> {
    OUI_DB
        .get_or_init(|| match Oui::default() {
            Ok(db) => Some(db),
            Err(e) => {
                warn!("OUI database unavailable, vendors stay empty: {e:?}");
                None
            }
        })
        .as_ref()
}

/// Vendor names from the bundled IEEE OUI registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct OuiVendorLookup;

impl VendorLookup for OuiVendorLookup {
    fn vendor(&self, mac: MacAddr) -> Option<String> {
        let db = oui_db()?;
        match db.lookup_by_mac(&mac.to_string()) {
            Ok(Some(entry)) => Some(entry.company_name.clone()),
            _ => None,
        }
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
