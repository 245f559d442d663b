use std::net::Ipv4Addr;

use anyhow::Context;

/// Prints one address per line so the output can be piped.
pub fn expand(prefix: &str) -> anyhow::Result<()> {
    let addrs: Vec<Ipv4Addr> =
        assetr_core::expand(prefix).with_context(|| format!("cannot expand {prefix}"))?;

    for addr in addrs {
        println!("{addr}");
    }
    Ok(())
}
