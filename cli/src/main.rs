mod commands;
mod terminal;

use commands::{CommandLine, Commands, discover, expand, interfaces};
use terminal::{logging, print};
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose);
    print::banner(commands.no_banner);

    match commands.command {
        Commands::Discover(args) => {
            if !is_root::is_root() {
                warn!("not running as root: link-layer resolution is skipped and echo falls back to TCP");
            }
            print::header("getting ready for discovery");
            discover::discover(&args).await
        }
        Commands::Expand { prefix } => expand::expand(&prefix),
        Commands::Interfaces => {
            print::header("network interfaces");
            interfaces::interfaces();
            Ok(())
        }
    }
}
