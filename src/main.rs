use clap::{Parser, Subcommand};
use std::path::PathBuf;

use nextalk::config::ServeConfig;
use nextalk::serve::serve;

#[derive(Parser, Debug)]
#[command(author, version, about = "Meeting session service with cloud recording")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the meeting HTTP API server
    Serve {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,

        /// Port to listen on (overrides config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Serve { config, port } => {
            let mut config = ServeConfig::load(&config)?;
            if let Some(port) = port {
                config.api_port = port;
            }
            serve(config)
        }
    }
}
