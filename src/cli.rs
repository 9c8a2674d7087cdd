/// Command line interface
///
/// `sketch-studio` opens the drawing window; `sketch-studio relay` serves the
/// local HTTP relay instead. Flags override the config file and environment.
use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use crate::config::Config;
use crate::transform::WireFormat;

#[derive(Debug, Parser)]
#[command(name = "sketch-studio", version, about = "Sketch pad for an image-generation backend")]
pub struct CliArgs {
    /// Base URL of the generation backend
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Request shape used for the backend
    #[arg(long, value_enum, global = true)]
    pub wire: Option<WireFormat>,

    /// Transform timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the upload / transform relay over HTTP
    Relay {
        /// Listen address
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
}

impl CliArgs {
    /// Apply flag overrides on top of `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(backend) = &self.backend {
            config.backend_url = backend.clone();
        }
        if let Some(wire) = self.wire {
            config.wire = wire;
        }
        if let Some(timeout) = self.timeout.filter(|secs| *secs > 0) {
            config.timeout_secs = timeout;
        }
        if let Some(Command::Relay { addr: Some(addr) }) = &self.command {
            config.relay_addr = *addr;
        }
    }
}
