//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::OutputFormat;
use crate::config::{ReconstructConfig, DEFAULT_MAX_HEADERS, DEFAULT_MAX_MIME_DEPTH};

/// Reconstruct sessions, USB frames and protocol chains from captured streams.
#[derive(Parser, Debug)]
#[command(name = "streamsift")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Output format for stdout
    #[arg(long = "format", value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Maximum nested multipart levels followed in mail bodies
    #[arg(long = "max-mime-depth", default_value_t = DEFAULT_MAX_MIME_DEPTH, global = true)]
    pub max_mime_depth: usize,

    /// Maximum headers parsed per HTTP message
    #[arg(long = "max-headers", default_value_t = DEFAULT_MAX_HEADERS, global = true)]
    pub max_headers: usize,

    /// Disable the regex attachment scan over raw SMTP DATA
    #[arg(long = "no-fallback-scan", global = true)]
    pub no_fallback_scan: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pair HTTP requests and responses from a JSON message list
    Http {
        /// JSON array of messages
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Reconstruct an SMTP session from a JSON message list
    Smtp {
        /// JSON array of messages
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Client endpoint label
        #[arg(long, default_value = "")]
        client: String,

        /// Server endpoint label
        #[arg(long, default_value = "")]
        server: String,
    },

    /// Decode a USBPcap frame given as hex
    Usb {
        /// Frame bytes in hex; whitespace and colons are ignored
        #[arg(value_name = "HEX")]
        hex: String,

        /// The capture marks this frame as carrying a setup packet
        #[arg(long)]
        setup: bool,
    },

    /// Build protocol chains for one packet or an array of packets
    Chain {
        /// JSON packet object or array
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Args {
    /// Reconstruction settings selected on the command line.
    pub fn config(&self) -> ReconstructConfig {
        ReconstructConfig::default()
            .with_max_mime_depth(self.max_mime_depth)
            .with_max_headers(self.max_headers)
            .with_fallback_scan(!self.no_fallback_scan)
    }

    /// Tracing filter for the `-v` count.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
