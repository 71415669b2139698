//! streamsift CLI entry point.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use streamsift::cli::{
    load_messages, load_packets, run_reconstructor, Args, ChainReport, Command, OutputFormatter,
};
use streamsift::protocol::decode_usb_frame;
use streamsift::stream::{HttpReconstructor, SmtpReconstructor, StreamEndpoints};

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_filter().into()),
        )
        .init();

    let config = args.config();
    let formatter = OutputFormatter::new(args.format);
    let mut stdout = io::stdout().lock();

    match &args.command {
        Command::Http { file } => {
            let messages = load_messages(file)
                .with_context(|| format!("Failed to load messages: {}", file.display()))?;
            run_reconstructor(&HttpReconstructor::new(config), &messages, &formatter, &mut stdout)?;
        }
        Command::Smtp {
            file,
            client,
            server,
        } => {
            let messages = load_messages(file)
                .with_context(|| format!("Failed to load messages: {}", file.display()))?;
            let reconstructor =
                SmtpReconstructor::new(config, StreamEndpoints::new(client.as_str(), server.as_str()));
            run_reconstructor(&reconstructor, &messages, &formatter, &mut stdout)?;
        }
        Command::Usb { hex, setup } => {
            let cleaned: String = hex
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ':')
                .collect();
            let bytes = hex::decode(&cleaned).context("Frame is not valid hex")?;
            let frame = decode_usb_frame(&bytes, *setup).context("Failed to decode USB frame")?;
            formatter.write(&frame, &mut stdout)?;
        }
        Command::Chain { file } => {
            let packets = load_packets(file)
                .with_context(|| format!("Failed to load packets: {}", file.display()))?;
            let reports: Vec<ChainReport> = packets.iter().map(ChainReport::for_packet).collect();
            formatter.write(&reports, &mut stdout)?;
        }
    }

    Ok(())
}
