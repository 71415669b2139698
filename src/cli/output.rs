//! Output formatting for reconstruction results.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::Result;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON (default)
    Pretty,
    /// One JSON document per line
    Json,
}

/// Writes serializable results.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create a new formatter with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Serialize `value` and write it followed by a newline.
    pub fn write<T, W>(&self, value: &T, writer: &mut W) -> Result<()>
    where
        T: Serialize + ?Sized,
        W: Write,
    {
        match self.format {
            OutputFormat::Pretty => serde_json::to_writer_pretty(&mut *writer, value)?,
            OutputFormat::Json => serde_json::to_writer(&mut *writer, value)?,
        }
        writeln!(writer)?;
        Ok(())
    }
}
