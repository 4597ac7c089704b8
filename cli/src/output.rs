//! Report output.
//!
//! The console receives the header, the records and a closing line naming the
//! report file. The report file receives the header and the records.

use std::io::{BufRead, Write};
use std::path::Path;

use ep_core::ResolutionResult;

use crate::config::OutputFormat;
use crate::error::Result;

const SEPARATOR_WIDTH: usize = 80;

fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

/// Header identifying who was evaluated, where, and where the report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub user: String,
    pub directory: String,
    pub log_file: String,
}

impl ReportHeader {
    #[must_use]
    pub fn new(user: &str, directory: &Path, log_file: &Path) -> Self {
        Self {
            user: user.to_string(),
            directory: directory.display().to_string(),
            log_file: log_file.display().to_string(),
        }
    }

    /// Write the three header lines.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "User     : {}", self.user)?;
        writeln!(out, "Directory: {}", self.directory)?;
        writeln!(out, "Log File : {}", self.log_file)?;
        Ok(())
    }
}

/// Ask whether an existing report may be overwritten.
///
/// Only an answer of `y` confirms; end of input declines.
pub fn confirm_overwrite<R: BufRead, W: Write>(mut input: R, out: &mut W) -> Result<bool> {
    writeln!(out)?;
    write!(out, "Log file already exists. Overwrite? [y,n] ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    writeln!(out)?;

    Ok(answer.trim() == "y")
}

/// Writes resolution records to the console and the report file.
pub struct Report<C: Write, F: Write> {
    console: C,
    file: F,
    format: OutputFormat,
}

impl<C: Write, F: Write> Report<C, F> {
    #[must_use]
    pub const fn new(console: C, file: F, format: OutputFormat) -> Self {
        Self {
            console,
            file,
            format,
        }
    }

    /// Open the report: separator on the console, header and separator in
    /// the file.
    pub fn begin(&mut self, header: &ReportHeader) -> Result<()> {
        writeln!(self.console, "{}", separator())?;
        header.write_to(&mut self.file)?;
        writeln!(self.file, "{}", separator())?;
        Ok(())
    }

    /// Write one resolution to both outputs.
    pub fn record(&mut self, result: &ResolutionResult) -> Result<()> {
        let block = match self.format {
            // Blank line between blocks.
            OutputFormat::Text => format!("{result}\n"),
            OutputFormat::Json => format!("{}\n", serde_json::to_string(result)?),
        };
        self.console.write_all(block.as_bytes())?;
        self.file.write_all(block.as_bytes())?;
        Ok(())
    }

    /// Close the report and tell the console where it went.
    pub fn finish(mut self, log_file: &Path) -> Result<(C, F)> {
        self.file.flush()?;
        writeln!(self.console, "{}", separator())?;
        writeln!(self.console, "Output written to: {}", log_file.display())?;
        self.console.flush()?;
        Ok((self.console, self.file))
    }
}
