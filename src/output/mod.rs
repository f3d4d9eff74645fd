//! Output formatting and management
//!
//! [`Reporter`] is the only writer of scan output. The coordinator hands it
//! to a single aggregator task, so each open port's two-line report reaches
//! the sink as one contiguous block.

use crate::network::ProbeOutcome;
use crate::scanner::ScanSummary;
use crate::utils::port_parser::PortSequence;
use crate::utils::target_parser::ResolvedTarget;
use crate::ScanError;
use colored::*;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ScanError::ConfigError(format!("Unknown output format: {}", other))),
        }
    }
}

/// Document written once at the end of a JSON-format scan
#[derive(Debug, Default, Serialize)]
struct JsonReport {
    target: Option<ResolvedTarget>,
    total_ports: usize,
    open_ports: Vec<ProbeOutcome>,
    summary: Option<ScanSummary>,
}

/// Writes scan progress to a sink in the configured format
pub struct Reporter {
    sink: Box<dyn Write + Send>,
    format: OutputFormat,
    color: bool,
    json: JsonReport,
}

impl Reporter {
    pub fn new(sink: Box<dyn Write + Send>, format: OutputFormat, color: bool) -> Self {
        Self {
            sink,
            format,
            color,
            json: JsonReport::default(),
        }
    }

    pub fn stdout(format: OutputFormat, color: bool) -> Self {
        Self::new(Box::new(io::stdout()), format, color)
    }

    fn tag(&self, tag: &str, paint: fn(&str) -> ColoredString) -> String {
        if self.color {
            paint(tag).to_string()
        } else {
            tag.to_string()
        }
    }

    /// Announce the resolved target
    pub fn target(&mut self, target: &ResolvedTarget) -> crate::Result<()> {
        match self.format {
            OutputFormat::Text => {
                let line = format!(
                    "{} Target: {} ({})",
                    self.tag("[~]", |s| s.bright_blue()),
                    target.address,
                    target.display_name
                );
                self.write_block(&[line])
            }
            OutputFormat::Json => {
                self.json.target = Some(target.clone());
                Ok(())
            }
        }
    }

    /// Announce the effective port set
    pub fn ports(&mut self, ports: &PortSequence) -> crate::Result<()> {
        match self.format {
            OutputFormat::Text => {
                let line = format!(
                    "{} Ports: {} ({} total)",
                    self.tag("[~]", |s| s.bright_blue()),
                    ports,
                    ports.len()
                );
                self.write_block(&[line])
            }
            OutputFormat::Json => {
                self.json.total_ports = ports.len();
                Ok(())
            }
        }
    }

    /// Report one probe outcome. Closed ports produce no output.
    pub fn outcome(&mut self, outcome: &ProbeOutcome) -> crate::Result<()> {
        if !outcome.open {
            return Ok(());
        }

        match self.format {
            OutputFormat::Text => {
                let notice = format!(
                    "{} {}/tcp open",
                    self.tag("[+]", |s| s.bright_green()),
                    outcome.port
                );
                let banner = format!("    {}", outcome.banner.as_deref().unwrap_or(""));
                self.write_block(&[notice, banner.trim_end().to_string()])
            }
            OutputFormat::Json => {
                self.json.open_ports.push(outcome.clone());
                Ok(())
            }
        }
    }

    /// Write the closing summary
    pub fn summary(&mut self, summary: &ScanSummary) -> crate::Result<()> {
        match self.format {
            OutputFormat::Text => self.write_block(&[summary.to_string()]),
            OutputFormat::Json => {
                self.json.summary = Some(*summary);
                let document = serde_json::to_string_pretty(&self.json)
                    .map_err(|e| ScanError::OutputError(e.to_string()))?;
                self.write_block(&[document])
            }
        }
    }

    /// Write all lines with a single flush so they land together
    fn write_block(&mut self, lines: &[String]) -> crate::Result<()> {
        let mut block = String::new();
        for line in lines {
            block.push_str(line);
            block.push('\n');
        }
        self.sink
            .write_all(block.as_bytes())
            .and_then(|_| self.sink.flush())
            .map_err(|e| ScanError::OutputError(e.to_string()))
    }
}
