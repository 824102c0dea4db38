//! Terminal rendering for graph runs.
//!
//! Every status line is a colored marker followed by a message. Node outcomes
//! that need attention (failures, skips, warnings) go to stderr; the rest go to
//! stdout so `-o json` output stays parseable.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Marker used for output files listed under a node.
pub const ARROW: &str = "→";

/// Kind of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Evaluated,
  Failed,
  Skipped,
  Warning,
  Info,
}

impl Status {
  pub fn marker(self) -> &'static str {
    match self {
      Status::Evaluated => "✓",
      Status::Failed => "✗",
      Status::Skipped => "-",
      Status::Warning => "⚠",
      Status::Info => "•",
    }
  }

  fn on_stderr(self) -> bool {
    matches!(self, Status::Failed | Status::Skipped | Status::Warning)
  }

  fn paint(self, text: &str, stream: Stream) -> String {
    match self {
      Status::Evaluated => text.if_supports_color(stream, |s| s.green()).to_string(),
      Status::Failed => text.if_supports_color(stream, |s| s.red()).to_string(),
      Status::Skipped => text.if_supports_color(stream, |s| s.dimmed()).to_string(),
      Status::Warning => text.if_supports_color(stream, |s| s.yellow()).to_string(),
      Status::Info => text.if_supports_color(stream, |s| s.blue()).to_string(),
    }
  }
}

pub fn print_status(status: Status, message: &str) {
  if status.on_stderr() {
    eprintln!(
      "{} {}",
      status.paint(status.marker(), Stream::Stderr),
      status.paint(message, Stream::Stderr)
    );
  } else {
    println!("{} {}", status.paint(status.marker(), Stream::Stdout), message);
  }
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// First twelve characters of a library handle.
pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    format!("{}m {}s", secs / 60, secs % 60)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}
