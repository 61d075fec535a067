//! Log lines and the sinks that receive them

use std::{
    fmt::Display,
    io::{IsTerminal, Write},
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{event, Level};

use crate::Severity;

/// Where a log line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Written by [log] or [Interceptor::log](crate::Interceptor::log)
    Direct,
    /// Describes the outcome of a failed request
    Request,
}

impl LineKind {
    fn as_str(&self) -> &'static str {
        match self {
            LineKind::Direct => "direct",
            LineKind::Request => "request",
        }
    }
}

/// A single log line. The [Display] implementation renders it without color, as
/// `<timestamp> - <LABEL> - <body>`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    /// When the line was created
    pub timestamp: DateTime<Utc>,
    /// The severity shown in the line's label
    pub severity: Severity,
    /// What produced the line
    pub kind: LineKind,
    /// Everything after the label
    pub body: String,
}

impl LogLine {
    /// Create a new line stamped with the current time
    pub fn new(severity: Severity, kind: LineKind, body: impl Into<String>) -> LogLine {
        LogLine {
            timestamp: Utc::now(),
            severity,
            kind,
            body: body.into(),
        }
    }

    /// The timestamp in ISO-8601 form with millisecond precision, e.g.
    /// `2024-03-01T17:04:05.123Z`
    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Render the line with the label in its terminal color
    pub fn render_colored(&self) -> String {
        format!(
            "{} - {} - {}",
            self.timestamp_string(),
            self.severity.styled_label(),
            self.body
        )
    }
}

impl Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.timestamp_string(),
            self.severity.label(),
            self.body
        )
    }
}

/// A destination for log lines. Writing never fails from the caller's point of view.
pub trait LogSink: Send + Sync {
    /// Write one line
    fn write_line(&self, line: &LogLine);
}

/// Writes lines to the terminal. Direct lines go to stdout and request lines go to stderr.
///
/// A line is colored only when its own stream is a terminal. On top of that, `colored`
/// applies its global `NO_COLOR`/`CLICOLOR_FORCE` settings and its stdout check to the label.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Render a line for a stream, with color only if the stream is a terminal.
    pub fn render(line: &LogLine, stream_is_terminal: bool) -> String {
        if stream_is_terminal {
            line.render_colored()
        } else {
            line.to_string()
        }
    }
}

impl LogSink for ConsoleSink {
    fn write_line(&self, line: &LogLine) {
        // Each line is written while holding the stream lock so concurrent lines don't interleave.
        let result = match line.kind {
            LineKind::Direct => {
                let mut out = std::io::stdout().lock();
                let rendered = ConsoleSink::render(line, out.is_terminal());
                writeln!(out, "{rendered}")
            }
            LineKind::Request => {
                let mut out = std::io::stderr().lock();
                let rendered = ConsoleSink::render(line, out.is_terminal());
                writeln!(out, "{rendered}")
            }
        };

        if let Err(e) = result {
            event!(Level::DEBUG, error = %e, "Failed to write log line to console");
        }
    }
}

/// Forwards lines to the installed `tracing` subscriber as events at the matching level.
/// The body is sent without color.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write_line(&self, line: &LogLine) {
        let kind = line.kind.as_str();
        let body = line.body.as_str();
        match line.severity {
            Severity::Error => event!(Level::ERROR, kind, "{body}"),
            Severity::Warning => event!(Level::WARN, kind, "{body}"),
            Severity::Info => event!(Level::INFO, kind, "{body}"),
        }
    }
}

/// A sink that doesn't write anywhere, but saves the lines for later checking.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<LogLine>>>,
}

impl MemorySink {
    /// Create an empty MemorySink
    pub fn new() -> Self {
        Self::default()
    }

    /// The lines written so far
    pub fn lines(&self) -> Vec<LogLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return the lines written so far
    pub fn take(&self) -> Vec<LogLine> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &LogLine) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.clone());
    }
}

/// Write a line to the console at the given severity, with no filtering.
pub fn log(severity: Severity, text: impl Display) {
    log_to(&ConsoleSink, severity, text)
}

/// Write a line to `sink` at the given severity, with no filtering.
pub fn log_to(sink: &dyn LogSink, severity: Severity, text: impl Display) {
    sink.write_line(&LogLine::new(severity, LineKind::Direct, text.to_string()));
}
