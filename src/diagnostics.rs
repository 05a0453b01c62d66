//! Reporting of tolerated anomalies.
//!
//! The parser never fails a playlist over an unrecognized tag, a bad scalar
//! value or an orphan line; those are routed here instead, stamped with the
//! line they came from.

use std::fmt;

use tracing::warn;

/// One tolerated anomaly. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Receives the anomalies a parse tolerates.
///
/// The sink sees everything the parser skips over; the returned
/// [`Playlist`](crate::playlist::Playlist) keeps its shape regardless, with
/// the affected fields left at their defaults.
pub trait DiagnosticSink {
    fn report(&mut self, line: usize, message: &str);
}

/// Forwards every anomaly to `tracing` at warn level. This is the sink
/// behind [`parse_playlist`](crate::parser::parse_playlist).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, line: usize, message: &str) {
        warn!(line, "{}", message);
    }
}

/// Collects anomalies for later inspection.
impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, line: usize, message: &str) {
        self.push(Diagnostic {
            line,
            message: message.to_string(),
        });
    }
}
