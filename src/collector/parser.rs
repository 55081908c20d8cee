//! Line parser for `<path>(<line>,<col>): error <CODE>: <message>` output.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::DiagnosticOccurrence;

#[allow(clippy::unwrap_used)]
fn diagnostic_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<path>[^\s(][^(]*?)\((?P<line>\d+),(?P<col>\d+)\):\s+error\s+(?P<code>[A-Za-z]+\d+):\s*(?P<msg>.*?)\s*$",
        )
        .unwrap()
    })
}

/// Parses every diagnostic line in `output`, skipping unrelated text.
#[must_use]
pub fn parse_output(output: &str) -> Vec<DiagnosticOccurrence> {
    output.lines().filter_map(parse_line).collect()
}

/// Parses a single line, or `None` if it is not a diagnostic.
#[must_use]
pub fn parse_line(line: &str) -> Option<DiagnosticOccurrence> {
    let caps = diagnostic_line().captures(line.trim_end_matches('\r'))?;
    Some(DiagnosticOccurrence {
        file_path: caps["path"].trim().to_string(),
        line: caps["line"].parse().ok()?,
        column: caps["col"].parse().ok()?,
        code: caps["code"].to_string(),
        message: caps["msg"].to_string(),
    })
}
