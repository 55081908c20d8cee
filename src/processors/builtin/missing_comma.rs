use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

use crate::processors::{apply_line_fix, FixProcessor, ProcessContext, ProcessOutcome};

/// `D1005`: "',' expected" inside object literals.
pub struct MissingComma;

impl MissingComma {
    pub const CODE: &'static str = "D1005";
}

#[allow(clippy::unwrap_used)]
fn property_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `  key: value` that does not already end in a separator or brace.
    RE.get_or_init(|| Regex::new(r"^\s+[\w$]+\??:\s*[^,{}\s](.*[^,{};])?$").unwrap())
}

#[allow(clippy::unwrap_used)]
fn property_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s+[\w$]+\??:").unwrap())
}

fn closes_scope(line: &str) -> bool {
    matches!(line.trim_start().chars().next(), Some('}' | ')' | ']'))
}

fn fix_line(line: &str, next: Option<&str>) -> Option<String> {
    let next = next?;
    if property_line().is_match(line) && !closes_scope(next) {
        return Some(format!("{line},"));
    }
    // A nested object closed right before the next property: `}` -> `},`
    if line.trim() == "}" && property_start().is_match(next) {
        return Some(line.replacen('}', "},", 1));
    }
    None
}

impl FixProcessor for MissingComma {
    fn code(&self) -> &'static str {
        Self::CODE
    }

    fn description(&self) -> &'static str {
        "Insert missing commas between object properties"
    }

    fn process(&self, ctx: &ProcessContext<'_>, dry_run: bool) -> Result<ProcessOutcome> {
        apply_line_fix(ctx, dry_run, fix_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_comma_before_next_property() {
        assert_eq!(
            fix_line("  name: 'basil'", Some("  kind: 'herb'")),
            Some("  name: 'basil',".to_string())
        );
    }

    #[test]
    fn leaves_last_property_alone() {
        assert_eq!(fix_line("  name: 'basil'", Some("}")), None);
        assert_eq!(fix_line("  name: 'basil'", None), None);
    }

    #[test]
    fn single_character_values_get_a_comma() {
        assert_eq!(fix_line("  a: 1", Some("  b: 2")), Some("  a: 1,".to_string()));
    }

    #[test]
    fn leaves_terminated_lines_alone() {
        assert_eq!(fix_line("  name: 'basil',", Some("  kind: 1")), None);
        assert_eq!(fix_line("  nested: {", Some("  kind: 1")), None);
    }

    #[test]
    fn closes_nested_object_with_comma() {
        assert_eq!(
            fix_line("    }", Some("    next: 2")),
            Some("    },".to_string())
        );
    }
}
