use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

use crate::processors::{apply_line_fix, FixProcessor, ProcessContext, ProcessOutcome};

/// `D1128`: "Declaration or statement expected" caused by doubled separators.
pub struct StraySeparator;

impl StraySeparator {
    pub const CODE: &'static str = "D1128";
}

#[allow(clippy::unwrap_used)]
fn doubled_comma() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",(\s*,)+").unwrap())
}

#[allow(clippy::unwrap_used)]
fn comma_after_open_brace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([\w$]+):\s*\{\s*,").unwrap())
}

#[allow(clippy::unwrap_used)]
fn doubled_semicolon() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r";(\s*;)+\s*$").unwrap())
}

fn fix_line(line: &str, _next: Option<&str>) -> Option<String> {
    let step = doubled_comma().replace_all(line, ",");
    let step = comma_after_open_brace().replace_all(&step, "$1: {");
    let step = doubled_semicolon().replace_all(&step, ";");
    (step != line).then(|| step.into_owned())
}

impl FixProcessor for StraySeparator {
    fn code(&self) -> &'static str {
        Self::CODE
    }

    fn description(&self) -> &'static str {
        "Collapse doubled commas and semicolons"
    }

    fn process(&self, ctx: &ProcessContext<'_>, dry_run: bool) -> Result<ProcessOutcome> {
        apply_line_fix(ctx, dry_run, fix_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_double_comma() {
        assert_eq!(fix_line("  },  ,", None), Some("  },".to_string()));
        assert_eq!(fix_line("a,,b", None), Some("a,b".to_string()));
    }

    #[test]
    fn drops_comma_after_open_brace() {
        assert_eq!(fix_line("  style: { ,", None), Some("  style: {".to_string()));
    }

    #[test]
    fn collapses_trailing_semicolons() {
        assert_eq!(fix_line("return x;;", None), Some("return x;".to_string()));
    }

    #[test]
    fn clean_line_is_untouched() {
        assert_eq!(fix_line("for (;;) {", None), None);
        assert_eq!(fix_line("  a: 1,", None), None);
    }
}
