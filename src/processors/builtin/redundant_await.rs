use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

use crate::processors::{apply_line_fix, FixProcessor, ProcessContext, ProcessOutcome};

/// `D80007`: "'await' has no effect on the type of this expression".
pub struct RedundantAwait;

impl RedundantAwait {
    pub const CODE: &'static str = "D80007";
}

#[allow(clippy::unwrap_used)]
fn await_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bawait\s+").unwrap())
}

fn fix_line(line: &str, _next: Option<&str>) -> Option<String> {
    await_token()
        .is_match(line)
        .then(|| await_token().replacen(line, 1, "").into_owned())
}

impl FixProcessor for RedundantAwait {
    fn code(&self) -> &'static str {
        Self::CODE
    }

    fn description(&self) -> &'static str {
        "Drop `await` on values that are not promises"
    }

    fn process(&self, ctx: &ProcessContext<'_>, dry_run: bool) -> Result<ProcessOutcome> {
        apply_line_fix(ctx, dry_run, fix_line)
    }
}
