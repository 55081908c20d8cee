use anyhow::Result;

use crate::processors::{apply_line_fix, FixProcessor, ProcessContext, ProcessOutcome};
use crate::transaction::sanity::repeated_keyword_spans;

/// `D1434`: "Unexpected keyword or identifier" from a doubled keyword.
pub struct DuplicateKeyword;

impl DuplicateKeyword {
    pub const CODE: &'static str = "D1434";
}

fn fix_line(line: &str, _next: Option<&str>) -> Option<String> {
    let spans = repeated_keyword_spans(line);
    if spans.is_empty() {
        return None;
    }
    let mut fixed = line.to_string();
    for (start, end) in spans.into_iter().rev() {
        fixed.replace_range(start..end, "");
    }
    Some(fixed)
}

impl FixProcessor for DuplicateKeyword {
    fn code(&self) -> &'static str {
        Self::CODE
    }

    fn description(&self) -> &'static str {
        "Collapse keywords repeated back to back"
    }

    fn process(&self, ctx: &ProcessContext<'_>, dry_run: bool) -> Result<ProcessOutcome> {
        apply_line_fix(ctx, dry_run, fix_line)
    }
}
