//! Structural-sanity checks run against files after a live fix.
//!
//! Each check answers one question: does this content carry a corruption
//! signature? New heuristics plug in through [`SanityCheck`] without touching
//! the transaction engine.

use regex::Regex;
use std::sync::OnceLock;

/// Keywords that are never legitimately repeated back to back.
pub const KEYWORDS: &[&str] = &[
    "const", "let", "var", "return", "await", "async", "export", "import", "function", "new",
    "typeof", "static", "public", "private", "readonly", "interface", "class",
];

pub trait SanityCheck {
    fn name(&self) -> &'static str;

    /// Number of places in `content` showing the corruption this check looks for.
    fn occurrences(&self, content: &str) -> usize;

    fn check(&self, content: &str) -> bool {
        self.occurrences(content) > 0
    }
}

/// Four or more identical closing brackets in a row: `}}}}`, `))))`, `]]]]`.
pub struct RepeatedBracketRun;

#[allow(clippy::unwrap_used)]
fn bracket_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\}{4,}|\){4,}|\]{4,}").unwrap())
}

impl SanityCheck for RepeatedBracketRun {
    fn name(&self) -> &'static str {
        "repeated-bracket-run"
    }

    fn occurrences(&self, content: &str) -> usize {
        bracket_run().find_iter(content).count()
    }
}

/// Three or more commas with nothing but whitespace between them.
pub struct RepeatedCommaRun;

#[allow(clippy::unwrap_used)]
fn comma_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",[ \t]*,[ \t]*,").unwrap())
}

impl SanityCheck for RepeatedCommaRun {
    fn name(&self) -> &'static str {
        "repeated-comma-run"
    }

    fn occurrences(&self, content: &str) -> usize {
        comma_run().find_iter(content).count()
    }
}

/// The same keyword twice in a row, e.g. `const const`.
pub struct DuplicatedKeyword;

impl SanityCheck for DuplicatedKeyword {
    fn name(&self) -> &'static str {
        "duplicated-keyword"
    }

    fn occurrences(&self, content: &str) -> usize {
        repeated_keyword_spans(content).len()
    }
}

#[allow(clippy::unwrap_used)]
fn keyword_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"\b(?:{})\b", KEYWORDS.join("|"))).unwrap())
}

/// Byte ranges covering each redundant keyword plus the blanks after it.
///
/// Removing every returned range leaves a single copy of each repeated run.
#[must_use]
pub fn repeated_keyword_spans(text: &str) -> Vec<(usize, usize)> {
    let tokens: Vec<_> = keyword_token().find_iter(text).collect();
    tokens
        .windows(2)
        .filter(|pair| {
            let gap = &text[pair[0].end()..pair[1].start()];
            pair[0].as_str() == pair[1].as_str()
                && !gap.is_empty()
                && gap.chars().all(|c| c == ' ' || c == '\t')
        })
        .map(|pair| (pair[0].start(), pair[1].start()))
        .collect()
}

/// An ordered, extensible set of checks.
pub struct SanityChecks {
    checks: Vec<Box<dyn SanityCheck>>,
}

impl SanityChecks {
    #[must_use]
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    #[must_use]
    pub fn with(mut self, check: impl SanityCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn push(&mut self, check: Box<dyn SanityCheck>) {
        self.checks.push(check);
    }

    /// Names of every check that matches more often in `after` than in `before`.
    #[must_use]
    pub fn introduced(&self, before: &str, after: &str) -> Vec<&'static str> {
        self.checks
            .iter()
            .filter(|c| c.occurrences(after) > c.occurrences(before))
            .map(|c| c.name())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Default for SanityChecks {
    fn default() -> Self {
        Self::empty()
            .with(RepeatedBracketRun)
            .with(RepeatedCommaRun)
            .with(DuplicatedKeyword)
    }
}
