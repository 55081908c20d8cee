// src/processors/registry.rs
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::builtin;
use super::FixProcessor;
use crate::error::{FixError, Result};

/// Builds a fresh processor instance.
pub type ProcessorFactory = Box<dyn Fn() -> Box<dyn FixProcessor>>;

/// Priority tier for a diagnostic code, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// No processor is registered; needs a human.
    Manual,
    Low,
    Medium,
    High,
    Critical,
}

impl Tier {
    /// Classifies an occurrence count for a code that has a processor.
    #[must_use]
    pub fn for_count(count: usize) -> Self {
        match count {
            c if c >= 100 => Self::Critical,
            c if c >= 50 => Self::High,
            c if c >= 10 => Self::Medium,
            _ => Self::Low,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub code: String,
    pub count: usize,
    pub tier: Tier,
    /// Description of the registered processor, if any.
    pub processor: Option<String>,
}

/// Runtime table from diagnostic code to processor constructor.
pub struct ProcessorRegistry {
    factories: BTreeMap<String, ProcessorFactory>,
}

impl ProcessorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry holding the built-in processors.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Registers (or replaces) the constructor for `code`.
    pub fn register<F>(&mut self, code: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn FixProcessor> + 'static,
    {
        self.factories.insert(code.into(), Box::new(factory));
    }

    #[must_use]
    pub fn supports(&self, code: &str) -> bool {
        self.factories.contains_key(code)
    }

    /// Registered codes in ascending order.
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Creates a new processor instance for `code`.
    ///
    /// # Errors
    /// Returns `FixError::UnsupportedCode` when nothing is registered for it.
    pub fn create(&self, code: &str) -> Result<Box<dyn FixProcessor>> {
        self.factories
            .get(code)
            .map(|factory| factory())
            .ok_or_else(|| FixError::UnsupportedCode(code.to_string()))
    }

    /// Classifies occurrence counts into tiers, most urgent first.
    ///
    /// Ordering: tier descending, then count descending, then code ascending.
    #[must_use]
    pub fn recommend(&self, counts: &BTreeMap<String, usize>) -> Vec<Recommendation> {
        let mut recs: Vec<Recommendation> = counts
            .iter()
            .map(|(code, &count)| {
                let processor = self.create(code).ok();
                Recommendation {
                    code: code.clone(),
                    count,
                    tier: processor
                        .as_ref()
                        .map_or(Tier::Manual, |_| Tier::for_count(count)),
                    processor: processor.map(|p| p.description().to_string()),
                }
            })
            .collect();

        recs.sort_by(|a, b| {
            b.tier
                .cmp(&a.tier)
                .then_with(|| b.count.cmp(&a.count))
                .then_with(|| a.code.cmp(&b.code))
        });
        recs
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
