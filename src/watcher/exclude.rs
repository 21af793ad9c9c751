//! Path exclusion rules.

use std::path::{Component, Path};

use glob::Pattern;

/// Compiled exclusion rules for one monitor.
///
/// A path is excluded when any single segment of it matches any rule with
/// shell-style globbing (`*`, `?`, character classes). Matching per segment
/// means a bare name like `node_modules` or `.git` excludes that directory
/// at any depth, without a full-path glob.
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    patterns: Vec<Pattern>,
}

impl ExcludeRules {
    /// Compile a rule set. Malformed patterns are logged and skipped, never
    /// fatal.
    #[must_use]
    pub fn new(rules: &[String]) -> Self {
        let patterns = rules
            .iter()
            .filter_map(|rule| match Pattern::new(rule) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(rule = %rule, error = %e, "Skipping malformed exclude pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Check whether any segment of `path` matches any rule.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        path.components().any(|component| {
            let Component::Normal(segment) = component else {
                return false;
            };
            let segment = segment.to_string_lossy();
            self.patterns.iter().any(|pattern| pattern.matches(&segment))
        })
    }

    /// Number of compiled rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the rule set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
