use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("invalid selector: {selector}")]
    InvalidSelector { selector: String },
}

/// A rule whose evaluation aborted. Sibling rules are unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    /// Rule names from the document root down to the failing rule.
    pub rule_path: Vec<String>,
    pub error: ExtractionError,
}

impl RuleFailure {
    pub fn rule(&self) -> String {
        self.rule_path.join(".")
    }

    pub fn is_top_level(&self) -> bool {
        self.rule_path.len() == 1
    }
}

impl fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule '{}': {}", self.rule(), self.error)
    }
}

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("all {} rules failed", .failures.len())]
    AllRulesFailed { failures: Vec<RuleFailure> },
}
