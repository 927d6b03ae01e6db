pub mod errors;
pub mod match_block;
pub mod record;
pub mod rule;

#[cfg(test)]
mod tests;

pub use errors::{EvaluationError, ExtractionError, RuleFailure};
pub use match_block::{MatchOutput, evaluate_match_block};
pub use record::{BASE_URL, ExtractionRecord, ExtractionValue, FULL_URL};
pub use rule::{apply_rewrite, evaluate_rule};

use tracing::{debug, instrument, warn};

use crate::dom::{HtmlAdapter, SelectorAdapter, parse_document};
use crate::schema::RuleDocument;

/// Outcome of evaluating a whole document: the record plus every rule that
/// failed along the way, nested sub-rules included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub record: ExtractionRecord,
    pub failures: Vec<RuleFailure>,
}

/// Evaluates every rule of `document` against `root`, in order.
///
/// A failing rule only loses its own key. The evaluation as a whole fails
/// only when every top-level rule failed.
#[instrument(skip_all, fields(parser = %document.name()))]
pub fn evaluate_document<A: SelectorAdapter>(
    adapter: &A,
    root: &A::Node,
    document: &RuleDocument,
) -> Result<Extraction, EvaluationError> {
    let mut failures = Vec::new();
    let record = rule::evaluate_rules(adapter, root, document.rules(), &[], &mut failures);

    let failed = failures.iter().filter(|f| f.is_top_level()).count();
    if !document.rules().is_empty() && failed == document.rules().len() {
        warn!(failed, "every rule failed");
        return Err(EvaluationError::AllRulesFailed { failures });
    }

    debug!(
        entries = record.len(),
        failures = failures.len(),
        "evaluated document"
    );
    Ok(Extraction { record, failures })
}

impl RuleDocument {
    /// Parses `html` and evaluates this document against it.
    pub fn extract_html(&self, html: &str) -> Result<Extraction, EvaluationError> {
        let root = parse_document(html);
        evaluate_document(&HtmlAdapter, &root, self)
    }
}
