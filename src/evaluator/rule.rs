use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::dom::SelectorAdapter;
use crate::evaluator::errors::{ExtractionError, RuleFailure};
use crate::evaluator::match_block::{MatchOutput, evaluate_match_block};
use crate::evaluator::record::{ExtractionRecord, ExtractionValue};
use crate::schema::{MatchSpec, Rewrite, Rule, RuleSource};

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$(\d+)").unwrap());

/// Evaluates a single rule against `context`.
///
/// Failures of nested sub-rules do not fail this rule; they are logged and their
/// keys are left out of the nested records.
pub fn evaluate_rule<A: SelectorAdapter>(
    adapter: &A,
    context: &A::Node,
    rule: &Rule,
) -> Result<Vec<ExtractionValue>, ExtractionError> {
    let mut failures = Vec::new();
    let values = evaluate_rule_at(adapter, context, rule, &[], &mut failures)?;
    for failure in &failures {
        warn!(%failure, "sub-rule evaluation failed");
    }
    Ok(values)
}

/// Evaluates `rules` in order into a record. Later rules overwrite earlier ones
/// with the same name. A failing rule is recorded in `failures` and its key is
/// left out; the remaining rules still run.
pub(crate) fn evaluate_rules<A: SelectorAdapter>(
    adapter: &A,
    context: &A::Node,
    rules: &[Rule],
    parent_path: &[String],
    failures: &mut Vec<RuleFailure>,
) -> ExtractionRecord {
    let mut record = ExtractionRecord::new();

    for rule in rules {
        match evaluate_rule_at(adapter, context, rule, parent_path, failures) {
            Ok(values) => {
                debug!(rule = %rule.name, values = values.len(), "evaluated rule");
                record.insert(rule.name.clone(), values);
            }
            Err(error) => {
                let failure = RuleFailure {
                    rule_path: child_path(parent_path, &rule.name),
                    error,
                };
                warn!(%failure, "rule evaluation failed");
                failures.push(failure);
            }
        }
    }

    record
}

fn child_path(parent_path: &[String], name: &str) -> Vec<String> {
    let mut path = parent_path.to_vec();
    path.push(name.to_string());
    path
}

fn evaluate_rule_at<A: SelectorAdapter>(
    adapter: &A,
    context: &A::Node,
    rule: &Rule,
    parent_path: &[String],
    failures: &mut Vec<RuleFailure>,
) -> Result<Vec<ExtractionValue>, ExtractionError> {
    let leaves: Vec<String> = match &rule.source {
        RuleSource::LiteralValues(values) => values
            .iter()
            .map(|value| adapter.markup_to_text(value))
            .collect(),
        RuleSource::Attribute(name) => vec![adapter.attribute(context, name).unwrap_or_default()],
        RuleSource::Match(spec) => {
            match evaluate_match_spec(adapter, context, spec, rule.has_sub_rules())? {
                MatchOutput::Values(values) => values,
                MatchOutput::Nodes(nodes) => {
                    let path = child_path(parent_path, &rule.name);
                    return Ok(nodes
                        .iter()
                        .map(|node| {
                            ExtractionValue::Record(evaluate_rules(
                                adapter,
                                node,
                                &rule.sub_rules,
                                &path,
                                failures,
                            ))
                        })
                        .collect());
                }
            }
        }
    };

    let leaves: Vec<String> = match &rule.rewrite {
        Some(rewrite) => leaves
            .into_iter()
            .map(|value| match apply_rewrite(rewrite, &value) {
                Some(output) => adapter.markup_to_text(&output),
                None => value,
            })
            .collect(),
        None => leaves,
    };

    Ok(leaves.into_iter().map(ExtractionValue::Text).collect())
}

/// Evaluates a single block, or the branches of an alternation in order until
/// one of them yields something. Later branches are never evaluated.
fn evaluate_match_spec<A: SelectorAdapter>(
    adapter: &A,
    context: &A::Node,
    spec: &MatchSpec,
    has_sub_rules: bool,
) -> Result<MatchOutput<A::Node>, ExtractionError> {
    match spec {
        MatchSpec::Single(block) => evaluate_match_block(adapter, context, block, has_sub_rules),
        MatchSpec::Any { or } => {
            for (branch, block) in or.iter().enumerate() {
                let output = evaluate_match_block(adapter, context, block, has_sub_rules)?;
                if !output.is_empty() {
                    debug!(branch, include = %block.include, "alternation branch matched");
                    return Ok(output);
                }
            }
            Ok(MatchOutput::Values(Vec::new()))
        }
    }
}

/// Substitutes `$N` placeholders in the rewrite output with the capture groups of
/// `find`. Groups that did not participate, or do not exist, become empty.
/// Returns `None` when `find` does not match.
pub fn apply_rewrite(rewrite: &Rewrite, value: &str) -> Option<String> {
    let captures = rewrite.find.captures(value)?;
    let output = PLACEHOLDER_REGEX.replace_all(&rewrite.output, |placeholder: &Captures| {
        placeholder[1]
            .parse::<usize>()
            .ok()
            .and_then(|group| captures.get(group))
            .map_or("", |m| m.as_str())
            .to_string()
    });
    Some(output.into_owned())
}
