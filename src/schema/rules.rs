use serde_json::Value;

use crate::schema::{
    errors::ValidationError,
    pattern,
    raw::{
        as_object, as_string, is_present, join, lookup, optional_string, parse_bool,
        require_string, string_list,
    },
    types::{MatchBlock, MatchSpec, Rewrite, Rule, RuleSource},
};

const MATCH_ALL: &str = ".*";

/// Validates a non-empty array of rules located at `path`.
pub fn validate_rules(raw: &Value, path: &str) -> Result<Vec<Rule>, ValidationError> {
    let items = raw
        .as_array()
        .ok_or_else(|| ValidationError::invalid(path, "rules must be an array"))?;
    if items.is_empty() {
        return Err(ValidationError::invalid(
            path,
            "must contain at least one rule",
        ));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| validate_rule(item, &format!("{path}[{i}]")))
        .collect()
}

fn validate_rule(raw: &Value, path: &str) -> Result<Rule, ValidationError> {
    if !is_present(raw) {
        return Err(ValidationError::missing(path));
    }
    let obj = as_object(raw, path)?;
    let name = require_string(obj, path, &["name"])?;

    let matcher = lookup(obj, &["match"]);
    let attribute = optional_string(obj, path, &["attribute"])?;
    let literal = lookup(obj, &["value", "literalValues"]);

    if let Some((key, _)) = literal
        && (matcher.is_some() || attribute.is_some())
    {
        return Err(ValidationError::invalid(
            join(path, key),
            "literal values can not be combined with match or attribute",
        ));
    }

    let sub_rules = match lookup(obj, &["rules", "subRules"]) {
        Some((key, _)) if matcher.is_none() => {
            return Err(ValidationError::invalid(
                join(path, key),
                "sub-rules are only allowed alongside match",
            ));
        }
        Some((key, value)) => validate_rules(value, &join(path, key))?,
        None => Vec::new(),
    };
    let has_sub_rules = !sub_rules.is_empty();

    let source = if let Some((key, value)) = matcher {
        let spec = validate_match(value, &join(path, key), has_sub_rules)?;
        RuleSource::Match(apply_rule_attribute(spec, attribute, &join(path, "attribute"))?)
    } else if let Some(attribute) = attribute {
        RuleSource::Attribute(attribute)
    } else if let Some((key, value)) = literal {
        RuleSource::LiteralValues(string_list(Some(value), &join(path, key))?)
    } else {
        return Err(ValidationError::missing(join(path, "match")));
    };

    let rewrite = lookup(obj, &["rewrite"])
        .map(|(key, value)| validate_rewrite(value, &join(path, key), has_sub_rules))
        .transpose()?;

    Ok(Rule {
        name,
        source,
        sub_rules,
        rewrite,
    })
}

fn validate_match(raw: &Value, path: &str, has_sub_rules: bool) -> Result<MatchSpec, ValidationError> {
    match raw {
        Value::String(_) => Ok(MatchSpec::Single(validate_block(raw, path, has_sub_rules)?)),
        Value::Object(obj) => match lookup(obj, &["or"]) {
            Some((key, Value::Array(branches))) if !branches.is_empty() => {
                let or_path = join(path, key);
                let or = branches
                    .iter()
                    .enumerate()
                    .map(|(i, branch)| {
                        validate_block(branch, &format!("{or_path}[{i}]"), has_sub_rules)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(MatchSpec::Any { or })
            }
            Some((key, _)) => Err(ValidationError::invalid(
                join(path, key),
                "OR block must contain a non-empty array",
            )),
            None => Ok(MatchSpec::Single(validate_block(raw, path, has_sub_rules)?)),
        },
        _ => Err(ValidationError::invalid(
            path,
            "rule match must be either a string or an object",
        )),
    }
}

fn validate_block(raw: &Value, path: &str, has_sub_rules: bool) -> Result<MatchBlock, ValidationError> {
    if let Value::String(include) = raw {
        return Ok(MatchBlock {
            include: include.clone(),
            keep_basic_markup: has_sub_rules,
            ..MatchBlock::default()
        });
    }

    let obj = as_object(raw, path)?;
    let include = require_string(obj, path, &["include"])?;
    let exclude = optional_string(obj, path, &["exclude"])?.unwrap_or_default();
    let attribute = optional_string(obj, path, &["attribute"])?;
    let add_next_until = optional_string(obj, path, &["addNextUntil"])?;

    // Grouped siblings are wrapped in a synthetic container, so the outer node is
    // never the page's own.
    let outer_node = match add_next_until {
        Some(_) => false,
        None => parse_bool(obj.get("outerNode"), &join(path, "outerNode"))?,
    };

    let remove_inside = string_list(
        lookup(obj, &["removeInside"]).map(|(_, v)| v),
        &join(path, "removeInside"),
    )?;

    let keep_basic_markup = if outer_node || has_sub_rules {
        true
    } else {
        parse_bool(obj.get("keepBasicMarkup"), &join(path, "keepBasicMarkup"))?
    };

    Ok(MatchBlock {
        include,
        exclude,
        attribute,
        outer_node,
        keep_basic_markup,
        remove_inside,
        add_next_until,
    })
}

/// A rule-level `attribute` next to `match` applies to every block that does not
/// name its own.
fn apply_rule_attribute(
    spec: MatchSpec,
    attribute: Option<String>,
    field: &str,
) -> Result<MatchSpec, ValidationError> {
    let Some(attribute) = attribute else {
        return Ok(spec);
    };

    let apply = |mut block: MatchBlock| {
        if let Some(own) = &block.attribute
            && *own != attribute
        {
            return Err(ValidationError::invalid(
                field,
                format!("conflicts with match attribute '{own}'"),
            ));
        }
        block.attribute = Some(attribute.clone());
        Ok(block)
    };

    match spec {
        MatchSpec::Single(block) => Ok(MatchSpec::Single(apply(block)?)),
        MatchSpec::Any { or } => Ok(MatchSpec::Any {
            or: or.into_iter().map(apply).collect::<Result<_, _>>()?,
        }),
    }
}

fn validate_rewrite(raw: &Value, path: &str, has_sub_rules: bool) -> Result<Rewrite, ValidationError> {
    if has_sub_rules {
        return Err(ValidationError::invalid(
            path,
            "rule with sub-rules can not contain a rewrite block",
        ));
    }

    let (find, output) = match raw {
        Value::String(output) => (MATCH_ALL.to_string(), output.clone()),
        Value::Object(obj) => {
            let output = require_string(obj, path, &["output"])?;
            let find = match lookup(obj, &["find"]) {
                Some((key, value)) => as_string(value, &join(path, key))?,
                None => MATCH_ALL.to_string(),
            };
            (find, output)
        }
        _ => {
            return Err(ValidationError::invalid(
                path,
                "rewrite must be either a string or an object",
            ));
        }
    };

    Ok(Rewrite {
        find: pattern::compile(&find, &join(path, "find"))?,
        output,
    })
}
