use once_cell::sync::Lazy;
use serde_json::json;

use crate::schema::{rules::validate_rules, types::Rule};

pub const TITLE: &str = "TITLE";
pub const OPEN_GRAPH_TAGS: &str = "OPEN_GRAPH_TAGS";
pub const ICON_TAGS: &str = "ICON_TAGS";

/// Rules every document carries unless it defines a rule with the same name.
/// Built through the regular validator so they share the normalized form.
pub static DEFAULT_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    let raw = json!([
        {
            "name": TITLE,
            "match": "title"
        },
        {
            "name": OPEN_GRAPH_TAGS,
            "match": {
                "include": "meta[property^=\"og:\"]",
                "outerNode": true
            }
        },
        {
            "name": ICON_TAGS,
            "match": {
                "or": [
                    { "include": "link[rel=\"icon\"]", "outerNode": true },
                    { "include": "link[rel=\"shortcut icon\"]", "outerNode": true }
                ]
            }
        }
    ]);
    validate_rules(&raw, "defaults").expect("Built-in rules must validate")
});

/// Appends each built-in rule whose name the user rules do not already use.
pub fn append_defaults(rules: &mut Vec<Rule>) {
    for default in DEFAULT_RULES.iter() {
        if !rules.iter().any(|rule| rule.name == default.name) {
            rules.push(default.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{MatchSpec, RuleSource};

    #[test]
    fn test_default_rules_are_well_formed() {
        let names: Vec<_> = DEFAULT_RULES.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![TITLE, OPEN_GRAPH_TAGS, ICON_TAGS]);

        let RuleSource::Match(MatchSpec::Any { or }) = &DEFAULT_RULES[2].source else {
            panic!("ICON_TAGS should be an alternation");
        };
        assert_eq!(or.len(), 2);
        assert!(or.iter().all(|b| b.outer_node && b.keep_basic_markup));
    }

    #[test]
    fn test_append_defaults_skips_shadowed_names() {
        let mut rules = vec![DEFAULT_RULES[0].clone()];
        rules[0].source = RuleSource::LiteralValues(vec!["Mine".to_string()]);

        append_defaults(&mut rules);

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].name, TITLE);
        assert!(matches!(rules[0].source, RuleSource::LiteralValues(_)));
    }
}
