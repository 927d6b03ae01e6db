use serde_json::{Value, json};
use std::fs;

use crate::dom::{HtmlAdapter, parse_document};
use crate::evaluator::{EvaluationError, Extraction, ExtractionValue, evaluate_document};
use crate::schema::defaults::{ICON_TAGS, OPEN_GRAPH_TAGS, TITLE};
use crate::schema::{RuleDocument, validate};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/evaluator/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

fn document(rules: Value) -> RuleDocument {
    validate(&json!({
        "info": {
            "name": "sample",
            "type": "article",
            "domain": "example.com",
            "path": "/article/.+"
        },
        "rules": rules
    }))
    .expect("Test document should validate")
}

fn extract(rules: Value) -> Extraction {
    document(rules)
        .extract_html(&fixture("article.html"))
        .expect("Evaluation should succeed")
}

fn records(extraction: &Extraction, name: &str) -> Vec<crate::evaluator::ExtractionRecord> {
    extraction
        .record
        .get(name)
        .expect("Missing entry")
        .iter()
        .map(|value| value.as_record().expect("Expected a nested record").clone())
        .collect()
}

#[test]
fn test_attribute_of_matched_meta() {
    let extraction = extract(json!([
        {"name": "title", "match": "meta[property='og:title']", "attribute": "content"}
    ]));

    assert_eq!(extraction.record.texts("title"), Some(vec!["Hello"]));
    assert!(extraction.failures.is_empty());
}

#[test]
fn test_default_rules() {
    let extraction = extract(json!([{"name": "heading", "match": "h1"}]));

    let names: Vec<_> = extraction.record.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["heading", TITLE, OPEN_GRAPH_TAGS, ICON_TAGS]);

    assert_eq!(extraction.record.texts(TITLE), Some(vec!["Sample Article"]));
    assert_eq!(
        extraction.record.texts(OPEN_GRAPH_TAGS),
        Some(vec![
            r#"<meta property="og:title" content="Hello">"#,
            r#"<meta property="og:type" content="article">"#,
        ])
    );
    assert_eq!(
        extraction.record.texts(ICON_TAGS),
        Some(vec![r#"<link rel="icon" href="/favicon.ico">"#])
    );
}

#[test]
fn test_defaults_on_page_without_tags() {
    let extraction = document(json!([{"name": "para", "match": "p"}]))
        .extract_html(&fixture("bare.html"))
        .unwrap();

    assert_eq!(extraction.record.texts("para"), Some(vec!["Nothing to see."]));
    assert_eq!(extraction.record.texts(TITLE), Some(vec!["Bare"]));
    assert_eq!(extraction.record.texts(OPEN_GRAPH_TAGS), Some(vec![]));
    assert_eq!(extraction.record.texts(ICON_TAGS), Some(vec![]));
}

#[test]
fn test_user_title_replaces_default() {
    let extraction = extract(json!([{"name": TITLE, "value": "Mine"}]));

    assert_eq!(extraction.record.texts(TITLE), Some(vec!["Mine"]));
}

#[test]
fn test_literal_values_are_stripped_of_markup() {
    let extraction = extract(json!([
        {"name": "literal", "value": ["<b>Bold</b> move", "plain"]}
    ]));

    assert_eq!(
        extraction.record.texts("literal"),
        Some(vec!["Bold move", "plain"])
    );
}

#[test]
fn test_text_extraction_with_remove_inside() {
    let extraction = extract(json!([
        {"name": "body", "match": {"include": ".content", "removeInside": [".ad"]}}
    ]));

    let body = extraction.record.texts("body").unwrap();
    assert_eq!(body.len(), 1);
    assert!(body[0].contains("First paragraph of text."));
    assert!(body[0].contains("Second paragraph."));
    assert!(!body[0].contains("Buy things"));
}

#[test]
fn test_basic_markup_is_sanitized() {
    let extraction = extract(json!([
        {"name": "paragraphs", "match": {"include": ".content p", "keepBasicMarkup": true}},
        {"name": "content", "match": {"include": ".content", "outerNode": true, "removeInside": ".ad"}}
    ]));

    assert_eq!(
        extraction.record.texts("paragraphs"),
        Some(vec!["First paragraph of text.", "Second <em>paragraph</em>."])
    );

    let content = extraction.record.texts("content").unwrap();
    assert!(content[0].starts_with("<div>"));
    assert!(!content[0].contains("class="));
    assert!(!content[0].contains("style="));
    assert!(!content[0].contains("align="));
    assert!(!content[0].contains("custom-widget"));
    assert!(!content[0].contains("Buy things"));
}

#[test]
fn test_exclude_and_missing_attributes() {
    let extraction = extract(json!([
        {"name": "plain", "match": {"include": ".content p", "exclude": "[align]"}},
        {"name": "aligned", "match": "p", "attribute": "align"}
    ]));

    assert_eq!(extraction.record.texts("plain"), Some(vec!["Second paragraph."]));
    assert_eq!(extraction.record.texts("aligned"), Some(vec!["center"]));
}

#[test]
fn test_alternation_never_reaches_invalid_branch() {
    let extraction = extract(json!([
        {"name": "heading", "match": {"or": [{"include": "h1"}, {"include": "p[["}]}}
    ]));

    assert_eq!(extraction.record.texts("heading"), Some(vec!["Sample Article"]));
    assert!(extraction.failures.is_empty());
}

#[test]
fn test_alternation_falls_through_to_later_branch() {
    let extraction = extract(json!([
        {"name": "heading", "match": {"or": ["h2", ".headline"]}}
    ]));

    assert_eq!(extraction.record.texts("heading"), Some(vec!["Sample Article"]));
}

#[test]
fn test_sub_rules_produce_nested_records() {
    let extraction = extract(json!([
        {
            "name": "comments",
            "match": ".comment",
            "rules": [
                {"name": "author", "match": ".author"},
                {"name": "body", "match": ".body", "rewrite": {"find": "(\\d+)", "output": "#$1"}}
            ]
        }
    ]));

    let comments = records(&extraction, "comments");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].texts("author"), Some(vec!["alice"]));
    assert_eq!(comments[0].texts("body"), Some(vec!["Great post"]));
    assert_eq!(comments[1].texts("author"), Some(vec!["bob"]));
    assert_eq!(comments[1].texts("body"), Some(vec!["#42"]));
}

#[test]
fn test_sub_rules_read_context_attributes() {
    let extraction = extract(json!([
        {
            "name": "links",
            "match": ".byline a",
            "rules": [
                {"name": "href", "attribute": "href"},
                {"name": "missing", "attribute": "title"}
            ]
        }
    ]));

    let links = records(&extraction, "links");
    assert_eq!(links[0].texts("href"), Some(vec!["/authors/ann"]));
    assert_eq!(links[0].texts("missing"), Some(vec![""]));
}

#[test]
fn test_sub_rules_on_stripped_copies() {
    let html = fixture("article.html");
    let root = parse_document(&html);
    let doc = document(json!([
        {
            "name": "comments",
            "match": {"include": ".comment", "removeInside": [".ad"]},
            "rules": [{"name": "spans", "match": "span"}]
        }
    ]));

    let extraction = evaluate_document(&HtmlAdapter, &root, &doc).unwrap();

    let comments = records(&extraction, "comments");
    assert_eq!(comments[0].texts("spans"), Some(vec!["alice"]));
    assert_eq!(comments[1].texts("spans"), Some(vec!["bob"]));
    assert!(root.text_contents().contains("sponsored"));
}

#[test]
fn test_add_next_until_groups_siblings() {
    let extraction = extract(json!([
        {"name": "flat", "match": {"include": "dt", "addNextUntil": "dt"}},
        {"name": "markup", "match": {"include": "dt", "addNextUntil": "dt", "keepBasicMarkup": true}},
        {
            "name": "faq",
            "match": {"include": "dt", "addNextUntil": "dt"},
            "rules": [{"name": "q", "match": "dt"}, {"name": "a", "match": "dd"}]
        }
    ]));

    assert_eq!(extraction.record.texts("flat"), Some(vec!["Q1A1A1b", "Q2A2"]));
    assert_eq!(
        extraction.record.texts("markup"),
        Some(vec![
            "<dt>Q1</dt><dd>A1</dd><dd>A1b</dd>",
            "<dt>Q2</dt><dd>A2</dd>"
        ])
    );

    let faq = records(&extraction, "faq");
    assert_eq!(faq.len(), 2);
    assert_eq!(faq[0].texts("q"), Some(vec!["Q1"]));
    assert_eq!(faq[0].texts("a"), Some(vec!["A1", "A1b"]));
    assert_eq!(faq[1].texts("a"), Some(vec!["A2"]));
}

#[test]
fn test_evaluation_leaves_source_untouched() {
    let html = fixture("article.html");
    let root = parse_document(&html);
    let before = root.to_string();
    let doc = document(json!([
        {"name": "content", "match": {"include": ".content", "removeInside": [".ad"], "keepBasicMarkup": true}},
        {"name": "faq", "match": {"include": "dt", "addNextUntil": "dt"}},
        {"name": "comments", "match": {"include": ".comment", "removeInside": ".ad"}, "rules": [{"name": "a", "match": ".author"}]}
    ]));

    let first = evaluate_document(&HtmlAdapter, &root, &doc).unwrap();
    let second = evaluate_document(&HtmlAdapter, &root, &doc).unwrap();

    assert_eq!(first, second);
    assert_eq!(root.to_string(), before);
}

#[test]
fn test_duplicate_names_overwrite() {
    let extraction = extract(json!([
        {"name": "x", "value": "one"},
        {"name": "y", "value": "middle"},
        {"name": "x", "value": "two"}
    ]));

    let names: Vec<_> = extraction.record.iter().map(|(name, _)| name).take(2).collect();
    assert_eq!(names, vec!["x", "y"]);
    assert_eq!(extraction.record.texts("x"), Some(vec!["two"]));
}

#[test]
fn test_failing_rule_does_not_stop_siblings() {
    let extraction = extract(json!([
        {"name": "broken", "match": "p[["},
        {"name": "heading", "match": "h1"}
    ]));

    assert!(!extraction.record.contains("broken"));
    assert_eq!(extraction.record.texts("heading"), Some(vec!["Sample Article"]));
    assert_eq!(extraction.failures.len(), 1);
    assert_eq!(extraction.failures[0].rule(), "broken");
}

#[test]
fn test_nested_failures_carry_parent_path() {
    let extraction = extract(json!([
        {
            "name": "comments",
            "match": ".comment",
            "rules": [{"name": "bad", "match": "[["}, {"name": "author", "match": ".author"}]
        }
    ]));

    let comments = records(&extraction, "comments");
    assert_eq!(comments.len(), 2);
    assert!(!comments[0].contains("bad"));
    assert_eq!(comments[0].texts("author"), Some(vec!["alice"]));

    assert_eq!(extraction.failures.len(), 2);
    assert!(extraction.failures.iter().all(|f| f.rule() == "comments.bad"));
    assert!(!extraction.failures[0].is_top_level());
}

#[test]
fn test_all_rules_failing_fails_evaluation() {
    let err = document(json!([
        {"name": TITLE, "match": "[["},
        {"name": OPEN_GRAPH_TAGS, "match": "[["},
        {"name": ICON_TAGS, "match": "[["}
    ]))
    .extract_html(&fixture("article.html"))
    .unwrap_err();

    let EvaluationError::AllRulesFailed { failures } = err;
    assert_eq!(failures.len(), 3);
}

#[test]
fn test_record_serializes_to_json() {
    let extraction = extract(json!([
        {"name": "comments", "match": ".comment", "rules": [{"name": "author", "match": ".author"}]}
    ]));

    let json = serde_json::to_value(&extraction.record).unwrap();
    assert_eq!(
        json["comments"],
        json!([{"author": ["alice"]}, {"author": ["bob"]}])
    );
    assert_eq!(json[TITLE], json!(["Sample Article"]));
    assert!(matches!(
        extraction.record.get("comments").unwrap()[0],
        ExtractionValue::Record(_)
    ));
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    const SELECTORS: [&str; 8] = ["p", "div", ".content", "dt", "span", ".comment", "a", "em"];

    proptest! {
        #[test]
        fn test_evaluation_is_pure(
            include in proptest::sample::select(SELECTORS.to_vec()),
            removed in proptest::sample::select(SELECTORS.to_vec()),
            keep in any::<bool>(),
            group in any::<bool>(),
        ) {
            let html = fixture("article.html");
            let root = parse_document(&html);
            let before = root.to_string();

            let mut block = json!({
                "include": include,
                "removeInside": [removed],
                "keepBasicMarkup": keep
            });
            if group {
                block["addNextUntil"] = json!(include);
            }
            let doc = document(json!([{"name": "value", "match": block}]));

            let first = evaluate_document(&HtmlAdapter, &root, &doc).unwrap();
            let second = evaluate_document(&HtmlAdapter, &root, &doc).unwrap();

            prop_assert_eq!(first, second);
            prop_assert_eq!(root.to_string(), before);
        }
    }
}
