#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use serde_json::json;

use pagerule::schema::{RuleDocument, validate};

static DOCUMENT: Lazy<RuleDocument> = Lazy::new(|| {
    validate(&json!({
        "info": {"name": "fuzz", "type": "article", "domain": "example.com", "path": "/.*"},
        "rules": [
            {"name": "content", "match": {"include": "div, article", "removeInside": ["script", "style"], "keepBasicMarkup": true}},
            {"name": "groups", "match": {"include": "h2", "addNextUntil": "h2"}},
            {"name": "links", "match": "a", "rules": [{"name": "href", "attribute": "href"}]},
            {"name": "numbers", "match": "p", "rewrite": {"find": "(\\d+)", "output": "<b>$1</b>"}}
        ]
    }))
    .expect("Fuzz document must validate")
});

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);

    // Evaluation must never panic, whatever the markup.
    let _ = DOCUMENT.extract_html(&html);
});
